//! CMTL Probe - internal probe routines of the launcher.
//!
//! Each routine is a small async function; the `cmtl-probe` binary exposes
//! them as subcommands so the launcher runs them as ordinary child processes.
//!
//! - [`ports`]: TCP connect scan
//! - [`sweep`]: ping sweep over an IPv4 prefix
//! - [`banner`]: first response of a TCP service
//! - [`subdomain`]: HTTP probe of common subdomains

pub mod banner;
pub mod error;
pub mod ports;
pub mod subdomain;
pub mod sweep;

pub use error::{ProbeError, Result};
