//! CMTL Core - Execution and result-tracking engine for the CyberSec Multi
//! Tool Launcher.
//!
//! This crate resolves the tool registry from configuration, checks which
//! tools are invocable, runs them with bounded timeouts and captured output,
//! and keeps an append-only JSON ledger plus per-tool text logs.
//!
//! # Architecture
//!
//! - [`config`]: configuration resolution (defaults merged with user edits)
//! - [`registry`]: command specs, tool entries and the ordered registry
//! - [`availability`]: executable lookup
//! - [`exec`]: process runner trait, tokio implementation and mock
//! - [`ledger`]: execution records and the file-backed ledger
//! - [`tool_log`]: per-tool log files
//! - [`layout`]: output directory structure
//! - [`launcher`]: orchestration of single runs and full runs
//!
//! # Example
//!
//! ```rust,ignore
//! use cmtl_core::{Launcher, LauncherConfig, OutputLayout};
//! use std::path::Path;
//!
//! let config = LauncherConfig::resolve(Path::new("config.json"));
//! let launcher = Launcher::new(config, OutputLayout::new("output"))?;
//!
//! let outcome = launcher.run_tool("Nmap", "192.168.1.1", &[]).await;
//! println!("{}: {}", outcome.tool, outcome.status);
//! ```

pub mod availability;
pub mod config;
pub mod error;
pub mod exec;
pub mod launcher;
pub mod layout;
pub mod ledger;
pub mod registry;
pub mod state;
pub mod summary;
pub mod tool_log;

// Re-export core types for convenience
pub use config::LauncherConfig;
pub use error::{LauncherError, Result};
pub use exec::runner::{CommandOutput, CommandRunner};
pub use launcher::Launcher;
pub use layout::OutputLayout;
pub use ledger::{ExecutionRecord, RecordKind, RecordNote, ResultLedger};
pub use registry::{CommandSpec, ProbeKind, ToolEntry, ToolRegistry, ToolSource};
pub use state::InvocationStatus;
pub use summary::{RunSummary, ToolOutcome};
pub use tool_log::ToolLogWriter;
