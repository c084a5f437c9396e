//! Error types for the probe routines.

use thiserror::Error;

/// Errors that stop a probe before it produces findings.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Port list or range could not be parsed.
    #[error("invalid ports argument: {0}")]
    InvalidPorts(String),

    /// Sweep bounds are outside 0..=255 or reversed.
    #[error("invalid host range {start}..={end}")]
    InvalidRange { start: u16, end: u16 },

    /// Host name did not resolve to any address.
    #[error("cannot resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },

    /// TCP connection to the target failed.
    #[error("connection to {addr} failed: {reason}")]
    Connect { addr: String, reason: String },

    /// The system `ping` utility is not installed.
    #[error("ping executable not found")]
    PingUnavailable,

    /// HTTP client could not be constructed.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProbeError>;
