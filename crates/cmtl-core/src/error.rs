//! Error types for CMTL operations.
//!
//! Every fallible boundary in the engine returns [`LauncherError`]. Most
//! variants are recoverable: the launcher turns them into failed ledger
//! records instead of aborting a run. Only [`LauncherError::OutputLayout`]
//! is treated as fatal by the front-ends.

use std::path::PathBuf;
use thiserror::Error;

/// Error variants raised by the execution and result-tracking engine.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LauncherError {
    // Config errors
    /// Configuration file exists but cannot be parsed into a registry.
    #[error("corrupted config file {path}: {reason}")]
    ConfigCorrupt {
        /// Path of the offending config file.
        path: PathBuf,
        /// Parser diagnostic.
        reason: String,
    },

    // Execution errors
    /// The first token of a command cannot be located or spawned.
    #[error("executable not found: {0}")]
    ExecutableNotFound(String),

    /// The child process exceeded its wall-clock budget and was killed.
    #[error("command timed out after {secs}s: {command}")]
    Timeout {
        /// Command line that was running.
        command: String,
        /// Budget that was exceeded, in seconds.
        secs: u64,
    },

    /// A tool definition cannot be turned into an argument vector.
    #[error("invalid command definition for {tool}: {reason}")]
    InvalidCommandDefinition {
        /// Tool name as it appears in the registry.
        tool: String,
        /// Why the definition was rejected.
        reason: String,
    },

    /// The requested tool is not part of the registry.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// The tool has no local launcher (cloud-only product).
    #[error("no local launcher defined for {0}")]
    NoLauncher(String),

    /// Spawning failed for a reason other than a missing executable.
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        /// Command line that failed to start.
        command: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    // Persistence errors
    /// Ledger file held something other than a JSON array of records.
    #[error("corrupted ledger {path}: {reason}")]
    LedgerCorrupt {
        /// Path of the ledger file.
        path: PathBuf,
        /// Parser diagnostic.
        reason: String,
    },

    /// A per-tool log could not be written.
    #[error("failed to write tool log {path}: {source}")]
    LogWriteFailure {
        /// Path of the log file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The output directory structure could not be created.
    #[error("cannot create output directory {path}: {source}")]
    OutputLayout {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    // IO and serialization
    /// Standard IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context from anyhow.
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for CMTL operations.
pub type Result<T> = std::result::Result<T, LauncherError>;
