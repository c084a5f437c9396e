//! Per-tool append-only text logs.
//!
//! Each tool gets `<logs_dir>/<safe-name>.log`. Every invocation appends one
//! block:
//!
//! ```text
//! --- 2024-01-01T00:00:00.000000Z ---
//! <captured output>
//!
//! ```
//!
//! Logs are a diagnostic aid only. [`ToolLogWriter::log`] swallows failures
//! after a warning; [`ToolLogWriter::write`] reports them to callers that care.

use crate::error::{LauncherError, Result};
use crate::ledger::utc_timestamp;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Filesystem-safe identifier: lowercase, spaces and separators become `_`.
pub fn safe_name(tool: &str) -> String {
    tool.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect()
}

/// Writer for the per-tool log directory.
#[derive(Debug, Clone)]
pub struct ToolLogWriter {
    logs_dir: PathBuf,
}

impl ToolLogWriter {
    /// Creates a writer rooted at `logs_dir`.
    pub fn new(logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            logs_dir: logs_dir.into(),
        }
    }

    /// Directory holding the log files.
    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    /// Log file of `tool`.
    pub fn log_path(&self, tool: &str) -> PathBuf {
        self.logs_dir.join(format!("{}.log", safe_name(tool)))
    }

    /// Appends a timestamped block for `tool`.
    ///
    /// # Errors
    ///
    /// Returns `LauncherError::LogWriteFailure` if the file cannot be opened
    /// or written.
    pub fn write(&self, tool: &str, text: &str) -> Result<()> {
        let path = self.log_path(tool);
        let failure = |source| LauncherError::LogWriteFailure {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(&self.logs_dir).map_err(failure)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(failure)?;

        let block = format!("--- {} ---\n{}\n\n", utc_timestamp(), text);
        file.write_all(block.as_bytes()).map_err(failure)
    }

    /// Like [`write`](Self::write) but never fails; errors become warnings.
    pub fn log(&self, tool: &str, text: &str) {
        if let Err(e) = self.write(tool, text) {
            tracing::warn!(tool, error = %e, "tool log not written");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_should_derive_safe_names() {
        assert_eq!(safe_name("Angry IP Scanner"), "angry_ip_scanner");
        assert_eq!(safe_name("OWASP ZAP"), "owasp_zap");
        assert_eq!(safe_name("a/b\\c"), "a_b_c");
    }

    #[test]
    fn test_should_append_timestamped_blocks() {
        let dir = TempDir::new().unwrap();
        let writer = ToolLogWriter::new(dir.path().join("logs"));

        writer.write("Burp Suite", "first run").unwrap();
        writer.write("Burp Suite", "second run").unwrap();

        let path = writer.log_path("Burp Suite");
        assert!(path.ends_with("burp_suite.log"));

        let content = std::fs::read_to_string(path).unwrap();
        let blocks: Vec<&str> = content.split("--- ").filter(|b| !b.is_empty()).collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains(" ---\nfirst run\n\n"));
        assert!(blocks[1].contains(" ---\nsecond run\n\n"));
        assert!(content.ends_with("second run\n\n"));
    }

    #[test]
    fn test_should_swallow_write_failures() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("logs");
        std::fs::write(&blocker, "not a directory").unwrap();

        let writer = ToolLogWriter::new(&blocker);
        assert!(matches!(
            writer.write("Nmap", "text"),
            Err(LauncherError::LogWriteFailure { .. })
        ));
        writer.log("Nmap", "text");
    }
}
