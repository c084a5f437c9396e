//! On-disk output layout.
//!
//! ```text
//! <output_dir>/
//! ├── results.json   # result ledger, `[]` when fresh
//! └── logs/          # one <safe-name>.log per tool
//! ```

use crate::error::{LauncherError, Result};
use crate::ledger::ResultLedger;
use std::path::{Path, PathBuf};

/// Name of the per-tool log directory inside the output directory.
pub const LOGS_DIR: &str = "logs";

/// Name of the ledger file inside the output directory.
pub const RESULTS_FILE: &str = "results.json";

/// Paths of the output directory structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub output_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub results_file: PathBuf,
}

impl OutputLayout {
    /// Derives the layout rooted at `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        Self {
            logs_dir: output_dir.join(LOGS_DIR),
            results_file: output_dir.join(RESULTS_FILE),
            output_dir,
        }
    }

    /// Creates both directories and an empty ledger if none exists.
    ///
    /// # Errors
    ///
    /// Returns `LauncherError::OutputLayout` if any part cannot be created.
    /// Callers treat this as fatal.
    #[tracing::instrument(skip_all, fields(output_dir = %self.output_dir.display()))]
    pub fn ensure(&self) -> Result<()> {
        create_dir(&self.output_dir)?;
        create_dir(&self.logs_dir)?;

        ResultLedger::open(&self.results_file)
            .initialize()
            .map_err(|e| LauncherError::OutputLayout {
                path: self.results_file.clone(),
                source: match e {
                    LauncherError::Io(source) => source,
                    other => std::io::Error::other(other.to_string()),
                },
            })?;

        tracing::debug!("output layout ready");
        Ok(())
    }
}

fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|source| LauncherError::OutputLayout {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_should_create_layout() {
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path().join("output"));

        layout.ensure().unwrap();

        assert!(layout.logs_dir.is_dir());
        assert_eq!(
            std::fs::read_to_string(&layout.results_file).unwrap().trim(),
            "[]"
        );
    }

    #[test]
    fn test_should_keep_existing_ledger() {
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path());
        std::fs::write(&layout.results_file, r#"[{"tool": "Nmap", "time": "t"}]"#).unwrap();

        layout.ensure().unwrap();

        assert_eq!(ResultLedger::open(&layout.results_file).load_all().len(), 1);
    }

    #[test]
    fn test_should_fail_when_output_dir_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("output");
        std::fs::write(&blocker, "file").unwrap();

        let result = OutputLayout::new(&blocker).ensure();
        assert!(matches!(result, Err(LauncherError::OutputLayout { .. })));
    }
}
