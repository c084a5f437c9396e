//! Command runner trait and captured output.
//!
//! This module defines the `CommandRunner` trait that the launcher uses to
//! start tool processes, allowing real process execution in production and a
//! scripted mock in tests.

use crate::availability;
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Marker line separating standard output from standard error in combined output.
pub const STDERR_MARKER: &str = "ERR:\n";

/// Captured output of a finished child process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Exit code, or `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,

    /// Standard output from the command.
    pub stdout: String,

    /// Standard error output from the command.
    pub stderr: String,
}

impl CommandOutput {
    /// Creates an output with the given exit code and stdout only.
    pub fn with_stdout(exit_code: i32, stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Checks if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Standard output followed by standard error.
    ///
    /// Each stream appears only if non-empty; stderr is introduced by
    /// [`STDERR_MARKER`] on its own line.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(STDERR_MARKER);
            text.push_str(&self.stderr);
        }
        text
    }
}

/// Process runner trait.
///
/// Implementations start the command vector `argv` (executable locator
/// first) with standard input disconnected.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `argv` to completion, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// - `LauncherError::ExecutableNotFound` if the executable cannot be located
    /// - `LauncherError::Timeout` if the process outlives `timeout`; the child is killed
    /// - `LauncherError::InvalidCommandDefinition` if `argv` is empty
    /// - `LauncherError::Spawn` or `LauncherError::Io` for other OS failures
    ///
    /// A non-zero exit code is not an error; check [`CommandOutput::success`].
    async fn run(&self, argv: &[String], timeout: Duration) -> Result<CommandOutput>;

    /// Starts `argv` without capturing output and without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the process could not be started.
    fn launch_detached(&self, argv: &[String]) -> Result<()>;

    /// Checks whether the executable locator of `argv` can be invoked.
    fn is_available(&self, argv: &[String]) -> bool {
        availability::is_available(Some(argv))
    }
}
