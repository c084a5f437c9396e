//! Process execution for launched tools.
//!
//! [`runner`] defines the `CommandRunner` seam; [`runner_impl`] spawns real
//! processes through tokio and [`runner_mock`] scripts responses for tests.
//! [`execute`] turns the runner's `Result` into a classified
//! [`ExecutionOutcome`] that the launcher records verbatim.

pub mod runner;
pub mod runner_impl;
pub mod runner_mock;

use crate::error::LauncherError;
use crate::state::InvocationStatus;
use runner::CommandRunner;
use std::time::Duration;

/// Why an invocation did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The process ran and exited non-zero (or was killed by a signal).
    NonZeroExit,

    /// The executable could not be located.
    NotFound,

    /// The process exceeded its timeout and was killed.
    TimedOut,

    /// The command vector was unusable.
    InvalidDefinition,

    /// The OS refused to start the process or its pipes failed.
    SpawnFailed,
}

/// Classified result of one captured execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Command line that was run.
    pub command: String,

    /// Combined stdout/stderr, or a diagnostic when nothing was captured.
    pub output: String,

    /// Exit code, when the process exited normally.
    pub exit_code: Option<i32>,

    /// `None` on success.
    pub failure: Option<FailureKind>,
}

impl ExecutionOutcome {
    /// Returns `true` if the process exited with code 0.
    pub fn success(&self) -> bool {
        self.failure.is_none()
    }

    /// Terminal invocation state for this outcome.
    pub fn status(&self) -> InvocationStatus {
        match self.failure {
            None => InvocationStatus::Succeeded,
            Some(FailureKind::NotFound) => InvocationStatus::NotFound,
            Some(FailureKind::TimedOut) => InvocationStatus::TimedOut,
            Some(_) => InvocationStatus::Failed,
        }
    }
}

/// Runs `argv` and classifies the result; never returns an error.
pub async fn execute(
    runner: &dyn CommandRunner,
    argv: &[String],
    timeout: Duration,
) -> ExecutionOutcome {
    let command = argv.join(" ");
    match runner.run(argv, timeout).await {
        Ok(output) => ExecutionOutcome {
            command,
            output: output.combined(),
            exit_code: output.exit_code,
            failure: (!output.success()).then_some(FailureKind::NonZeroExit),
        },
        Err(error) => {
            let (failure, output) = match &error {
                LauncherError::ExecutableNotFound(program) => {
                    (FailureKind::NotFound, format!("Command not found: {program}"))
                }
                LauncherError::Timeout { secs, .. } => (
                    FailureKind::TimedOut,
                    format!("Command timed out after {secs}s."),
                ),
                LauncherError::InvalidCommandDefinition { .. } => {
                    (FailureKind::InvalidDefinition, error.to_string())
                }
                _ => (FailureKind::SpawnFailed, error.to_string()),
            };
            tracing::debug!(command = %command, error = %error, "execution failed");
            ExecutionOutcome {
                command,
                output,
                exit_code: None,
                failure: Some(failure),
            }
        }
    }
}

/// Starts `argv` detached; returns whether the launch succeeded.
pub fn launch_detached(runner: &dyn CommandRunner, argv: &[String]) -> bool {
    match runner.launch_detached(argv) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(command = %argv.join(" "), error = %e, "detached launch failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runner::CommandOutput;
    use runner_impl::TokioCommandRunner;
    use runner_mock::{MockCommandRunner, MockResponse};
    use std::time::Instant;

    fn argv(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_combined_output_marks_stderr() {
        let output = CommandOutput {
            exit_code: Some(1),
            stdout: "out".to_string(),
            stderr: "err".to_string(),
        };
        assert_eq!(output.combined(), "out\nERR:\nerr");

        let only_err = CommandOutput {
            exit_code: Some(1),
            stdout: String::new(),
            stderr: "err".to_string(),
        };
        assert_eq!(only_err.combined(), "ERR:\nerr");

        let only_out = CommandOutput::with_stdout(0, "out\n");
        assert_eq!(only_out.combined(), "out\n");
    }

    #[tokio::test]
    async fn test_execute_classifies_mock_responses() {
        let runner = MockCommandRunner::new();
        runner.set_response("ok", MockResponse::Output(CommandOutput::with_stdout(0, "fine")));
        runner.set_response("bad", MockResponse::Output(CommandOutput::with_stdout(2, "")));
        runner.set_response("slow", MockResponse::TimedOut);

        let timeout = Duration::from_secs(1);

        let ok = execute(&runner, &argv(&["ok", "-x"]), timeout).await;
        assert!(ok.success());
        assert_eq!(ok.status(), InvocationStatus::Succeeded);
        assert_eq!(ok.command, "ok -x");
        assert_eq!(ok.output, "fine");

        let bad = execute(&runner, &argv(&["bad"]), timeout).await;
        assert_eq!(bad.failure, Some(FailureKind::NonZeroExit));
        assert_eq!(bad.exit_code, Some(2));
        assert_eq!(bad.status(), InvocationStatus::Failed);

        let slow = execute(&runner, &argv(&["slow"]), timeout).await;
        assert_eq!(slow.status(), InvocationStatus::TimedOut);

        let missing = execute(&runner, &argv(&["ghost"]), timeout).await;
        assert_eq!(missing.status(), InvocationStatus::NotFound);
        assert_eq!(missing.output, "Command not found: ghost");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_times_out_quickly() {
        let runner = TokioCommandRunner::new();
        let started = Instant::now();

        let outcome = execute(&runner, &argv(&["sleep", "5"]), Duration::from_secs(1)).await;

        assert_eq!(outcome.failure, Some(FailureKind::TimedOut));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn test_launch_detached_reports_failure() {
        let runner = MockCommandRunner::new();
        assert!(!launch_detached(&runner, &argv(&["ghost"])));

        runner.set_default_response(MockResponse::Output(CommandOutput::default()));
        assert!(launch_detached(&runner, &argv(&["wireshark"])));
    }
}
