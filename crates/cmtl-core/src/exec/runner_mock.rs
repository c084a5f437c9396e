//! Mock command runner for testing.
//!
//! This module provides a mock implementation of the `CommandRunner` trait.
//! Responses are pre-programmed per executable locator and every invocation
//! is recorded, so launcher behaviour can be tested without real tools.

use crate::error::{LauncherError, Result};
use crate::exec::runner::{CommandOutput, CommandRunner};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted response of the mock runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    /// The process ran and produced this output.
    Output(CommandOutput),

    /// The executable could not be located.
    NotFound,

    /// The process exceeded its timeout.
    TimedOut,
}

/// Mock command runner.
///
/// # Examples
///
/// ```
/// use cmtl_core::exec::runner::CommandOutput;
/// use cmtl_core::exec::runner_mock::{MockCommandRunner, MockResponse};
///
/// let runner = MockCommandRunner::new();
/// runner.set_response(
///     "nmap",
///     MockResponse::Output(CommandOutput::with_stdout(0, "Nmap done: 1 IP address")),
/// );
/// assert!(runner.get_history().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockCommandRunner {
    /// Pre-programmed responses keyed by executable locator.
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// Argument vectors passed to `run`.
    history: Arc<Mutex<Vec<Vec<String>>>>,
    /// Argument vectors passed to `launch_detached`.
    launches: Arc<Mutex<Vec<Vec<String>>>>,
    /// Response for unknown executables; `NotFound` when unset.
    default_response: Arc<Mutex<Option<MockResponse>>>,
}

impl MockCommandRunner {
    /// Creates a mock that reports every executable as missing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock that succeeds with empty output for every command.
    pub fn with_success() -> Self {
        let runner = Self::new();
        runner.set_default_response(MockResponse::Output(CommandOutput::with_stdout(0, "")));
        runner
    }

    /// Sets the response for a specific executable locator.
    pub fn set_response(&self, program: &str, response: MockResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(program.to_string(), response);
    }

    /// Sets the response for executables without a specific entry.
    pub fn set_default_response(&self, response: MockResponse) {
        *self.default_response.lock().unwrap() = Some(response);
    }

    /// Returns the argument vectors passed to `run`, in call order.
    pub fn get_history(&self) -> Vec<Vec<String>> {
        self.history.lock().unwrap().clone()
    }

    /// Returns the argument vectors passed to `launch_detached`.
    pub fn get_launches(&self) -> Vec<Vec<String>> {
        self.launches.lock().unwrap().clone()
    }

    fn response_for(&self, program: &str) -> MockResponse {
        self.responses
            .lock()
            .unwrap()
            .get(program)
            .cloned()
            .or_else(|| self.default_response.lock().unwrap().clone())
            .unwrap_or(MockResponse::NotFound)
    }
}

#[async_trait]
impl CommandRunner for MockCommandRunner {
    async fn run(&self, argv: &[String], timeout: Duration) -> Result<CommandOutput> {
        self.history.lock().unwrap().push(argv.to_vec());

        let Some(program) = argv.first() else {
            return Err(LauncherError::InvalidCommandDefinition {
                tool: String::new(),
                reason: "empty executable locator".to_string(),
            });
        };

        match self.response_for(program) {
            MockResponse::Output(output) => Ok(output),
            MockResponse::NotFound => Err(LauncherError::ExecutableNotFound(program.clone())),
            MockResponse::TimedOut => Err(LauncherError::Timeout {
                command: argv.join(" "),
                secs: timeout.as_secs(),
            }),
        }
    }

    fn launch_detached(&self, argv: &[String]) -> Result<()> {
        self.launches.lock().unwrap().push(argv.to_vec());
        let program = argv.first().cloned().unwrap_or_default();
        match self.response_for(&program) {
            MockResponse::NotFound => Err(LauncherError::ExecutableNotFound(program)),
            _ => Ok(()),
        }
    }

    fn is_available(&self, argv: &[String]) -> bool {
        match argv.first() {
            Some(program) if !program.is_empty() => {
                self.response_for(program) != MockResponse::NotFound
            }
            _ => false,
        }
    }
}
