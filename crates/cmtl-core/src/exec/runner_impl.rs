//! Process runner implementation.
//!
//! This module provides a concrete implementation of the `CommandRunner` trait
//! using `tokio::process::Command`, with the wall-clock bound enforced by
//! `tokio::time::timeout`.

use crate::error::{LauncherError, Result};
use crate::exec::runner::{CommandOutput, CommandRunner};
use async_trait::async_trait;
use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// Runner that spawns real child processes.
#[derive(Debug, Default)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    /// Creates a new process runner.
    pub fn new() -> Self {
        Self
    }
}

fn split_argv(argv: &[String]) -> Result<(&String, &[String])> {
    match argv.split_first() {
        Some((program, args)) if !program.trim().is_empty() => Ok((program, args)),
        _ => Err(LauncherError::InvalidCommandDefinition {
            tool: argv.join(" "),
            reason: "empty executable locator".to_string(),
        }),
    }
}

fn spawn_error(program: &str, command_line: String, error: io::Error) -> LauncherError {
    if error.kind() == io::ErrorKind::NotFound {
        LauncherError::ExecutableNotFound(program.to_string())
    } else {
        LauncherError::Spawn {
            command: command_line,
            source: error,
        }
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, argv: &[String], timeout: Duration) -> Result<CommandOutput> {
        let (program, args) = split_argv(argv)?;
        let command_line = argv.join(" ");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(program, command_line.clone(), e))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let finished = tokio::time::timeout(timeout, async {
            tokio::try_join!(child.wait(), read_pipe(stdout), read_pipe(stderr))
        })
        .await;

        match finished {
            Ok(Ok((status, stdout, stderr))) => Ok(CommandOutput {
                exit_code: status.code(),
                stdout,
                stderr,
            }),
            Ok(Err(e)) => Err(LauncherError::Io(e)),
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(command = %command_line, error = %e, "failed to kill timed out child");
                }
                Err(LauncherError::Timeout {
                    command: command_line,
                    secs: timeout.as_secs(),
                })
            }
        }
    }

    fn launch_detached(&self, argv: &[String]) -> Result<()> {
        let (program, args) = split_argv(argv)?;

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // Own process group so a Ctrl-C in the launcher does not reach the tool.
        #[cfg(unix)]
        command.process_group(0);

        command
            .spawn()
            .map(drop)
            .map_err(|e| spawn_error(program, argv.join(" "), e))
    }
}
