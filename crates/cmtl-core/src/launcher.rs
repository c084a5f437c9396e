//! Orchestration engine for registered tools.
//!
//! The `Launcher` owns the resolved configuration, the registry built from it,
//! the result ledger, the per-tool log writer and a [`CommandRunner`]. Every
//! invocation, successful or not, produces exactly one ledger record and one
//! tool log block; a full run additionally appends one aggregate record.

use crate::config::LauncherConfig;
use crate::error::{LauncherError, Result};
use crate::exec::runner::CommandRunner;
use crate::exec::runner_impl::TokioCommandRunner;
use crate::exec::{self, FailureKind};
use crate::layout::OutputLayout;
use crate::ledger::{ExecutionRecord, RecordKind, RecordNote, ResultLedger, utc_timestamp};
use crate::registry::{ToolEntry, ToolRegistry, ToolSource};
use crate::state::InvocationStatus;
use crate::summary::{RunSummary, ToolOutcome};
use crate::tool_log::ToolLogWriter;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Tool name of the aggregate record written after a full run.
pub const RUN_ALL_RECORD: &str = "run_all";

/// Execution and result-tracking engine.
///
/// Share it across tasks as `Arc<Launcher>`; all methods take `&self`.
///
/// # Examples
///
/// ```no_run
/// use cmtl_core::{Launcher, LauncherConfig, OutputLayout};
///
/// # async fn demo() -> cmtl_core::Result<()> {
/// let launcher = Launcher::new(LauncherConfig::default(), OutputLayout::new("output"))?;
/// let summary = launcher.run_all("192.168.1.1").await;
/// println!("{} of {} tools succeeded", summary.succeeded(), summary.outcomes.len());
/// # Ok(())
/// # }
/// ```
pub struct Launcher {
    config: LauncherConfig,
    registry: ToolRegistry,
    layout: OutputLayout,
    ledger: Arc<ResultLedger>,
    logs: ToolLogWriter,
    runner: Box<dyn CommandRunner>,
}

impl fmt::Debug for Launcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Launcher")
            .field("config", &self.config)
            .field("layout", &self.layout)
            .field("tools", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl Launcher {
    /// Creates a launcher that spawns real processes.
    ///
    /// # Errors
    ///
    /// Returns `LauncherError::OutputLayout` if the output directory
    /// structure cannot be created.
    pub fn new(config: LauncherConfig, layout: OutputLayout) -> Result<Self> {
        Self::with_runner(config, layout, Box::new(TokioCommandRunner::new()))
    }

    /// Creates a launcher using the given runner.
    ///
    /// # Errors
    ///
    /// Returns `LauncherError::OutputLayout` if the output directory
    /// structure cannot be created.
    pub fn with_runner(
        config: LauncherConfig,
        layout: OutputLayout,
        runner: Box<dyn CommandRunner>,
    ) -> Result<Self> {
        layout.ensure()?;

        let registry = ToolRegistry::from_config(&config);
        let ledger = Arc::new(ResultLedger::open(&layout.results_file));
        let logs = ToolLogWriter::new(&layout.logs_dir);

        tracing::debug!(tools = registry.len(), "launcher ready");

        Ok(Self {
            config,
            registry,
            layout,
            ledger,
            logs,
            runner,
        })
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Shared handle to the result ledger.
    pub fn ledger(&self) -> Arc<ResultLedger> {
        Arc::clone(&self.ledger)
    }

    /// Whether `entry` can be invoked right now.
    pub fn is_available(&self, entry: &ToolEntry) -> bool {
        match entry.base_argv() {
            Ok(argv) => self.runner.is_available(&argv),
            Err(_) => false,
        }
    }

    /// Runs every registered tool once against `target`.
    ///
    /// Internal probes run first, then external tools, strictly one after
    /// another with `run_delay_ms` between them. Failures never stop the run.
    /// Produces one record per tool plus one `run_all` record.
    #[tracing::instrument(skip(self))]
    pub async fn run_all(&self, target: &str) -> RunSummary {
        let started_at = utc_timestamp();
        let delay = Duration::from_millis(self.config.run_delay_ms);
        let mut outcomes = Vec::with_capacity(self.registry.len());

        for (index, entry) in self.registry.entries().iter().enumerate() {
            if index > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            outcomes.push(self.invoke(entry, target, &[]).await);
        }

        let summary = RunSummary {
            target: target.to_string(),
            started_at,
            finished_at: utc_timestamp(),
            outcomes,
        };

        self.record(
            ExecutionRecord::new(RecordKind::RunAll, RUN_ALL_RECORD)
                .with_success(summary.failed() == 0)
                .with_target(target)
                .with_summary(summary.outcomes.clone()),
        );

        tracing::info!(
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            "run finished"
        );
        summary
    }

    /// Runs a single tool, appending `extra_args` to its command.
    ///
    /// An unknown name yields a failed outcome noted `invalid_definition`;
    /// it is still recorded.
    #[tracing::instrument(skip(self))]
    pub async fn run_tool(&self, name: &str, target: &str, extra_args: &[String]) -> ToolOutcome {
        match self.registry.get(name) {
            Some(entry) => self.invoke(entry, target, extra_args).await,
            None => {
                let error = LauncherError::UnknownTool(name.to_string());
                tracing::warn!(error = %error, "cannot run tool");
                self.finish(
                    name,
                    ToolSource::External,
                    target,
                    Finished {
                        status: InvocationStatus::Failed,
                        note: Some(RecordNote::InvalidDefinition),
                        output: error.to_string(),
                        ..Finished::default()
                    },
                )
            }
        }
    }

    /// Starts a tool detached, without capturing its output.
    ///
    /// `{target}` placeholders are filled with the configured default target.
    /// Writes one `launch` record whether or not the process started.
    ///
    /// # Errors
    ///
    /// - `LauncherError::UnknownTool` if `name` is not registered (nothing is recorded)
    /// - `LauncherError::NoLauncher` / `InvalidCommandDefinition` for unusable specs
    /// - `LauncherError::ExecutableNotFound` if the executable cannot be located
    /// - `LauncherError::Spawn` if the OS refused to start it
    #[tracing::instrument(skip(self))]
    pub fn launch_tool(&self, name: &str) -> Result<()> {
        let entry = self
            .registry
            .get(name)
            .ok_or_else(|| LauncherError::UnknownTool(name.to_string()))?;
        let record = ExecutionRecord::new(RecordKind::Launch, name);

        let argv = match entry.command_for(&self.config.default_target) {
            Ok(argv) => argv,
            Err(e) => {
                let note = match e {
                    LauncherError::NoLauncher(_) => RecordNote::NoLauncher,
                    _ => RecordNote::InvalidDefinition,
                };
                self.record(record.with_launched(false).with_note(note));
                return Err(e);
            }
        };
        let command = argv.join(" ");
        let record = record.with_command(&command);

        if !self.runner.is_available(&argv) {
            self.record(
                record
                    .with_launched(false)
                    .with_note(not_found_note(entry.source)),
            );
            return Err(LauncherError::ExecutableNotFound(argv[0].clone()));
        }

        let launched = exec::launch_detached(self.runner.as_ref(), &argv);
        self.record(record.with_success(launched).with_launched(launched));

        if launched {
            tracing::info!(command = %command, "tool launched");
            Ok(())
        } else {
            Err(LauncherError::Spawn {
                command,
                source: std::io::Error::other("detached process did not start"),
            })
        }
    }

    async fn invoke(&self, entry: &ToolEntry, target: &str, extra_args: &[String]) -> ToolOutcome {
        let name = entry.name.as_str();

        let mut argv = match entry.command_for(target) {
            Ok(argv) => argv,
            Err(e) => {
                let (note, output) = match &e {
                    LauncherError::NoLauncher(_) => {
                        (RecordNote::NoLauncher, "No local launcher defined.".to_string())
                    }
                    _ => (RecordNote::InvalidDefinition, e.to_string()),
                };
                tracing::debug!(tool = name, error = %e, "tool skipped");
                return self.finish(
                    name,
                    entry.source,
                    target,
                    Finished {
                        status: InvocationStatus::Failed,
                        note: Some(note),
                        output,
                        ..Finished::default()
                    },
                );
            }
        };
        argv.extend(extra_args.iter().cloned());
        let command = argv.join(" ");

        if !self.runner.is_available(&argv) {
            tracing::info!(tool = name, locator = %argv[0], "tool not available");
            return self.finish(
                name,
                entry.source,
                target,
                Finished {
                    status: InvocationStatus::NotFound,
                    note: Some(not_found_note(entry.source)),
                    output: format!("Command not found: {}", argv[0]),
                    command: Some(command),
                    exit_code: None,
                },
            );
        }

        let timeout = Duration::from_secs(self.config.timeout_for(entry.source));
        tracing::info!(tool = name, command = %command, "running tool");
        let outcome = exec::execute(self.runner.as_ref(), &argv, timeout).await;

        let note = outcome.failure.and_then(|failure| match failure {
            FailureKind::NonZeroExit => None,
            FailureKind::NotFound => Some(not_found_note(entry.source)),
            FailureKind::TimedOut => Some(RecordNote::TimedOut),
            FailureKind::InvalidDefinition => Some(RecordNote::InvalidDefinition),
            FailureKind::SpawnFailed => Some(RecordNote::SpawnFailed),
        });

        self.finish(
            name,
            entry.source,
            target,
            Finished {
                status: outcome.status(),
                exit_code: outcome.exit_code,
                command: Some(outcome.command),
                note,
                output: outcome.output,
            },
        )
    }

    /// Writes the log block and ledger record of one invocation.
    fn finish(
        &self,
        name: &str,
        source: ToolSource,
        target: &str,
        finished: Finished,
    ) -> ToolOutcome {
        let success = finished.status.is_success();

        let mut record = ExecutionRecord::new(RecordKind::Tool, name)
            .with_success(success)
            .with_exit_code(finished.exit_code)
            .with_target(target)
            .with_output(&finished.output);
        if let Some(command) = &finished.command {
            record = record.with_command(command);
        }
        if let Some(note) = finished.note {
            record = record.with_note(note);
        }

        let log_text = match &finished.command {
            Some(command) => format!("$ {command}\n{}", finished.output),
            None => finished.output.clone(),
        };
        self.logs.log(name, &log_text);
        self.record(record);

        tracing::debug!(tool = name, status = %finished.status, "invocation finished");

        ToolOutcome {
            tool: name.to_string(),
            source,
            status: finished.status,
            success,
            exit_code: finished.exit_code,
            note: finished.note.map(|note| note.as_str().to_string()),
            output: finished.output,
        }
    }

    fn record(&self, record: ExecutionRecord) {
        if let Err(e) = self.ledger.append(record) {
            tracing::error!(path = %self.ledger.path().display(), error = %e, "failed to append ledger record");
        }
    }
}

/// Terminal facts of one invocation before they are recorded.
#[derive(Debug)]
struct Finished {
    status: InvocationStatus,
    exit_code: Option<i32>,
    command: Option<String>,
    note: Option<RecordNote>,
    output: String,
}

impl Default for Finished {
    fn default() -> Self {
        Self {
            status: InvocationStatus::Failed,
            exit_code: None,
            command: None,
            note: None,
            output: String::new(),
        }
    }
}

fn not_found_note(source: ToolSource) -> RecordNote {
    match source {
        ToolSource::Internal => RecordNote::ScriptNotFound,
        ToolSource::External => RecordNote::NotFound,
    }
}
