//! Append-only result ledger.
//!
//! The ledger is a single JSON array of [`ExecutionRecord`]s. Every append
//! rewrites the whole array through a temporary file that is renamed over the
//! target, so an interrupted write never leaves a truncated file behind. A
//! file that does not parse as an array is copied aside to a `.bak` file and
//! the ledger restarts from an empty sequence.

use crate::error::{LauncherError, Result};
use crate::summary::ToolOutcome;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Characters of captured output kept in a per-tool record.
pub const PREVIEW_CHARS: usize = 200;

/// Current time as an ISO-8601 UTC timestamp (`2024-01-01T00:00:00.000000Z`).
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// First `limit` characters of `text`.
pub fn preview(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

/// What produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// One captured tool invocation.
    #[default]
    Tool,

    /// One detached launch.
    Launch,

    /// Aggregate of a full run.
    RunAll,
}

/// Distinguishing note attached to unsuccessful records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordNote {
    /// The tool has no local launcher.
    NoLauncher,

    /// An internal probe executable is missing.
    ScriptNotFound,

    /// An external executable is missing.
    NotFound,

    /// The command definition is unusable.
    InvalidDefinition,

    /// The process was killed after its timeout.
    TimedOut,

    /// The OS refused to start the process.
    SpawnFailed,
}

impl RecordNote {
    /// Returns the string stored in the ledger.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordNote::NoLauncher => "no-launcher",
            RecordNote::ScriptNotFound => "script_not_found",
            RecordNote::NotFound => "not_found",
            RecordNote::InvalidDefinition => "invalid_definition",
            RecordNote::TimedOut => "timed_out",
            RecordNote::SpawnFailed => "spawn_failed",
        }
    }
}

/// One immutable ledger entry.
///
/// Every field except `tool` and `time` is optional on disk so that entries
/// written by older launchers still load; fields this version does not know
/// are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecutionRecord {
    #[serde(default)]
    pub kind: RecordKind,

    #[serde(default)]
    pub tool: String,

    #[serde(default)]
    pub time: String,

    #[serde(default)]
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_text"
    )]
    pub output_preview: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launched: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Vec<ToolOutcome>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExecutionRecord {
    /// Starts a record of `kind` for `tool`, stamped with the current time.
    pub fn new(kind: RecordKind, tool: impl Into<String>) -> Self {
        Self {
            kind,
            tool: tool.into(),
            time: utc_timestamp(),
            ..Self::default()
        }
    }

    /// Sets the success flag.
    pub fn with_success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }

    /// Sets the exit code.
    pub fn with_exit_code(mut self, exit_code: Option<i32>) -> Self {
        self.exit_code = exit_code;
        self
    }

    /// Sets the command line that was run.
    pub fn with_command(mut self, cmd: impl Into<String>) -> Self {
        self.cmd = Some(cmd.into());
        self
    }

    /// Sets the run target.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Stores the first [`PREVIEW_CHARS`] characters of `output`.
    pub fn with_output(mut self, output: &str) -> Self {
        self.output_preview = Some(preview(output, PREVIEW_CHARS));
        self
    }

    /// Attaches a note.
    pub fn with_note(mut self, note: RecordNote) -> Self {
        self.note = Some(note.as_str().to_string());
        self
    }

    /// Marks a detached launch.
    pub fn with_launched(mut self, launched: bool) -> Self {
        self.launched = Some(launched);
        self
    }

    /// Attaches per-tool outcomes of a full run.
    pub fn with_summary(mut self, summary: Vec<ToolOutcome>) -> Self {
        self.summary = Some(summary);
        self
    }
}

/// Accepts strings, lists of strings, or any JSON value as preview text.
fn lenient_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        Some(other) => Some(other.to_string()),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// File-backed, append-only sequence of execution records.
///
/// Appends are serialised by an internal mutex; share the ledger as
/// `Arc<ResultLedger>` and never lock around it.
#[derive(Debug)]
pub struct ResultLedger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ResultLedger {
    /// Opens the ledger at `path`; the file is created on first append.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every record in insertion order.
    ///
    /// A missing file yields an empty sequence. A file that is not a JSON
    /// array is copied aside and yields an empty sequence; unreadable elements
    /// of an array are skipped. Never returns an error.
    pub fn load_all(&self) -> Vec<ExecutionRecord> {
        match self.read_records() {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read ledger");
                Vec::new()
            }
        }
    }

    /// Appends `record` to the tail and rewrites the file atomically.
    ///
    /// # Errors
    ///
    /// Returns `LauncherError::Io` if the existing file cannot be read or the
    /// new file cannot be written. A corrupt file is not an error.
    pub fn append(&self, record: ExecutionRecord) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut records = self.read_records()?;
        records.push(record);
        self.write_atomic(&records)?;

        tracing::debug!(path = %self.path.display(), records = records.len(), "ledger appended");
        Ok(())
    }

    /// Creates the file as an empty array if it does not exist yet.
    pub fn initialize(&self) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !self.path.exists() {
            self.write_atomic(&[])?;
        }
        Ok(())
    }

    /// Parses the file; IO failures are errors, corruption is recovered here.
    fn read_records(&self) -> Result<Vec<ExecutionRecord>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LauncherError::Io(e)),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let elements = match serde_json::from_str::<Value>(&content) {
            Ok(Value::Array(elements)) => elements,
            Ok(other) => {
                self.reset(format!("expected a JSON array, found {}", json_kind(&other)));
                return Ok(Vec::new());
            }
            Err(e) => {
                self.reset(e.to_string());
                return Ok(Vec::new());
            }
        };

        let total = elements.len();
        let mut records = Vec::with_capacity(total);
        let mut rejected = Vec::new();
        for (index, element) in elements.into_iter().enumerate() {
            match serde_json::from_value::<ExecutionRecord>(element) {
                Ok(record) => records.push(record),
                Err(e) => rejected.push(format!("#{index}: {e}")),
            }
        }

        if !rejected.is_empty() {
            let backup = self.backup();
            tracing::warn!(
                path = %self.path.display(),
                rejected = rejected.len(),
                total,
                reasons = ?rejected,
                backup = ?backup,
                "skipped unreadable ledger records"
            );
        }

        Ok(records)
    }

    /// Backs up a file that is not a JSON array; the caller starts from empty.
    fn reset(&self, reason: String) {
        let corrupt = LauncherError::LedgerCorrupt {
            path: self.path.clone(),
            reason,
        };
        let backup = self.backup();
        tracing::warn!(
            error = %corrupt,
            backup = ?backup,
            "ledger reset to an empty sequence"
        );
    }

    /// Copies the current file next to itself with a timestamped `.bak` suffix.
    fn backup(&self) -> Option<PathBuf> {
        let file_name = self.path.file_name()?.to_string_lossy();
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.6fZ");
        let backup = self.path.with_file_name(format!("{file_name}.{stamp}.bak"));
        match std::fs::copy(&self.path, &backup) {
            Ok(_) => Some(backup),
            Err(e) => {
                tracing::warn!(path = %backup.display(), error = %e, "failed to back up ledger");
                None
            }
        }
    }

    fn write_atomic(&self, records: &[ExecutionRecord]) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let mut content = serde_json::to_vec_pretty(records)?;
        content.push(b'\n');

        let mut temp = tempfile::NamedTempFile::new_in(parent)?;
        temp.write_all(&content)?;
        temp.as_file_mut().sync_all()?;
        temp.persist(&self.path).map_err(|e| LauncherError::Io(e.error))?;
        Ok(())
    }
}
