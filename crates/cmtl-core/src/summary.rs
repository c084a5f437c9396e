//! Per-tool outcomes and full-run summaries.

use crate::registry::ToolSource;
use crate::state::InvocationStatus;
use serde::{Deserialize, Serialize};

/// Outcome of one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolOutcome {
    pub tool: String,
    pub source: ToolSource,
    pub status: InvocationStatus,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Captured output; kept in memory for front-ends, never persisted.
    #[serde(skip)]
    pub output: String,
}

impl Default for ToolOutcome {
    fn default() -> Self {
        Self {
            tool: String::new(),
            source: ToolSource::External,
            status: InvocationStatus::Pending,
            success: false,
            exit_code: None,
            note: None,
            output: String::new(),
        }
    }
}

/// Result of one full pass over the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Target substituted into every command.
    pub target: String,

    /// ISO-8601 UTC start time.
    pub started_at: String,

    /// ISO-8601 UTC finish time.
    pub finished_at: String,

    /// Per-tool outcomes in execution order.
    pub outcomes: Vec<ToolOutcome>,
}

impl RunSummary {
    /// Number of tools that exited with code 0.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    /// Number of tools that did not succeed.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}
