//! Invocation state tracking.
//!
//! Every tool invocation moves through a small state machine:
//! `Pending -> (NotFound | Running -> (Succeeded | Failed | TimedOut))`.
//! Nothing is retried automatically; a retry is a new invocation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// State of a single tool invocation.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationStatus {
    /// Queued, not yet checked for availability.
    Pending,

    /// Child process started, waiting for it to finish.
    Running,

    /// Exited with code 0.
    Succeeded,

    /// Exited non-zero, could not be started, or has no usable definition.
    Failed,

    /// The executable could not be located.
    NotFound,

    /// Killed after exceeding its timeout.
    TimedOut,
}

impl InvocationStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationStatus::Pending => "pending",
            InvocationStatus::Running => "running",
            InvocationStatus::Succeeded => "succeeded",
            InvocationStatus::Failed => "failed",
            InvocationStatus::NotFound => "not_found",
            InvocationStatus::TimedOut => "timed_out",
        }
    }

    /// Returns `true` once no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            InvocationStatus::Pending | InvocationStatus::Running
        )
    }

    /// Returns `true` for the single successful terminal state.
    pub fn is_success(&self) -> bool {
        matches!(self, InvocationStatus::Succeeded)
    }

    /// Checks whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: InvocationStatus) -> bool {
        match self {
            InvocationStatus::Pending => next != InvocationStatus::Pending,
            InvocationStatus::Running => matches!(
                next,
                InvocationStatus::Succeeded
                    | InvocationStatus::Failed
                    | InvocationStatus::TimedOut
            ),
            _ => false,
        }
    }
}

impl fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InvocationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvocationStatus::Pending),
            "running" => Ok(InvocationStatus::Running),
            "succeeded" => Ok(InvocationStatus::Succeeded),
            "failed" => Ok(InvocationStatus::Failed),
            "not_found" => Ok(InvocationStatus::NotFound),
            "timed_out" => Ok(InvocationStatus::TimedOut),
            _ => Err(format!("invalid invocation status: {}", s)),
        }
    }
}
