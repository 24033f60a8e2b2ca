//! Session termination and summary

use crate::action::Action;
use crate::session::state::HistoryEntry;
use serde::{Deserialize, Serialize};

/// Final status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// A `report` action ended the session
    Completed,
    Failed,
    /// Turn budget used up without an explicit completion signal
    Exhausted,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
            SessionStatus::Exhausted => "exhausted",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SessionStatus::Completed)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The single condition that ended a session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    Reported { conclusion: String },
    /// `history` is the window the detector saw, oldest first
    LoopDetected {
        action: Action,
        reason: String,
        history: Vec<HistoryEntry>,
    },
    ValidationFailed { action: Action, reasons: Vec<String> },
    ExecutionFailed { error: String },
    ProposerPoolExhausted,
    CommitteeFailed { error: String },
    TurnBudgetExhausted { max_turns: usize },
    Cancelled,
}

impl Termination {
    pub fn status(&self) -> SessionStatus {
        match self {
            Termination::Reported { .. } => SessionStatus::Completed,
            Termination::TurnBudgetExhausted { .. } => SessionStatus::Exhausted,
            Termination::Cancelled => SessionStatus::Cancelled,
            Termination::LoopDetected { .. }
            | Termination::ValidationFailed { .. }
            | Termination::ExecutionFailed { .. }
            | Termination::ProposerPoolExhausted
            | Termination::CommitteeFailed { .. } => SessionStatus::Failed,
        }
    }
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Reported { conclusion } => write!(f, "reported: {}", conclusion),
            Termination::LoopDetected { action, reason, .. } => {
                write!(f, "loop detected on {}: {}", action, reason)
            }
            Termination::ValidationFailed { action, reasons } => {
                write!(f, "validation failed for {}: {}", action, reasons.join(", "))
            }
            Termination::ExecutionFailed { error } => write!(f, "execution failed: {}", error),
            Termination::ProposerPoolExhausted => write!(f, "all proposers failed"),
            Termination::CommitteeFailed { error } => write!(f, "committee failed: {}", error),
            Termination::TurnBudgetExhausted { max_turns } => {
                write!(f, "turn budget of {} exhausted", max_turns)
            }
            Termination::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Durable summary of one session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub session_id: String,
    pub scenario: String,
    pub status: SessionStatus,
    pub termination: Termination,
    /// Turns that reached the executor
    pub turns_executed: usize,
    /// Turn records handed to the recorder
    pub turns_recorded: usize,
    pub completed_criteria: Vec<String>,
    pub started_at_ms: u64,
    pub finished_at_ms: u64,
}

impl SessionReport {
    pub fn duration_ms(&self) -> u64 {
        self.finished_at_ms.saturating_sub(self.started_at_ms)
    }
}
