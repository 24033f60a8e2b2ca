//! Port for turn recording.
//!
//! Defines the [`TurnRecorder`] trait for persisting one record per executed
//! (or rejected) turn, plus session start and end markers.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port captures the machine-readable
//! turn history used for later analysis.

use chrono::{DateTime, Utc};
use committee_domain::{
    Action, ConsensusResult, GuardrailRewrite, HistoryEntry, Proposal, SessionReport,
};
use serde::Serialize;
use serde_json::{Map, Value};

/// Written once when a session starts
#[derive(Debug, Clone, Serialize)]
pub struct SessionStart {
    pub session_id: String,
    pub scenario: String,
    /// Scenario name reduced to a path-safe form
    pub scenario_slug: String,
    pub agents: Vec<String>,
    pub max_turns: usize,
    pub started_at: DateTime<Utc>,
}

/// One turn, append-only
#[derive(Debug, Clone, Serialize)]
pub struct TurnRecord {
    pub turn: usize,
    /// The action after guardrails (what was, or would have been, executed)
    pub action: Action,
    /// The committee's action before guardrails
    pub consensus_action: Action,
    pub guardrail_rewrites: Vec<GuardrailRewrite>,
    pub proposals: Vec<Proposal>,
    /// Per-agent confidence plus `consensus_strength`
    pub confidence_scores: Map<String, Value>,
    /// The turn reached the executor and completed without error
    pub success: bool,
    /// Whether the executed action took effect (no failure marker); `None`
    /// when the action was never executed
    pub action_succeeded: Option<bool>,
    pub latency_secs: f64,
    pub safety_pass: bool,
    pub validators: Vec<String>,
    pub conclusion: String,
    pub page_state: String,
    /// History window behind a loop rejection, empty otherwise
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryEntry>,
    pub recorded_at: DateTime<Utc>,
}

impl TurnRecord {
    /// A record for `action` decided by `consensus`, not yet executed
    pub fn new(
        turn: usize,
        action: Action,
        consensus: &ConsensusResult,
        rewrites: Vec<GuardrailRewrite>,
    ) -> Self {
        Self {
            turn,
            action,
            consensus_action: consensus.action.clone(),
            guardrail_rewrites: rewrites,
            proposals: consensus.proposals.clone(),
            confidence_scores: consensus.confidence_scores(),
            success: false,
            action_succeeded: None,
            latency_secs: 0.0,
            safety_pass: true,
            validators: Vec::new(),
            conclusion: String::new(),
            page_state: String::new(),
            history: Vec::new(),
            recorded_at: Utc::now(),
        }
    }

    /// Mark as rejected before execution
    pub fn rejected(mut self, validators: Vec<String>, page_state: &str) -> Self {
        self.success = false;
        self.validators = validators;
        self.page_state = page_state.to_string();
        self
    }

    pub fn with_history(mut self, history: Vec<HistoryEntry>) -> Self {
        self.history = history;
        self
    }
}

/// Port for persisting turn records.
///
/// Methods are synchronous and non-fallible so that a storage problem never
/// changes how a session runs; implementations log their own failures.
pub trait TurnRecorder: Send + Sync {
    fn start_session(&self, _start: &SessionStart) {}

    /// Append one turn record.
    fn log_turn(&self, record: &TurnRecord);

    fn end_session(&self, _report: &SessionReport) {}
}

/// No-op implementation for tests and when recording is disabled.
pub struct NoRecorder;

impl TurnRecorder for NoRecorder {
    fn log_turn(&self, _record: &TurnRecord) {}
}
