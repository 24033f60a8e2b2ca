//! Progress notification port
//!
//! Defines the interface for reporting progress during a committee session.

use committee_domain::{
    Action, AgentId, ConsensusResult, GuardrailRewrite, Round, Scenario, SessionReport,
    ValidationReport,
};
use std::time::Duration;

/// Callback for progress updates during a session
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (progress bars, plain lines, ...).
pub trait ProgressNotifier: Send + Sync {
    /// Called when a committee round starts
    fn on_round_start(&self, round: Round, total_agents: usize);

    /// Called when one agent answers (or fails) within a round
    fn on_agent_complete(&self, round: Round, agent: &AgentId, success: bool);

    /// Called when a committee round completes
    fn on_round_complete(&self, round: Round);

    // ==================== Session Callbacks ====================

    fn on_session_start(&self, _session_id: &str, _scenario: &Scenario, _agents: usize) {}

    fn on_turn_start(&self, _turn: usize, _max_turns: usize) {}

    fn on_consensus(&self, _turn: usize, _result: &ConsensusResult) {}

    fn on_guardrail_rewrite(&self, _rewrite: &GuardrailRewrite) {}

    fn on_loop_detected(&self, _action: &Action, _reason: &str) {}

    fn on_validation_failed(&self, _action: &Action, _report: &ValidationReport) {}

    fn on_action_executed(&self, _turn: usize, _action: &Action, _succeeded: bool, _latency: Duration) {}

    fn on_session_end(&self, _report: &SessionReport) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_round_start(&self, _round: Round, _total_agents: usize) {}
    fn on_agent_complete(&self, _round: Round, _agent: &AgentId, _success: bool) {}
    fn on_round_complete(&self, _round: Round) {}
}
