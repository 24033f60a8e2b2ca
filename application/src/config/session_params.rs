//! Session parameters: turn loop control.
//!
//! Guardrail rules and the validator are injected as objects; what remains
//! here are plain values the turn loop reads.

use committee_domain::LoopPolicy;
use committee_domain::session::DEFAULT_FAILURE_MARKERS;
use serde::{Deserialize, Serialize};

/// Parameters for [`RunSessionUseCase`](crate::use_cases::run_session::RunSessionUseCase).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionParams {
    /// Loop thresholds, including the history window size.
    pub loop_policy: LoopPolicy,
    /// Observation substrings that mark an executed action as failed.
    pub failure_markers: Vec<String>,
    /// Overrides the scenario's turn budget when set.
    pub max_turns: Option<usize>,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            loop_policy: LoopPolicy::default(),
            failure_markers: DEFAULT_FAILURE_MARKERS.iter().map(|m| m.to_string()).collect(),
            max_turns: None,
        }
    }
}

impl SessionParams {
    pub fn with_loop_policy(mut self, policy: LoopPolicy) -> Self {
        self.loop_policy = policy;
        self
    }

    pub fn with_failure_markers(mut self, markers: Vec<String>) -> Self {
        self.failure_markers = markers;
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = Some(max_turns);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_markers() {
        let params = SessionParams::default();
        assert!(params.failure_markers.iter().any(|m| m == "CLICK_ERROR"));
        assert!(params.failure_markers.iter().any(|m| m == "HTTP_ERROR"));
        assert_eq!(params.loop_policy.history_window, 5);
        assert!(params.max_turns.is_none());
    }
}
