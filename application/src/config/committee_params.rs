//! Committee parameters: proposer fan-out control.

use committee_domain::ConfidencePolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parameters for [`CommitteeUseCase`](crate::use_cases::run_committee::CommitteeUseCase).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitteeParams {
    /// Deadline for a single proposer call.
    pub proposer_timeout: Duration,
    /// Confidence assigned per round and stance.
    pub confidence: ConfidencePolicy,
}

impl Default for CommitteeParams {
    fn default() -> Self {
        Self {
            proposer_timeout: Duration::from_secs(60),
            confidence: ConfidencePolicy::default(),
        }
    }
}

impl CommitteeParams {
    // ==================== Builder Methods ====================

    pub fn with_proposer_timeout(mut self, timeout: Duration) -> Self {
        self.proposer_timeout = timeout;
        self
    }

    pub fn with_confidence(mut self, confidence: ConfidencePolicy) -> Self {
        self.confidence = confidence;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = CommitteeParams::default();
        assert_eq!(params.proposer_timeout, Duration::from_secs(60));
        assert_eq!(params.confidence.initial, 0.8);
    }
}
