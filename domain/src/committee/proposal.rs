//! Proposal types for committee decisions
//!
//! This module defines the per-round primitives: who proposed ([`AgentId`]),
//! in which [`Round`], and what ([`Proposal`]).

use crate::action::Action;
use serde::{Deserialize, Serialize};

/// Identity of one decision source in the committee
///
/// Agents are numbered from 1 in registration order; the `source` label is
/// the underlying model or command name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId {
    index: usize,
    source: String,
}

impl AgentId {
    pub fn new(index: usize, source: impl Into<String>) -> Self {
        Self {
            index,
            source: source.into(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Key used in confidence maps (e.g. `agent_2`)
    pub fn key(&self) -> String {
        format!("agent_{}", self.index)
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Agent {} ({})", self.index, self.source)
    }
}

/// Round of the committee protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Round {
    /// Every source proposes independently from the raw observation
    Independent,
    /// Sources see a summary of round 1 and refine
    Discussion,
    /// Confidence-weighted vote over round 2 proposals
    Consensus,
}

impl Round {
    pub fn number(&self) -> u8 {
        match self {
            Round::Independent => 1,
            Round::Discussion => 2,
            Round::Consensus => 3,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Round::Independent => "independent",
            Round::Discussion => "discussion",
            Round::Consensus => "consensus",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Round::Independent => "Round 1: Independent Proposals",
            Round::Discussion => "Round 2: Discussion & Refinement",
            Round::Consensus => "Round 3: Consensus Vote",
        }
    }
}

impl std::fmt::Display for Round {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One agent's candidate action for one round
///
/// # Example
///
/// ```
/// use committee_domain::action::Action;
/// use committee_domain::committee::{AgentId, Proposal, Round};
///
/// let proposal = Proposal::new(
///     AgentId::new(1, "model-a"),
///     Round::Independent,
///     Action::click("#add"),
///     1.4,
///     "looks right",
/// );
/// assert_eq!(proposal.confidence, 1.0); // clamped
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub agent: AgentId,
    pub round: Round,
    pub action: Action,
    /// Confidence in [0, 1]
    pub confidence: f64,
    pub reasoning: String,
}

impl Proposal {
    pub fn new(
        agent: AgentId,
        round: Round,
        action: Action,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            agent,
            round,
            action,
            confidence: clamp_confidence(confidence),
            reasoning: reasoning.into(),
        }
    }
}

pub(crate) fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_key_and_display() {
        let id = AgentId::new(3, "gpt-4o");
        assert_eq!(id.key(), "agent_3");
        assert_eq!(id.to_string(), "Agent 3 (gpt-4o)");
    }

    #[test]
    fn test_agent_ids_order_by_index() {
        let mut ids = vec![AgentId::new(10, "a"), AgentId::new(2, "z")];
        ids.sort();
        assert_eq!(ids[0].index(), 2);
    }

    #[test]
    fn test_confidence_clamped() {
        let p = Proposal::new(AgentId::new(1, "m"), Round::Discussion, Action::navigate("/"), -0.5, "");
        assert_eq!(p.confidence, 0.0);
        let p = Proposal::new(AgentId::new(1, "m"), Round::Discussion, Action::navigate("/"), f64::NAN, "");
        assert_eq!(p.confidence, 0.0);
    }

    #[test]
    fn test_round_numbers() {
        assert_eq!(Round::Independent.number(), 1);
        assert_eq!(Round::Discussion.number(), 2);
        assert_eq!(Round::Consensus.number(), 3);
        assert_eq!(Round::Discussion.to_string(), "Round 2: Discussion & Refinement");
    }
}
