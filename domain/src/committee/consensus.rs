//! Committee consensus types
//!
//! Round 3 of the protocol is pure: group round-2 proposals by
//! [`ActionKey`], sum member confidences per group, and pick the group with
//! the strictly highest score. Ties resolve to the group whose first proposal
//! appeared earliest, so the outcome depends only on proposal order.

use super::proposal::{AgentId, Proposal};
use crate::action::{Action, ActionKey};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Scores closer than this are treated as equal (float summation order)
const SCORE_EPSILON: f64 = 1e-9;

/// Proposals that share one `(type, target)` key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteGroup {
    pub key: ActionKey,
    /// Action held by the first proposal of the group
    pub action: Action,
    /// Sum of member confidences
    pub score: f64,
    pub voters: Vec<AgentId>,
}

/// Aggregated round-3 vote
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteTally {
    /// Groups in order of first occurrence
    pub groups: Vec<VoteGroup>,
    winner: usize,
    total_proposals: usize,
}

impl VoteTally {
    /// Tally proposals; `None` when there is nothing to vote on
    ///
    /// # Example
    ///
    /// ```
    /// use committee_domain::action::Action;
    /// use committee_domain::committee::{AgentId, Proposal, Round, VoteTally};
    ///
    /// let proposals: Vec<Proposal> = [
    ///     Action::click("#add"),
    ///     Action::click("#add"),
    ///     Action::navigate("/cart"),
    ///     Action::click("#add"),
    /// ]
    /// .into_iter()
    /// .enumerate()
    /// .map(|(i, action)| Proposal::new(AgentId::new(i + 1, "m"), Round::Discussion, action, 0.8, ""))
    /// .collect();
    ///
    /// let tally = VoteTally::from_proposals(&proposals).unwrap();
    /// assert_eq!(tally.winner().key.to_string(), "click::#add");
    /// assert!((tally.consensus_strength() - 0.6).abs() < 1e-9);
    /// ```
    pub fn from_proposals(proposals: &[Proposal]) -> Option<Self> {
        let mut groups: Vec<VoteGroup> = Vec::new();

        for proposal in proposals {
            let key = proposal.action.key();
            match groups.iter_mut().find(|g| g.key == key) {
                Some(group) => {
                    group.score += proposal.confidence;
                    group.voters.push(proposal.agent.clone());
                }
                None => groups.push(VoteGroup {
                    key,
                    action: proposal.action.clone(),
                    score: proposal.confidence,
                    voters: vec![proposal.agent.clone()],
                }),
            }
        }

        if groups.is_empty() {
            return None;
        }

        let mut winner = 0;
        for (index, group) in groups.iter().enumerate().skip(1) {
            if group.score > groups[winner].score + SCORE_EPSILON {
                winner = index;
            }
        }

        Some(Self {
            groups,
            winner,
            total_proposals: proposals.len(),
        })
    }

    pub fn winner(&self) -> &VoteGroup {
        &self.groups[self.winner]
    }

    pub fn total_proposals(&self) -> usize {
        self.total_proposals
    }

    /// Winning score divided by the number of proposals voted on
    pub fn consensus_strength(&self) -> f64 {
        if self.total_proposals == 0 {
            0.0
        } else {
            (self.winner().score / self.total_proposals as f64).clamp(0.0, 1.0)
        }
    }

    /// Whether another group scored equal to the winner
    pub fn is_tied(&self) -> bool {
        let best = self.winner().score;
        self.groups
            .iter()
            .enumerate()
            .any(|(i, g)| i != self.winner && (g.score - best).abs() <= SCORE_EPSILON)
    }
}

/// Per-agent confidence, serialized as `{"agent_1": 0.9, ...}`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfidenceMap(BTreeMap<AgentId, f64>);

impl ConfidenceMap {
    pub fn from_proposals(proposals: &[Proposal]) -> Self {
        Self(
            proposals
                .iter()
                .map(|p| (p.agent.clone(), p.confidence))
                .collect(),
        )
    }

    pub fn get(&self, agent: &AgentId) -> Option<f64> {
        self.0.get(agent).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AgentId, &f64)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ConfidenceMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (agent, confidence) in &self.0 {
            map.serialize_entry(&agent.key(), confidence)?;
        }
        map.end()
    }
}

/// Outcome of one committee decision
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusResult {
    /// The winning action
    pub action: Action,
    /// Every proposal from rounds 1 and 2, in round order
    pub proposals: Vec<Proposal>,
    /// Round-2 confidence per agent
    pub confidence: ConfidenceMap,
    /// Winning score ÷ number of round-2 proposals, in [0, 1]
    pub consensus_strength: f64,
    pub tally: VoteTally,
}

impl ConsensusResult {
    /// Run round 3 over the round-2 proposals
    ///
    /// Returns `None` when round 2 produced no proposals.
    pub fn from_rounds(independent: Vec<Proposal>, discussion: Vec<Proposal>) -> Option<Self> {
        let tally = VoteTally::from_proposals(&discussion)?;
        let confidence = ConfidenceMap::from_proposals(&discussion);
        let consensus_strength = tally.consensus_strength();
        let action = tally.winner().action.clone();

        let mut proposals = independent;
        proposals.extend(discussion);

        Some(Self {
            action,
            proposals,
            confidence,
            consensus_strength,
            tally,
        })
    }

    /// Legacy flat score map: per-agent confidence plus `consensus_strength`
    pub fn confidence_scores(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut scores: serde_json::Map<String, serde_json::Value> = self
            .confidence
            .iter()
            .map(|(agent, c)| (agent.key(), serde_json::Value::from(*c)))
            .collect();
        scores.insert(
            "consensus_strength".to_string(),
            serde_json::Value::from(self.consensus_strength),
        );
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::committee::proposal::Round;

    fn proposals(entries: &[(Action, f64)]) -> Vec<Proposal> {
        entries
            .iter()
            .enumerate()
            .map(|(i, (action, c))| {
                Proposal::new(AgentId::new(i + 1, "model"), Round::Discussion, action.clone(), *c, "")
            })
            .collect()
    }

    #[test]
    fn test_four_agent_scenario() {
        let props = proposals(&[
            (Action::click("#add"), 0.8),
            (Action::click("#add"), 0.8),
            (Action::navigate("/cart"), 0.8),
            (Action::click("#add"), 0.8),
        ]);

        let tally = VoteTally::from_proposals(&props).unwrap();
        assert_eq!(tally.winner().key.to_string(), "click::#add");
        assert!((tally.winner().score - 2.4).abs() < 1e-9);
        assert!((tally.groups[1].score - 0.8).abs() < 1e-9);
        assert!((tally.consensus_strength() - 0.6).abs() < 1e-9);
        assert!(!tally.is_tied());
    }

    #[test]
    fn test_tie_breaks_to_first_registered_group() {
        let props = proposals(&[
            (Action::navigate("/cart"), 0.9),
            (Action::click("#add"), 0.9),
            (Action::click("#add"), 0.85),
            (Action::navigate("/cart"), 0.85),
        ]);

        let tally = VoteTally::from_proposals(&props).unwrap();
        assert!(tally.is_tied());
        assert_eq!(tally.winner().key.to_string(), "navigate::/cart");
    }

    #[test]
    fn test_tally_is_deterministic() {
        let props = proposals(&[
            (Action::scroll("down", Some(500)), 0.85),
            (Action::click("#x"), 0.9),
            (Action::scroll("down", None), 0.9),
        ]);

        let first = VoteTally::from_proposals(&props).unwrap();
        for _ in 0..10 {
            let again = VoteTally::from_proposals(&props).unwrap();
            assert_eq!(again.winner().key, first.winner().key);
        }
        assert_eq!(first.winner().key.to_string(), "scroll::down");
        // The winning action is the first group member's, payload included
        assert_eq!(first.winner().action, Action::scroll("down", Some(500)));
    }

    #[test]
    fn test_empty_tally() {
        assert!(VoteTally::from_proposals(&[]).is_none());
        assert!(ConsensusResult::from_rounds(vec![], vec![]).is_none());
    }

    #[test]
    fn test_consensus_result_collects_all_rounds() {
        let round1 = proposals(&[(Action::click("#a"), 0.8), (Action::click("#b"), 0.8)]);
        let round2 = proposals(&[(Action::click("#b"), 0.85), (Action::click("#b"), 0.9)]);

        let result = ConsensusResult::from_rounds(round1, round2).unwrap();
        assert_eq!(result.action, Action::click("#b"));
        assert_eq!(result.proposals.len(), 4);
        assert_eq!(result.confidence.len(), 2);
        assert_eq!(result.confidence.get(&AgentId::new(2, "model")), Some(0.9));
        assert!((result.consensus_strength - 0.875).abs() < 1e-9);

        let scores = result.confidence_scores();
        assert_eq!(scores["agent_1"], 0.85);
        assert!(scores.contains_key("consensus_strength"));
    }

    #[test]
    fn test_confidence_map_serializes_with_string_keys() {
        let props = proposals(&[(Action::click("#a"), 0.9)]);
        let map = ConfidenceMap::from_proposals(&props);
        let value = serde_json::to_value(&map).unwrap();
        assert_eq!(value["agent_1"], 0.9);
    }
}
