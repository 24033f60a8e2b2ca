//! Confidence assignment for committee rounds

use super::proposal::clamp_confidence;
use crate::action::Action;
use serde::{Deserialize, Serialize};

/// How an agent's round-2 proposal relates to its round-1 proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    /// Round-1 proposal, no prior to compare against
    Independent,
    /// Same `(type, target)` as round 1, or no round-1 proposal to diverge from
    Confirmed,
    /// Changed `(type, target)` after seeing the other proposals
    Revised,
}

impl Stance {
    /// Compare a refined action to the agent's own original by key only
    pub fn between(original: Option<&Action>, refined: &Action) -> Self {
        match original {
            Some(original) if !original.same_key(refined) => Stance::Revised,
            _ => Stance::Confirmed,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Stance::Independent => "independent analysis",
            Stance::Confirmed => "refined after discussion (confirmed original)",
            Stance::Revised => "refined after discussion (changed mind)",
        }
    }
}

/// Confidence scores assigned per stance
///
/// The defaults are empirically tuned: reaffirming after discussion scores
/// highest, changing one's mind slightly lower, a lone first guess lowest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidencePolicy {
    pub initial: f64,
    pub confirmed: f64,
    pub revised: f64,
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self {
            initial: 0.8,
            confirmed: 0.9,
            revised: 0.85,
        }
    }
}

impl ConfidencePolicy {
    pub fn confidence_for(&self, stance: Stance) -> f64 {
        clamp_confidence(match stance {
            Stance::Independent => self.initial,
            Stance::Confirmed => self.confirmed,
            Stance::Revised => self.revised,
        })
    }
}
