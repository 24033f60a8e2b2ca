//! Loop detector
//!
//! Decides, before execution, whether a candidate action is a degenerate
//! repetition of the immediately preceding one. Checks run in a fixed order
//! and the first one that applies wins.

use crate::action::{Action, ActionType};
use crate::session::state::{ActionHistory, DEFAULT_HISTORY_WINDOW};
use serde::{Deserialize, Serialize};

/// Tunable loop thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopPolicy {
    /// Number of actions kept in session history
    pub history_window: usize,
    /// Trailing entries inspected when a fill repeats with the same value
    pub distinct_window: usize,
    /// Identical successful clicks in a row before the next one is a loop
    pub max_click_repeats: usize,
}

impl Default for LoopPolicy {
    fn default() -> Self {
        Self {
            history_window: DEFAULT_HISTORY_WINDOW,
            distinct_window: 3,
            max_click_repeats: 2,
        }
    }
}

/// Why a repeated action was let through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowReason {
    NoHistory,
    DifferentAction,
    RetryAfterFailure,
    DifferentValue,
    IntermediateActions,
    ClickRepeat,
    DifferentPayload,
}

impl AllowReason {
    pub fn describe(&self) -> &'static str {
        match self {
            AllowReason::NoHistory => "no previous action",
            AllowReason::DifferentAction => "different action",
            AllowReason::RetryAfterFailure => "retrying action after previous failure",
            AllowReason::DifferentValue => "same action with different value",
            AllowReason::IntermediateActions => "same action repeated, but other actions were taken",
            AllowReason::ClickRepeat => "same click repeated (might be adding multiple items)",
            AllowReason::DifferentPayload => "same action with different payload",
        }
    }

    /// Whether the candidate repeats the previous action's key
    pub fn is_repeat(&self) -> bool {
        !matches!(self, AllowReason::NoHistory | AllowReason::DifferentAction)
    }
}

/// Outcome of a loop check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopVerdict {
    Allow(AllowReason),
    Loop(String),
}

impl LoopVerdict {
    pub fn is_loop(&self) -> bool {
        matches!(self, LoopVerdict::Loop(_))
    }
}

/// Stateless loop checker over a borrowed history
#[derive(Debug, Clone, Default)]
pub struct LoopDetector {
    policy: LoopPolicy,
}

impl LoopDetector {
    pub fn new(policy: LoopPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &LoopPolicy {
        &self.policy
    }

    pub fn check(&self, history: &ActionHistory, candidate: &Action) -> LoopVerdict {
        let Some(last) = history.last() else {
            return LoopVerdict::Allow(AllowReason::NoHistory);
        };

        if !last.action.same_key(candidate) {
            return LoopVerdict::Allow(AllowReason::DifferentAction);
        }

        if !last.success {
            return LoopVerdict::Allow(AllowReason::RetryAfterFailure);
        }

        match candidate.action_type() {
            ActionType::Fill => {
                if last.action.fill_value() != candidate.fill_value() {
                    return LoopVerdict::Allow(AllowReason::DifferentValue);
                }
                let distinct: std::collections::BTreeSet<_> = history
                    .recent(self.policy.distinct_window)
                    .map(|e| e.action.key())
                    .collect();
                if distinct.len() >= 2 {
                    LoopVerdict::Allow(AllowReason::IntermediateActions)
                } else {
                    LoopVerdict::Loop(format!(
                        "Loop detected: Agents attempted to repeat action '{} -> {}' with same payload immediately.",
                        candidate.action_type(),
                        candidate.target()
                    ))
                }
            }
            ActionType::Click => {
                let run = history
                    .iter()
                    .rev()
                    .take_while(|e| e.action.same_key(candidate))
                    .count();
                if run >= self.policy.max_click_repeats {
                    LoopVerdict::Loop(format!(
                        "Loop detected: Agents clicked '{}' {} times in a row.",
                        candidate.target(),
                        run + 1
                    ))
                } else {
                    LoopVerdict::Allow(AllowReason::ClickRepeat)
                }
            }
            _ => {
                if last.action.same_payload(candidate) {
                    LoopVerdict::Loop(format!(
                        "Loop detected: Agents attempted to repeat action '{} -> {}' immediately.",
                        candidate.action_type(),
                        candidate.target()
                    ))
                } else {
                    LoopVerdict::Allow(AllowReason::DifferentPayload)
                }
            }
        }
    }
}
