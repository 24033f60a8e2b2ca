//! Session state
//!
//! [`SessionState`] is the only long-lived mutable entity of a session. It is
//! owned by the session orchestrator; guardrails and the loop detector only
//! ever borrow it immutably and hand back instructions ([`TurnUpdate`],
//! [`FlagUpdate`]) that the orchestrator commits.

use super::probes::classify_security_probe;
use crate::action::{Action, ActionType};
use crate::guardrail::flags::{FlagUpdate, GuardrailFlags};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Default number of actions kept in history
pub const DEFAULT_HISTORY_WINDOW: usize = 5;

/// One executed action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub turn: usize,
    pub action: Action,
    /// Whether the action took effect (no failure marker in the observation)
    pub success: bool,
}

/// Bounded history of the most recent actions, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl ActionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// The last `n` entries, oldest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().skip(self.entries.len().saturating_sub(n))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ActionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}

/// Everything the orchestrator commits after executing one turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnUpdate {
    pub turn: usize,
    pub action: Action,
    pub success: bool,
    pub flag_updates: Vec<FlagUpdate>,
    /// Location after execution, if known
    pub location: Option<String>,
    /// Classify fill values as security probes
    pub track_security_probes: bool,
}

/// Mutable per-session state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    turn: usize,
    current_url: String,
    history: ActionHistory,
    completed_criteria: BTreeSet<String>,
    flags: GuardrailFlags,
    failed_selectors: BTreeMap<String, usize>,
    security_probes: BTreeSet<String>,
}

impl SessionState {
    pub fn new(history_window: usize) -> Self {
        Self {
            turn: 0,
            current_url: String::new(),
            history: ActionHistory::new(history_window),
            completed_criteria: BTreeSet::new(),
            flags: GuardrailFlags::new(),
            failed_selectors: BTreeMap::new(),
            security_probes: BTreeSet::new(),
        }
    }

    // ==================== Accessors ====================

    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    pub fn history(&self) -> &ActionHistory {
        &self.history
    }

    pub fn completed_criteria(&self) -> &BTreeSet<String> {
        &self.completed_criteria
    }

    pub fn flags(&self) -> &GuardrailFlags {
        &self.flags
    }

    pub fn failed_selectors(&self) -> &BTreeMap<String, usize> {
        &self.failed_selectors
    }

    pub fn security_probes(&self) -> &BTreeSet<String> {
        &self.security_probes
    }

    // ==================== Mutation (orchestrator only) ====================

    pub fn begin_turn(&mut self, turn: usize) {
        self.turn = turn;
    }

    pub fn set_location(&mut self, url: impl Into<String>) {
        self.current_url = url.into();
    }

    pub fn mark_completed(&mut self, label: impl Into<String>) -> bool {
        self.completed_criteria.insert(label.into())
    }

    pub fn apply_flags(&mut self, updates: &[FlagUpdate]) {
        self.flags.apply(updates);
    }

    /// Commit the result of an executed action
    pub fn commit(&mut self, update: TurnUpdate) {
        if !update.success && update.action.action_type() == ActionType::Click {
            *self
                .failed_selectors
                .entry(update.action.target().to_string())
                .or_insert(0) += 1;
        }

        if update.track_security_probes
            && let Some(value) = update.action.fill_value()
        {
            self.security_probes
                .insert(classify_security_probe(update.action.target(), value));
        }

        self.flags.apply(&update.flag_updates);

        if let Some(location) = update.location {
            self.current_url = location;
        }

        self.history.push(HistoryEntry {
            turn: update.turn,
            action: update.action,
            success: update.success,
        });
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guardrail::flags::DISCOVERY_ADD_DONE;

    fn update(turn: usize, action: Action, success: bool) -> TurnUpdate {
        TurnUpdate {
            turn,
            action,
            success,
            flag_updates: vec![],
            location: None,
            track_security_probes: false,
        }
    }

    #[test]
    fn test_history_is_bounded() {
        let mut state = SessionState::new(5);
        for turn in 1..=7 {
            state.commit(update(turn, Action::navigate(format!("/p/{turn}")), true));
        }
        assert_eq!(state.history().len(), 5);
        assert_eq!(state.history().iter().next().unwrap().turn, 3);
        assert_eq!(state.history().last().unwrap().turn, 7);
    }

    #[test]
    fn test_recent_returns_tail() {
        let mut history = ActionHistory::new(5);
        for turn in 1..=4 {
            history.push(HistoryEntry {
                turn,
                action: Action::navigate("/"),
                success: true,
            });
        }
        let turns: Vec<_> = history.recent(3).map(|e| e.turn).collect();
        assert_eq!(turns, vec![2, 3, 4]);
        assert_eq!(history.recent(10).count(), 4);
    }

    #[test]
    fn test_failed_click_counts_selector() {
        let mut state = SessionState::default();
        state.commit(update(1, Action::click("#missing"), false));
        state.commit(update(2, Action::click("#missing"), false));
        state.commit(update(3, Action::fill("#q", "x"), false));
        assert_eq!(state.failed_selectors().get("#missing"), Some(&2));
        assert_eq!(state.failed_selectors().len(), 1);
    }

    #[test]
    fn test_commit_applies_flags_and_location() {
        let mut state = SessionState::default();
        state.commit(TurnUpdate {
            turn: 1,
            action: Action::click(".add-to-cart"),
            success: true,
            flag_updates: vec![FlagUpdate::raise(DISCOVERY_ADD_DONE)],
            location: Some("/search?q=x".into()),
            track_security_probes: false,
        });
        assert!(state.flags().is_set(DISCOVERY_ADD_DONE));
        assert_eq!(state.current_url(), "/search?q=x");
    }

    #[test]
    fn test_security_probes_tracked() {
        let mut state = SessionState::default();
        state.commit(TurnUpdate {
            track_security_probes: true,
            ..update(1, Action::fill("#searchInput", "<script>alert(1)</script>"), true)
        });
        assert!(state.security_probes().contains("XSS test in #searchInput"));
    }
}
