//! Guardrail flags
//!
//! Named boolean conditions accumulated over a session. Flags only ever go
//! from unset to set; guardrail rules read them and the orchestrator raises
//! them from [`FlagUpdate`]s after a successful execution.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An add-action succeeded while on the discovery (search) view
pub const DISCOVERY_ADD_DONE: &str = "discovery_add_done";
/// The apply/add action succeeded after all prerequisites were satisfied
pub const FILTERED_ADD_DONE: &str = "filtered_add_done";
/// The final verification view was observed
pub const VERIFICATION_VISITED: &str = "verification_visited";

/// Flag name for a satisfied prerequisite (e.g. `prerequisite:#minPrice`)
pub fn prerequisite_flag(target: &str) -> String {
    format!("prerequisite:{}", target)
}

/// Instruction to raise a flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagUpdate(pub String);

impl FlagUpdate {
    pub fn raise(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Session-scoped flag map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuardrailFlags(BTreeMap<String, bool>);

impl GuardrailFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.0.get(name).copied().unwrap_or(false)
    }

    pub fn set(&mut self, name: impl Into<String>) {
        self.0.insert(name.into(), true);
    }

    pub fn apply(&mut self, updates: &[FlagUpdate]) {
        for update in updates {
            self.set(update.name());
        }
    }

    /// Names of raised flags
    pub fn raised(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter(|(_, v)| **v).map(|(k, _)| k.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_default_unset() {
        let flags = GuardrailFlags::new();
        assert!(!flags.is_set(DISCOVERY_ADD_DONE));
    }

    #[test]
    fn test_apply_updates() {
        let mut flags = GuardrailFlags::new();
        flags.apply(&[
            FlagUpdate::raise(DISCOVERY_ADD_DONE),
            FlagUpdate::raise(prerequisite_flag("#minPrice")),
        ]);
        assert!(flags.is_set(DISCOVERY_ADD_DONE));
        assert!(flags.is_set("prerequisite:#minPrice"));
        assert_eq!(flags.raised().count(), 2);
    }
}
