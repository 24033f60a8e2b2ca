//! Action validation traits
//!
//! Pure domain trait for pre-execution validation. Content-based safety
//! scanning lives in the infrastructure layer; the default here only checks
//! the action's shape.

use crate::action::Action;
use serde::{Deserialize, Serialize};

/// Inputs a validator needs besides the action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationContext {
    /// Run safety pattern checks (off for security-testing scenarios)
    pub safety_checks: bool,
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self { safety_checks: true }
    }
}

/// Result of validating one action
///
/// `safety_reasons` is always a subset of `reasons`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub passed: bool,
    pub reasons: Vec<String>,
    pub safety_reasons: Vec<String>,
}

impl ValidationReport {
    pub fn ok() -> Self {
        Self {
            passed: true,
            reasons: Vec::new(),
            safety_reasons: Vec::new(),
        }
    }

    pub fn from_reasons(schema_reasons: Vec<String>, safety_reasons: Vec<String>) -> Self {
        let mut reasons = schema_reasons;
        reasons.extend(safety_reasons.iter().cloned());
        Self {
            passed: reasons.is_empty(),
            reasons,
            safety_reasons,
        }
    }

    pub fn safety_pass(&self) -> bool {
        self.safety_reasons.is_empty()
    }
}

/// Validator for consensus actions
pub trait ActionValidator: Send + Sync {
    fn validate(&self, action: &Action, ctx: &ValidationContext) -> ValidationReport;
}

/// Shape checks only
///
/// The action type is a closed enum, so an unknown type can never reach
/// here; only an empty target is reported.
pub fn schema_reasons(action: &Action) -> Vec<String> {
    if action.target().trim().is_empty() {
        vec!["missing_target".to_string()]
    } else {
        Vec::new()
    }
}

/// Validator that performs schema checks and nothing else
#[derive(Debug, Clone, Default)]
pub struct SchemaValidator;

impl ActionValidator for SchemaValidator {
    fn validate(&self, action: &Action, _ctx: &ValidationContext) -> ValidationReport {
        ValidationReport::from_reasons(schema_reasons(action), Vec::new())
    }
}
