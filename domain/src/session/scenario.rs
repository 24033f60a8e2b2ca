//! Test scenarios and success criteria

use super::state::ActionHistory;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// How many recent history entries a `performed` criterion inspects
const PERFORMED_LOOKBACK: usize = 3;

/// Default turn budget
pub const DEFAULT_MAX_TURNS: usize = 20;

/// A condition the session is asked to achieve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CriterionKind {
    /// The current location contains `path`
    VisitedView { path: String },
    /// A recent successful action's target contains `marker`
    Performed { marker: String },
    /// Tracked only through the observation; never inferred
    Manual,
}

/// A labeled success criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessCriterion {
    pub label: String,
    #[serde(flatten)]
    pub kind: CriterionKind,
}

impl SuccessCriterion {
    pub fn visited_view(label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: CriterionKind::VisitedView { path: path.into() },
        }
    }

    pub fn performed(label: impl Into<String>, marker: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: CriterionKind::Performed {
                marker: marker.into(),
            },
        }
    }

    pub fn manual(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: CriterionKind::Manual,
        }
    }

    /// Whether the criterion holds for the given location and history
    pub fn is_met(&self, current_url: &str, history: &ActionHistory) -> bool {
        match &self.kind {
            CriterionKind::VisitedView { path } => !path.is_empty() && current_url.contains(path.as_str()),
            CriterionKind::Performed { marker } => {
                let marker = marker.to_lowercase();
                !marker.is_empty()
                    && history
                        .recent(PERFORMED_LOOKBACK)
                        .any(|e| e.success && e.action.target().to_lowercase().contains(&marker))
            }
            CriterionKind::Manual => false,
        }
    }
}

/// A test scenario driven by one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Free-form background shown to proposers
    #[serde(default)]
    pub context: String,
    pub objective: String,
    #[serde(default)]
    pub success_criteria: Vec<SuccessCriterion>,
    /// Where to navigate before the first turn
    #[serde(default)]
    pub initial_url: Option<String>,
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// Marks a security-testing scenario (disables safety blocking)
    #[serde(default)]
    pub security_testing: bool,
}

fn default_max_turns() -> usize {
    DEFAULT_MAX_TURNS
}

impl Scenario {
    pub fn new(name: impl Into<String>, objective: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            context: String::new(),
            objective: objective.into(),
            success_criteria: Vec::new(),
            initial_url: None,
            max_turns: DEFAULT_MAX_TURNS,
            security_testing: false,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_criterion(mut self, criterion: SuccessCriterion) -> Self {
        self.success_criteria.push(criterion);
        self
    }

    pub fn with_initial_url(mut self, url: impl Into<String>) -> Self {
        self.initial_url = Some(url.into());
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_security_testing(mut self, enabled: bool) -> Self {
        self.security_testing = enabled;
        self
    }

    /// Security scenarios are flagged explicitly or by name/description
    pub fn is_security_test(&self) -> bool {
        self.security_testing
            || self.name.to_lowercase().contains("security")
            || self.description.to_lowercase().contains("security")
    }

    /// File-system friendly form of the scenario name
    pub fn slug(&self) -> String {
        let slug: String = self
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        let slug = slug.trim_matches('_').to_string();
        if slug.is_empty() { "scenario".to_string() } else { slug }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidScenario("name must not be empty".into()));
        }
        if self.objective.trim().is_empty() {
            return Err(DomainError::InvalidScenario("objective must not be empty".into()));
        }
        if self.max_turns == 0 {
            return Err(DomainError::InvalidScenario("max_turns must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::session::state::HistoryEntry;

    fn history(entries: &[(Action, bool)]) -> ActionHistory {
        let mut history = ActionHistory::new(5);
        for (i, (action, success)) in entries.iter().enumerate() {
            history.push(HistoryEntry {
                turn: i + 1,
                action: action.clone(),
                success: *success,
            });
        }
        history
    }

    #[test]
    fn test_visited_view() {
        let c = SuccessCriterion::visited_view("View cart", "/cart");
        assert!(c.is_met("/cart?x=1", &ActionHistory::default()));
        assert!(!c.is_met("/products", &ActionHistory::default()));
    }

    #[test]
    fn test_performed_looks_at_recent_successes() {
        let c = SuccessCriterion::performed("Add to cart", "add-to-cart");
        let h = history(&[(Action::click("#p1 .Add-To-Cart"), true)]);
        assert!(c.is_met("/", &h));

        let failed = history(&[(Action::click(".add-to-cart"), false)]);
        assert!(!c.is_met("/", &failed));

        let stale = history(&[
            (Action::click(".add-to-cart"), true),
            (Action::navigate("/a"), true),
            (Action::navigate("/b"), true),
            (Action::navigate("/c"), true),
        ]);
        assert!(!c.is_met("/", &stale));
    }

    #[test]
    fn test_validate() {
        assert!(Scenario::new("Checkout", "Buy something").validate().is_ok());
        assert!(Scenario::new("", "x").validate().is_err());
        assert!(Scenario::new("x", "y").with_max_turns(0).validate().is_err());
    }

    #[test]
    fn test_security_detection_and_slug() {
        let s = Scenario::new("Security: Price Filters", "probe");
        assert!(s.is_security_test());
        assert_eq!(s.slug(), "security__price_filters");
        assert!(!Scenario::new("Browse", "x").is_security_test());
    }

    #[test]
    fn test_criterion_serde_shape() {
        let c: SuccessCriterion =
            serde_json::from_str(r#"{"label":"Cart","kind":"visited_view","path":"/cart"}"#).unwrap();
        assert_eq!(c, SuccessCriterion::visited_view("Cart", "/cart"));
    }
}
