//! Turn loop configuration (`[session]` and `[loop_detection]` sections)

use committee_application::SessionParams;
use committee_domain::LoopPolicy;
use committee_domain::session::DEFAULT_FAILURE_MARKERS;
use serde::{Deserialize, Serialize};

/// Raw session settings from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSessionConfig {
    /// Overrides the scenario's own turn budget
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_turns: Option<usize>,
    /// Observation substrings that mark an action as failed
    pub failure_markers: Vec<String>,
}

impl Default for FileSessionConfig {
    fn default() -> Self {
        Self {
            max_turns: None,
            failure_markers: DEFAULT_FAILURE_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl FileSessionConfig {
    pub fn to_params(&self, loop_policy: &LoopPolicy) -> SessionParams {
        let params = SessionParams::default()
            .with_loop_policy(loop_policy.clone())
            .with_failure_markers(self.failure_markers.clone());
        match self.max_turns {
            Some(max) => params.with_max_turns(max),
            None => params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_params() {
        let toml_str = r#"
max_turns = 7
failure_markers = ["BOOM"]
"#;
        let config: FileSessionConfig = toml::from_str(toml_str).unwrap();
        let policy = LoopPolicy {
            max_click_repeats: 4,
            ..Default::default()
        };
        let params = config.to_params(&policy);
        assert_eq!(params.max_turns, Some(7));
        assert_eq!(params.failure_markers, vec!["BOOM".to_string()]);
        assert_eq!(params.loop_policy.max_click_repeats, 4);
    }

    #[test]
    fn test_defaults_leave_budget_to_scenario() {
        let params = FileSessionConfig::default().to_params(&LoopPolicy::default());
        assert!(params.max_turns.is_none());
        assert!(params.failure_markers.iter().any(|m| m == "FILL_ERROR"));
    }
}
