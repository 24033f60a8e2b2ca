//! Committee configuration from TOML (`[committee]` and `[[agents]]` sections)
//!
//! Example configuration:
//!
//! ```toml
//! [committee]
//! proposer_timeout_secs = 45
//!
//! [committee.confidence]
//! initial = 0.8
//! confirmed = 0.9
//! revised = 0.85
//!
//! [[agents]]
//! name = "gpt"
//! command = "python3"
//! args = ["proposers/openai.py"]
//! ```

use committee_application::CommitteeParams;
use committee_domain::ConfidencePolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Committee fan-out settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCommitteeConfig {
    /// Deadline for one proposer call, in seconds
    pub proposer_timeout_secs: u64,
    pub confidence: ConfidencePolicy,
}

impl Default for FileCommitteeConfig {
    fn default() -> Self {
        Self {
            proposer_timeout_secs: 60,
            confidence: ConfidencePolicy::default(),
        }
    }
}

impl FileCommitteeConfig {
    pub fn to_params(&self) -> CommitteeParams {
        CommitteeParams::default()
            .with_proposer_timeout(Duration::from_secs(self.proposer_timeout_secs))
            .with_confidence(self.confidence)
    }
}

/// One external proposer process
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentConfig {
    /// Source label shown in logs and records (e.g. a model name)
    pub name: String,
    /// Executable to spawn for every proposal
    pub command: String,
    pub args: Vec<String>,
    /// Extra environment for the child process
    pub env: BTreeMap<String, String>,
}

impl FileAgentConfig {
    /// The configured name, or the command when no name was given
    pub fn label(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.command
        } else {
            &self.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_committee_defaults() {
        let config = FileCommitteeConfig::default();
        let params = config.to_params();
        assert_eq!(params.proposer_timeout, Duration::from_secs(60));
        assert_eq!(params.confidence, ConfidencePolicy::default());
    }

    #[test]
    fn test_partial_confidence_keeps_defaults() {
        let toml_str = r#"
proposer_timeout_secs = 5

[confidence]
initial = 0.5
"#;
        let config: FileCommitteeConfig = toml::from_str(toml_str).unwrap();
        let params = config.to_params();
        assert_eq!(params.proposer_timeout, Duration::from_secs(5));
        assert_eq!(params.confidence.initial, 0.5);
        assert_eq!(params.confidence.confirmed, 0.9);
    }

    #[test]
    fn test_agent_label_falls_back_to_command() {
        let agent = FileAgentConfig {
            command: "./propose.sh".to_string(),
            ..Default::default()
        };
        assert_eq!(agent.label(), "./propose.sh");

        let named = FileAgentConfig {
            name: "claude".to_string(),
            ..agent
        };
        assert_eq!(named.label(), "claude");
    }
}
