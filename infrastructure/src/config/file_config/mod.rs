//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod committee;
mod guardrails;
mod output;
mod session;

pub use committee::{FileAgentConfig, FileCommitteeConfig};
pub use guardrails::FileGuardrailsConfig;
pub use output::{FileAutConfig, FileRecorderConfig, FileValidationConfig};
pub use session::FileSessionConfig;

use committee_application::{CommitteeParams, SessionParams};
use committee_domain::{DomainError, LoopPolicy, Scenario};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("committee.proposer_timeout_secs cannot be 0")]
    InvalidTimeout,

    #[error("aut.request_timeout_secs cannot be 0")]
    InvalidRequestTimeout,

    #[error("agents[{0}].command cannot be empty")]
    EmptyAgentCommand(usize),

    #[error("session.max_turns cannot be 0")]
    ZeroMaxTurns,

    #[error("loop_detection.history_window must be at least {minimum}")]
    HistoryWindowTooSmall { minimum: usize },

    #[error("loop_detection.max_click_repeats must be between 1 and history_window ({history_window})")]
    ClickRepeatsOutOfRange { history_window: usize },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub committee: FileCommitteeConfig,
    /// Proposer processes, one per committee member
    pub agents: Vec<FileAgentConfig>,
    pub session: FileSessionConfig,
    pub loop_detection: LoopPolicy,
    pub guardrails: FileGuardrailsConfig,
    pub validation: FileValidationConfig,
    pub recorder: FileRecorderConfig,
    pub aut: FileAutConfig,
    /// Inline scenario, used when none is given on the command line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<Scenario>,
}

impl FileConfig {
    /// Validate the configuration, stopping at the first problem
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.committee.proposer_timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.aut.request_timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidRequestTimeout);
        }
        if let Some(index) = self.agents.iter().position(|a| a.command.trim().is_empty()) {
            return Err(ConfigValidationError::EmptyAgentCommand(index));
        }
        if self.session.max_turns == Some(0) {
            return Err(ConfigValidationError::ZeroMaxTurns);
        }

        // The fill-repeat check inspects `distinct_window` trailing entries
        let minimum = self.loop_detection.distinct_window.max(1);
        if self.loop_detection.history_window < minimum {
            return Err(ConfigValidationError::HistoryWindowTooSmall { minimum });
        }
        // The click run is counted over the kept history only
        let history_window = self.loop_detection.history_window;
        if !(1..=history_window).contains(&self.loop_detection.max_click_repeats) {
            return Err(ConfigValidationError::ClickRepeatsOutOfRange { history_window });
        }

        if self.guardrails.enabled {
            self.guardrails.flow.validate()?;
        }
        if let Some(scenario) = &self.scenario {
            scenario.validate()?;
        }
        Ok(())
    }

    pub fn committee_params(&self) -> CommitteeParams {
        self.committee.to_params()
    }

    pub fn session_params(&self) -> SessionParams {
        self.session.to_params(&self.loop_detection)
    }
}
