//! Configuration file loading for beta-committee
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `COMMITTEE_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./committee.toml` or `./.committee.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/beta-committee/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileAgentConfig, FileAutConfig, FileCommitteeConfig, FileConfig,
    FileGuardrailsConfig, FileRecorderConfig, FileSessionConfig, FileValidationConfig,
};
pub use loader::{ConfigLoader, ScenarioLoadError};
