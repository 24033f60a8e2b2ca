//! Infrastructure layer for beta-committee
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod executor;
pub mod logging;
pub mod proposers;
pub mod validation;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileAgentConfig, FileAutConfig, FileCommitteeConfig,
    FileConfig, FileGuardrailsConfig, FileRecorderConfig, FileSessionConfig, FileValidationConfig,
    ScenarioLoadError,
};
#[cfg(feature = "rest")]
pub use executor::RestExecutor;
pub use logging::JsonlTurnRecorder;
pub use proposers::CommandProposer;
pub use validation::{PatternFamily, PatternValidator};
