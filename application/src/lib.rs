//! Application layer for beta-committee
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{CommitteeParams, SessionParams};
pub use ports::{
    executor::{Execution, ExecutionError, ExecutorPort, Snapshot},
    progress::{NoProgress, ProgressNotifier},
    proposer::{ProposerError, ProposerPort},
    recorder::{NoRecorder, SessionStart, TurnRecord, TurnRecorder},
};
pub use use_cases::run_committee::{CommitteeError, CommitteeUseCase};
pub use use_cases::run_session::{RunSessionUseCase, SessionError};
