//! Executor port
//!
//! Defines the interface to the application under test.

use async_trait::async_trait;
use committee_domain::Action;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by an executor
///
/// An action that ran but reported a failure marker in its observation is
/// not an error; these are for actions that could not be performed at all.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Unsupported action: {0}")]
    Unsupported(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Current view of the application under test
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Current location, relative to the application root
    pub url: String,
    /// Textual representation of what is on screen
    pub page_state: String,
    /// Optional screenshot bytes
    pub image: Option<Vec<u8>>,
}

/// Result of executing one action
#[derive(Debug, Clone)]
pub struct Execution {
    pub observation: String,
    pub latency: Duration,
    /// Location after the action, when the executor knows it
    pub location: Option<String>,
}

impl Execution {
    pub fn new(observation: impl Into<String>, latency: Duration) -> Self {
        Self {
            observation: observation.into(),
            latency,
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Performs actions against the application under test
#[async_trait]
pub trait ExecutorPort: Send + Sync {
    /// Capture the current state
    async fn snapshot(&self) -> Result<Snapshot, ExecutionError>;

    /// Perform an action and return what happened
    async fn execute(&self, action: &Action) -> Result<Execution, ExecutionError>;
}
