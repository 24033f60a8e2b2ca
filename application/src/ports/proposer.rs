//! Proposer port
//!
//! Defines the interface for a single decision source in the committee.

use async_trait::async_trait;
use committee_domain::{Action, ActionParseError};
use std::time::Duration;
use thiserror::Error;

/// Errors a single proposer call can produce
///
/// None of these are fatal to a round: the committee excludes the agent and
/// continues with whoever answered.
#[derive(Error, Debug)]
pub enum ProposerError {
    #[error("Timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("Malformed action: {0}")]
    Parse(#[from] ActionParseError),

    #[error("Proposer unavailable: {0}")]
    Unavailable(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// A decision source: observation in, action out
///
/// Implementations live in the infrastructure layer (subprocess, HTTP model
/// endpoint, ...). Calls may run concurrently with other proposers but never
/// concurrently with themselves within one round.
#[async_trait]
pub trait ProposerPort: Send + Sync {
    /// Label used in agent ids and logs (model or command name)
    fn name(&self) -> &str;

    /// Propose the next action for the given observation
    async fn propose(&self, observation: &str, image: Option<&[u8]>) -> Result<Action, ProposerError>;
}
