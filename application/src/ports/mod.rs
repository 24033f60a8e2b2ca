//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod executor;
pub mod progress;
pub mod proposer;
pub mod recorder;
