//! Executor adapters
//!
//! Implementations of [`ExecutorPort`](committee_application::ExecutorPort).

#[cfg(feature = "rest")]
mod rest;

#[cfg(feature = "rest")]
pub use rest::RestExecutor;
