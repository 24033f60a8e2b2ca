//! Proposer adapters
//!
//! Implementations of [`ProposerPort`](committee_application::ProposerPort).

mod command;

pub use command::CommandProposer;
