//! Committee decision domain
//!
//! Several independent decision sources propose the next UI action and a
//! three-round protocol reconciles them into one consensus action.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Round 1: Independent    all sources, raw observation        │
//! │      conf = 0.8                                              │
//! │                          ↓                                   │
//! │  Round 2: Discussion     observation + (agent, type, target) │
//! │      conf = 0.9 confirmed / 0.85 revised                     │
//! │                          ↓                                   │
//! │  Round 3: Consensus      group by (type, target), sum conf,  │
//! │                          strictly highest wins, ties → first │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rounds 1 and 2 involve I/O and live in the application layer; everything
//! here is pure.

pub mod confidence;
pub mod consensus;
pub mod discussion;
pub mod proposal;

pub use confidence::{ConfidencePolicy, Stance};
pub use consensus::{ConfidenceMap, ConsensusResult, VoteGroup, VoteTally};
pub use discussion::{discussion_context, with_discussion};
pub use proposal::{AgentId, Proposal, Round};
