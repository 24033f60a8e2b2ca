//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`CommitteeParams`]: proposer timeout and confidence policy
//! - [`SessionParams`]: loop policy, failure markers and turn budget

pub mod committee_params;
pub mod session_params;

pub use committee_params::CommitteeParams;
pub use session_params::SessionParams;
