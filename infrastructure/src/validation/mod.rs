//! Action validators
//!
//! Implementations of [`ActionValidator`](committee_domain::ActionValidator)
//! that need more than the domain's schema checks.

mod pattern;

pub use pattern::{PatternFamily, PatternValidator};
