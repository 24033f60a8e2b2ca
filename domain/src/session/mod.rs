//! Test session domain
//!
//! - [`scenario::Scenario`]: what a session is asked to achieve
//! - [`state::SessionState`]: mutable per-session state, committed once per turn
//! - [`observation::compose_observation`]: the text proposers see each turn
//! - [`outcome::Termination`]: the one condition that ended a session

pub mod observation;
pub mod outcome;
pub mod probes;
pub mod scenario;
pub mod state;

pub use observation::{DEFAULT_FAILURE_MARKERS, action_succeeded, compose_observation};
pub use outcome::{SessionReport, SessionStatus, Termination};
pub use probes::classify_security_probe;
pub use scenario::{CriterionKind, DEFAULT_MAX_TURNS, Scenario, SuccessCriterion};
pub use state::{ActionHistory, DEFAULT_HISTORY_WINDOW, HistoryEntry, SessionState, TurnUpdate};
