//! Action domain
//!
//! The data contract exchanged between proposers, the committee, guardrails
//! and the executor.
//!
//! - [`entities::Action`]: an immutable UI action with a typed payload
//! - [`entities::ActionKey`]: the `(type, target)` grouping key
//! - [`parsing::parse_action`]: lenient decoding of decision-source output

pub mod entities;
pub mod parsing;

pub use entities::{Action, ActionKey, ActionPayload, ActionType, RawAction};
pub use parsing::{ActionParseError, action_from_value, parse_action};
