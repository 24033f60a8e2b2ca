//! Domain layer for beta-committee
//!
//! This crate contains the core decision logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Committee
//!
//! Several independent decision sources propose the next UI action for an
//! application under test. A three-round protocol (independent, discussion,
//! consensus vote) turns their proposals into one [`Action`].
//!
//! ## Guardrails and loop detection
//!
//! - **Guardrails**: deterministic rewrite rules driven by session flags
//! - **Loop detection**: rejects degenerate repeats of the previous action
//!
//! Both are pure: they borrow [`SessionState`] and return instructions; only
//! the session orchestrator commits changes.

pub mod action;
pub mod committee;
pub mod core;
pub mod guardrail;
pub mod loop_detection;
pub mod session;
pub mod util;
pub mod validation;

// Re-export commonly used types
pub use action::{Action, ActionKey, ActionParseError, ActionPayload, ActionType, action_from_value, parse_action};
pub use committee::{
    AgentId, ConfidenceMap, ConfidencePolicy, ConsensusResult, Proposal, Round, Stance, VoteGroup, VoteTally,
    discussion_context, with_discussion,
};
pub use core::error::DomainError;
pub use guardrail::{
    ActionMatcher, FlagUpdate, FlowGuardrailConfig, GuardrailChain, GuardrailFlags, GuardrailOutcome,
    GuardrailRewrite, GuardrailRule, MatchMode, Prerequisite, Verdict,
};
pub use loop_detection::{AllowReason, LoopDetector, LoopPolicy, LoopVerdict};
pub use session::{
    ActionHistory, CriterionKind, HistoryEntry, Scenario, SessionReport, SessionState, SessionStatus,
    SuccessCriterion, Termination, TurnUpdate, action_succeeded, compose_observation,
};
pub use validation::{ActionValidator, SchemaValidator, ValidationContext, ValidationReport};
