//! Guardrail state machine
//!
//! Rules rewrite the consensus action from session flags; flags advance only
//! from the result of an executed action.

pub mod flags;
pub mod rules;

pub use flags::{
    DISCOVERY_ADD_DONE, FILTERED_ADD_DONE, FlagUpdate, GuardrailFlags, VERIFICATION_VISITED,
    prerequisite_flag,
};
pub use rules::{
    ActionMatcher, ApplyBeforeRediscovery, FlowGuardrailConfig, GuardrailChain, GuardrailContext,
    GuardrailOutcome, GuardrailRewrite, GuardrailRule, MatchMode, Prerequisite, PrerequisitesFirst,
    SingleDiscoveryAdd, Verdict, VerifyAfterTerminalAdd,
};
