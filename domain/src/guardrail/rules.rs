//! Guardrail rules
//!
//! Guardrails post-process the consensus action before it is executed. Each
//! rule is a pure function of `(action, flags, current URL)`; the
//! [`GuardrailChain`] evaluates them in a fixed order so later rules see the
//! output of earlier ones.
//!
//! The canonical rule set models a multi-step flow:
//!
//! ```text
//! discovery view ── add once ──▶ prerequisites (fill, in order)
//!        ▲                              │
//!        └── blocked while apply        ▼
//!            is pending          apply / add ──▶ verification view
//! ```
//!
//! What counts as "discovery", "add", "apply" and "verification" is described
//! by [`FlowGuardrailConfig`]; the default mirrors a storefront
//! (search → price filters → add to cart → cart).

use super::flags::{
    DISCOVERY_ADD_DONE, FILTERED_ADD_DONE, FlagUpdate, GuardrailFlags, VERIFICATION_VISITED,
    prerequisite_flag,
};
use crate::action::{Action, ActionType};
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

// ==================== Flow configuration ====================

/// How an [`ActionMatcher`] compares its pattern against an action target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Contains,
    Prefix,
    Exact,
}

/// Matches actions by optional type and a target pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMatcher {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<ActionType>,
    pub pattern: String,
    #[serde(default)]
    pub mode: MatchMode,
}

impl ActionMatcher {
    pub fn new(action_type: Option<ActionType>, pattern: impl Into<String>, mode: MatchMode) -> Self {
        Self {
            action_type,
            pattern: pattern.into(),
            mode,
        }
    }

    pub fn contains(action_type: ActionType, pattern: impl Into<String>) -> Self {
        Self::new(Some(action_type), pattern, MatchMode::Contains)
    }

    pub fn prefix(action_type: ActionType, pattern: impl Into<String>) -> Self {
        Self::new(Some(action_type), pattern, MatchMode::Prefix)
    }

    pub fn exact(action_type: ActionType, pattern: impl Into<String>) -> Self {
        Self::new(Some(action_type), pattern, MatchMode::Exact)
    }

    pub fn matches(&self, action: &Action) -> bool {
        if let Some(t) = self.action_type
            && t != action.action_type()
        {
            return false;
        }
        let target = action.target();
        match self.mode {
            MatchMode::Contains => target.contains(&self.pattern),
            MatchMode::Prefix => target.starts_with(&self.pattern),
            MatchMode::Exact => target == self.pattern,
        }
    }
}

/// A fill that must happen before the apply/add action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prerequisite {
    pub target: String,
    pub value: String,
}

impl Prerequisite {
    pub fn new(target: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            value: value.into(),
        }
    }

    pub fn action(&self) -> Action {
        Action::fill(&self.target, &self.value)
    }

    pub fn flag(&self) -> String {
        prerequisite_flag(&self.target)
    }
}

/// Description of the guarded flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowGuardrailConfig {
    /// Matches any attempt at the "add" step, whatever its type
    pub add: ActionMatcher,
    /// URL fragment identifying the discovery view
    pub discovery_view: String,
    /// Where to go after the one allowed add from the discovery view
    pub after_discovery: String,
    /// Actions that re-enter discovery (new searches)
    pub discovery_entry: Vec<ActionMatcher>,
    /// Fills that must succeed before the apply action, in priority order
    pub prerequisites: Vec<Prerequisite>,
    /// The action that applies the satisfied prerequisites
    pub apply_action: Action,
    /// URL fragment identifying the final verification view
    pub verification_view: String,
    /// Action leading to the verification view
    pub verification_action: Action,
    /// Actions already heading to the verification view
    pub verification_entry: Vec<ActionMatcher>,
}

impl Default for FlowGuardrailConfig {
    fn default() -> Self {
        Self {
            add: ActionMatcher::new(None, "add-to-cart", MatchMode::Contains),
            discovery_view: "/search".to_string(),
            after_discovery: "/products".to_string(),
            discovery_entry: vec![
                ActionMatcher::prefix(ActionType::Fill, "#searchInput"),
                ActionMatcher::contains(ActionType::Click, "search-button"),
            ],
            prerequisites: vec![
                Prerequisite::new("#minPrice", "10"),
                Prerequisite::new("#maxPrice", "200"),
            ],
            apply_action: Action::click(".add-to-cart"),
            verification_view: "/cart".to_string(),
            verification_action: Action::click(".go-to-cart"),
            verification_entry: vec![
                ActionMatcher::contains(ActionType::Click, "go-to-cart"),
                ActionMatcher::contains(ActionType::Click, "/cart"),
            ],
        }
    }
}

impl FlowGuardrailConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.add.pattern.is_empty() {
            return Err(DomainError::InvalidFlow("add pattern must not be empty".into()));
        }
        if let Some(p) = self.prerequisites.iter().find(|p| p.target.trim().is_empty()) {
            return Err(DomainError::InvalidFlow(format!(
                "prerequisite with value '{}' has an empty target",
                p.value
            )));
        }
        if self.after_discovery.trim().is_empty() {
            return Err(DomainError::InvalidFlow("after_discovery must not be empty".into()));
        }
        Ok(())
    }

    pub fn prerequisites_satisfied(&self, flags: &GuardrailFlags) -> bool {
        self.prerequisites.iter().all(|p| flags.is_set(&p.flag()))
    }

    pub fn next_missing_prerequisite(&self, flags: &GuardrailFlags) -> Option<&Prerequisite> {
        self.prerequisites.iter().find(|p| !flags.is_set(&p.flag()))
    }

    /// An add that counts toward the flow: it matches `add` and has the
    /// matcher's type, or the apply action's type when the matcher is untyped
    pub fn is_committed_add(&self, action: &Action) -> bool {
        let committed_type = self.add.action_type.unwrap_or(self.apply_action.action_type());
        action.action_type() == committed_type && self.add.matches(action)
    }

    fn on_discovery_view(&self, url: &str) -> bool {
        !self.discovery_view.is_empty() && url.contains(&self.discovery_view)
    }

    fn on_verification_view(&self, url: &str) -> bool {
        !self.verification_view.is_empty() && url.contains(&self.verification_view)
    }
}

// ==================== Rules ====================

/// Inputs every rule sees
#[derive(Debug, Clone, Copy)]
pub struct GuardrailContext<'a> {
    pub flags: &'a GuardrailFlags,
    pub current_url: &'a str,
    pub flow: &'a FlowGuardrailConfig,
}

/// A rule's decision
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Keep,
    Replace(Action),
}

/// A deterministic rewrite rule
pub trait GuardrailRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, action: &Action, ctx: &GuardrailContext<'_>) -> Verdict;
}

/// Rule 1: one add from the discovery view, then move on
pub struct SingleDiscoveryAdd;

impl GuardrailRule for SingleDiscoveryAdd {
    fn name(&self) -> &'static str {
        "single_discovery_add"
    }

    fn evaluate(&self, action: &Action, ctx: &GuardrailContext<'_>) -> Verdict {
        if ctx.flags.is_set(DISCOVERY_ADD_DONE)
            && ctx.flow.on_discovery_view(ctx.current_url)
            && ctx.flow.add.matches(action)
        {
            Verdict::Replace(Action::navigate(&ctx.flow.after_discovery))
        } else {
            Verdict::Keep
        }
    }
}

/// Rule 2: prerequisites satisfied but not applied yet, so no new discovery
pub struct ApplyBeforeRediscovery;

impl GuardrailRule for ApplyBeforeRediscovery {
    fn name(&self) -> &'static str {
        "apply_before_rediscovery"
    }

    fn evaluate(&self, action: &Action, ctx: &GuardrailContext<'_>) -> Verdict {
        if ctx.flow.prerequisites.is_empty()
            || !ctx.flow.prerequisites_satisfied(ctx.flags)
            || ctx.flags.is_set(FILTERED_ADD_DONE)
        {
            return Verdict::Keep;
        }
        if ctx.flow.discovery_entry.iter().any(|m| m.matches(action)) {
            Verdict::Replace(ctx.flow.apply_action.clone())
        } else {
            Verdict::Keep
        }
    }
}

/// Rule 3: an add attempted before its prerequisites fills the next one
pub struct PrerequisitesFirst;

impl GuardrailRule for PrerequisitesFirst {
    fn name(&self) -> &'static str {
        "prerequisites_first"
    }

    fn evaluate(&self, action: &Action, ctx: &GuardrailContext<'_>) -> Verdict {
        if !ctx.flags.is_set(DISCOVERY_ADD_DONE) || !ctx.flow.is_committed_add(action) {
            return Verdict::Keep;
        }
        match ctx.flow.next_missing_prerequisite(ctx.flags) {
            Some(prerequisite) => Verdict::Replace(prerequisite.action()),
            None => Verdict::Keep,
        }
    }
}

/// Rule 4: after the terminal add, head to the verification view
pub struct VerifyAfterTerminalAdd;

impl GuardrailRule for VerifyAfterTerminalAdd {
    fn name(&self) -> &'static str {
        "verify_after_terminal_add"
    }

    fn evaluate(&self, action: &Action, ctx: &GuardrailContext<'_>) -> Verdict {
        if !ctx.flags.is_set(FILTERED_ADD_DONE) || ctx.flags.is_set(VERIFICATION_VISITED) {
            return Verdict::Keep;
        }
        if ctx.flow.verification_entry.iter().any(|m| m.matches(action)) {
            Verdict::Keep
        } else {
            Verdict::Replace(ctx.flow.verification_action.clone())
        }
    }
}

// ==================== Chain ====================

/// A rewrite applied by one rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuardrailRewrite {
    pub rule: &'static str,
    pub from: Action,
    pub to: Action,
}

impl std::fmt::Display for GuardrailRewrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ⇒ {}", self.rule, self.from, self.to)
    }
}

/// Final action plus the rewrites that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct GuardrailOutcome {
    pub action: Action,
    pub rewrites: Vec<GuardrailRewrite>,
}

impl GuardrailOutcome {
    pub fn was_rewritten(&self) -> bool {
        !self.rewrites.is_empty()
    }
}

/// Ordered set of session-scoped rules
pub struct GuardrailChain {
    flow: FlowGuardrailConfig,
    rules: Vec<Box<dyn GuardrailRule>>,
}

impl GuardrailChain {
    /// The canonical four rules over the given flow
    pub fn new(flow: FlowGuardrailConfig) -> Self {
        Self {
            flow,
            rules: vec![
                Box::new(SingleDiscoveryAdd),
                Box::new(ApplyBeforeRediscovery),
                Box::new(PrerequisitesFirst),
                Box::new(VerifyAfterTerminalAdd),
            ],
        }
    }

    /// No rules; actions pass through unchanged
    pub fn disabled() -> Self {
        Self {
            flow: FlowGuardrailConfig::default(),
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: Box<dyn GuardrailRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn flow(&self) -> &FlowGuardrailConfig {
        &self.flow
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn is_enabled(&self) -> bool {
        !self.rules.is_empty()
    }

    /// Run every rule in order
    pub fn apply(&self, action: Action, flags: &GuardrailFlags, current_url: &str) -> GuardrailOutcome {
        let ctx = GuardrailContext {
            flags,
            current_url,
            flow: &self.flow,
        };

        let mut current = action;
        let mut rewrites = Vec::new();

        for rule in &self.rules {
            if let Verdict::Replace(replacement) = rule.evaluate(&current, &ctx)
                && replacement != current
            {
                rewrites.push(GuardrailRewrite {
                    rule: rule.name(),
                    from: current.clone(),
                    to: replacement.clone(),
                });
                current = replacement;
            }
        }

        GuardrailOutcome {
            action: current,
            rewrites,
        }
    }

    /// Flags to raise after `action` executed successfully
    ///
    /// `flags` is the state before the action; `url_before` is where the
    /// action was taken and `url_after` where it led.
    pub fn derive_flag_updates(
        &self,
        action: &Action,
        flags: &GuardrailFlags,
        url_before: &str,
        url_after: &str,
    ) -> Vec<FlagUpdate> {
        if !self.is_enabled() {
            return Vec::new();
        }

        let flow = &self.flow;
        let mut updates = Vec::new();

        if flow.is_committed_add(action) {
            if flow.on_discovery_view(url_before) {
                updates.push(FlagUpdate::raise(DISCOVERY_ADD_DONE));
            }
            if !flow.prerequisites.is_empty() && flow.prerequisites_satisfied(flags) {
                updates.push(FlagUpdate::raise(FILTERED_ADD_DONE));
            }
        }

        if action.action_type() == ActionType::Fill
            && let Some(prerequisite) = flow.prerequisites.iter().find(|p| p.target == action.target())
        {
            updates.push(FlagUpdate::raise(prerequisite.flag()));
        }

        updates.extend(self.observe_location(url_after));
        updates
    }

    /// Flags implied by merely being at `url`
    pub fn observe_location(&self, url: &str) -> Option<FlagUpdate> {
        (self.is_enabled() && self.flow.on_verification_view(url))
            .then(|| FlagUpdate::raise(VERIFICATION_VISITED))
    }
}

impl Default for GuardrailChain {
    fn default() -> Self {
        Self::new(FlowGuardrailConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(names: &[&str]) -> GuardrailFlags {
        let mut flags = GuardrailFlags::new();
        for name in names {
            flags.set(*name);
        }
        flags
    }

    const MIN: &str = "prerequisite:#minPrice";
    const MAX: &str = "prerequisite:#maxPrice";

    #[test]
    fn test_no_flags_passes_through() {
        let chain = GuardrailChain::default();
        let outcome = chain.apply(Action::click(".add-to-cart"), &GuardrailFlags::new(), "/search?q=x");
        assert_eq!(outcome.action, Action::click(".add-to-cart"));
        assert!(!outcome.was_rewritten());
    }

    #[test]
    fn test_rule1_second_discovery_add_becomes_navigation() {
        let chain = GuardrailChain::default();
        // Prerequisites done so rule 3 does not fire afterwards
        let outcome = chain.apply(
            Action::click("#p1 .add-to-cart"),
            &flags(&[DISCOVERY_ADD_DONE, MIN, MAX]),
            "/search?q=shoes",
        );
        assert_eq!(outcome.action, Action::navigate("/products"));
        assert_eq!(outcome.rewrites[0].rule, "single_discovery_add");
    }

    #[test]
    fn test_rule1_is_never_executed_as_is_from_discovery_view() {
        let chain = GuardrailChain::default();
        for state in [
            flags(&[DISCOVERY_ADD_DONE]),
            flags(&[DISCOVERY_ADD_DONE, MIN]),
            flags(&[DISCOVERY_ADD_DONE, MIN, MAX]),
            flags(&[DISCOVERY_ADD_DONE, MIN, MAX, FILTERED_ADD_DONE]),
        ] {
            let outcome = chain.apply(Action::click(".add-to-cart"), &state, "/search");
            assert_ne!(outcome.action, Action::click(".add-to-cart"), "{state:?}");
            assert_eq!(outcome.rewrites[0].rule, "single_discovery_add");
        }
    }

    #[test]
    fn test_rule1_rewrites_add_of_any_type() {
        let chain = GuardrailChain::default();
        let state = flags(&[DISCOVERY_ADD_DONE, MIN, MAX]);
        for action in [
            Action::tap(".add-to-cart"),
            Action::navigate("/search/add-to-cart?id=1"),
        ] {
            let outcome = chain.apply(action.clone(), &state, "/search?q=x");
            assert_eq!(outcome.action, Action::navigate("/products"), "{action}");
            assert_eq!(outcome.rewrites[0].rule, "single_discovery_add");
        }
    }

    #[test]
    fn test_only_committed_adds_raise_flags_or_need_prerequisites() {
        let chain = GuardrailChain::default();
        let tap = Action::tap(".add-to-cart");

        let updates = chain.derive_flag_updates(&tap, &GuardrailFlags::new(), "/search", "/search");
        assert!(updates.is_empty());

        let outcome = chain.apply(tap.clone(), &flags(&[DISCOVERY_ADD_DONE]), "/products");
        assert_eq!(outcome.action, tap);
        assert!(!outcome.was_rewritten());
    }

    #[test]
    fn test_rule1_only_applies_on_discovery_view() {
        let chain = GuardrailChain::default();
        let outcome = chain.apply(
            Action::click(".add-to-cart"),
            &flags(&[DISCOVERY_ADD_DONE, MIN, MAX]),
            "/products",
        );
        assert_eq!(outcome.action, Action::click(".add-to-cart"));
    }

    #[test]
    fn test_rule2_new_search_rewritten_to_apply() {
        let chain = GuardrailChain::default();
        let state = flags(&[DISCOVERY_ADD_DONE, MIN, MAX]);

        let outcome = chain.apply(Action::fill("#searchInput", "hats"), &state, "/products");
        assert_eq!(outcome.action, Action::click(".add-to-cart"));

        let outcome = chain.apply(Action::click("button.search-button"), &state, "/products");
        assert_eq!(outcome.action, Action::click(".add-to-cart"));
        assert_eq!(outcome.rewrites[0].rule, "apply_before_rediscovery");
    }

    #[test]
    fn test_rule2_inactive_after_filtered_add() {
        let chain = GuardrailChain::default();
        let state = flags(&[DISCOVERY_ADD_DONE, MIN, MAX, FILTERED_ADD_DONE, VERIFICATION_VISITED]);
        let outcome = chain.apply(Action::fill("#searchInput", "hats"), &state, "/products");
        assert_eq!(outcome.action, Action::fill("#searchInput", "hats"));
    }

    #[test]
    fn test_rule3_fills_missing_prerequisites_in_order() {
        let chain = GuardrailChain::default();

        let outcome = chain.apply(Action::click(".add-to-cart"), &flags(&[DISCOVERY_ADD_DONE]), "/products");
        assert_eq!(outcome.action, Action::fill("#minPrice", "10"));

        let outcome =
            chain.apply(Action::click(".add-to-cart"), &flags(&[DISCOVERY_ADD_DONE, MIN]), "/products");
        assert_eq!(outcome.action, Action::fill("#maxPrice", "200"));
        assert_eq!(outcome.rewrites[0].rule, "prerequisites_first");
    }

    #[test]
    fn test_rule4_forces_verification() {
        let chain = GuardrailChain::default();
        let state = flags(&[DISCOVERY_ADD_DONE, MIN, MAX, FILTERED_ADD_DONE]);

        let outcome = chain.apply(Action::navigate("/products"), &state, "/products");
        assert_eq!(outcome.action, Action::click(".go-to-cart"));

        let outcome = chain.apply(Action::click("a[href='/cart']"), &state, "/products");
        assert_eq!(outcome.action, Action::click("a[href='/cart']"));

        let done = flags(&[DISCOVERY_ADD_DONE, MIN, MAX, FILTERED_ADD_DONE, VERIFICATION_VISITED]);
        let outcome = chain.apply(Action::report("task_complete", None), &done, "/cart");
        assert!(outcome.action.is_report());
    }

    #[test]
    fn test_later_rules_see_earlier_output() {
        // Rule 1 navigates away; rule 4 then redirects to verification
        let chain = GuardrailChain::default();
        let state = flags(&[DISCOVERY_ADD_DONE, MIN, MAX, FILTERED_ADD_DONE]);
        let outcome = chain.apply(Action::click(".add-to-cart"), &state, "/search");
        assert_eq!(outcome.action, Action::click(".go-to-cart"));
        assert_eq!(outcome.rewrites.len(), 2);
        assert_eq!(outcome.rewrites[1].from, Action::navigate("/products"));
    }

    #[test]
    fn test_disabled_chain() {
        let chain = GuardrailChain::disabled();
        let state = flags(&[DISCOVERY_ADD_DONE]);
        let outcome = chain.apply(Action::click(".add-to-cart"), &state, "/search");
        assert!(!outcome.was_rewritten());
        assert!(chain.derive_flag_updates(&Action::click(".add-to-cart"), &state, "/search", "/cart").is_empty());
    }

    #[test]
    fn test_flag_derivation() {
        let chain = GuardrailChain::default();
        let none = GuardrailFlags::new();

        let updates = chain.derive_flag_updates(&Action::click(".add-to-cart"), &none, "/search?q=a", "/search?q=a");
        assert_eq!(updates, vec![FlagUpdate::raise(DISCOVERY_ADD_DONE)]);

        let updates = chain.derive_flag_updates(&Action::fill("#minPrice", "10"), &none, "/products", "/products");
        assert_eq!(updates, vec![FlagUpdate::raise(MIN)]);

        let ready = flags(&[DISCOVERY_ADD_DONE, MIN, MAX]);
        let updates = chain.derive_flag_updates(&Action::click(".add-to-cart"), &ready, "/products", "/products");
        assert_eq!(updates, vec![FlagUpdate::raise(FILTERED_ADD_DONE)]);

        let updates = chain.derive_flag_updates(&Action::click(".go-to-cart"), &ready, "/products", "/cart");
        assert_eq!(updates, vec![FlagUpdate::raise(VERIFICATION_VISITED)]);
    }

    #[test]
    fn test_custom_flow_config() {
        let flow = FlowGuardrailConfig {
            add: ActionMatcher::contains(ActionType::Tap, "enroll"),
            discovery_view: "/catalog".into(),
            after_discovery: "/courses".into(),
            prerequisites: vec![],
            ..Default::default()
        };
        let chain = GuardrailChain::new(flow);
        let outcome = chain.apply(Action::tap("#enroll-1"), &flags(&[DISCOVERY_ADD_DONE]), "/catalog");
        assert_eq!(outcome.action, Action::navigate("/courses"));
    }

    #[test]
    fn test_flow_validation() {
        assert!(FlowGuardrailConfig::default().validate().is_ok());
        let flow = FlowGuardrailConfig {
            prerequisites: vec![Prerequisite::new(" ", "1")],
            ..Default::default()
        };
        assert!(matches!(flow.validate(), Err(DomainError::InvalidFlow(_))));
    }

    #[test]
    fn test_matcher_modes() {
        let exact = ActionMatcher::exact(ActionType::Fill, "#q");
        assert!(exact.matches(&Action::fill("#q", "")));
        assert!(!exact.matches(&Action::fill("#q2", "")));
        let any_type = ActionMatcher::new(None, "cart", MatchMode::Contains);
        assert!(any_type.matches(&Action::navigate("/cart")));
    }
}
