//! Observation composition
//!
//! Builds the text every proposer receives at the start of a turn. The
//! section order is stable: context, objective, criteria, progress, history,
//! security probes, the report instruction and finally the page state.

use super::scenario::Scenario;
use super::state::SessionState;
use crate::action::ActionType;
use crate::util::ellipsize;
use std::fmt::Write;

/// Fill values longer than this are elided in the history section
const HISTORY_VALUE_PREVIEW: usize = 50;

/// Substrings whose presence in an executor observation marks the action as
/// not having taken effect
pub const DEFAULT_FAILURE_MARKERS: &[&str] =
    &["ERROR", "CLICK_ERROR", "FILL_ERROR", "NAVIGATE_ERROR", "HTTP_ERROR"];

/// Whether an executor observation reports that the action took effect
pub fn action_succeeded<S: AsRef<str>>(observation: &str, failure_markers: &[S]) -> bool {
    !failure_markers
        .iter()
        .any(|m| !m.as_ref().is_empty() && observation.contains(m.as_ref()))
}

/// Compose the observation text for the current turn
pub fn compose_observation(scenario: &Scenario, state: &SessionState, page_state: &str) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== TEST CONTEXT ===");
    let _ = writeln!(out, "{}", scenario.context);
    let _ = writeln!(out);
    let _ = writeln!(out, "=== PRIMARY OBJECTIVE ===");
    let _ = writeln!(out, "{}", scenario.objective);
    let _ = writeln!(out);
    let _ = writeln!(out, "=== SUCCESS CRITERIA (You must complete ALL of these) ===");
    for (i, criterion) in scenario.success_criteria.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, criterion.label);
    }

    write_progress(&mut out, scenario, state);
    write_history(&mut out, state);
    if scenario.is_security_test() {
        write_security_probes(&mut out, state);
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "IMPORTANT: Use the \"report\" action with type=\"report\" and target=\"task_complete\" \
         ONLY when ALL success criteria have been met. Until then, continue taking actions to \
         complete the task."
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "=== CURRENT PAGE STATE ===");
    out.push_str(page_state);
    out
}

fn write_progress(out: &mut String, scenario: &Scenario, state: &SessionState) {
    let completed: Vec<&str> = scenario
        .success_criteria
        .iter()
        .filter(|c| state.completed_criteria().contains(&c.label))
        .map(|c| c.label.as_str())
        .collect();
    let remaining: Vec<&str> = scenario
        .success_criteria
        .iter()
        .filter(|c| !state.completed_criteria().contains(&c.label))
        .map(|c| c.label.as_str())
        .collect();

    if !completed.is_empty() {
        let _ = writeln!(out, "\n=== PROGRESS ===");
        let _ = writeln!(out, "Completed:");
        for label in &completed {
            let _ = writeln!(out, "  ✓ {}", label);
        }
    }
    if !remaining.is_empty() {
        let _ = writeln!(out, "\nRemaining:");
        for label in &remaining {
            let _ = writeln!(out, "  - {}", label);
        }
    } else if !scenario.success_criteria.is_empty() {
        let _ = writeln!(
            out,
            "\n✓ ALL CRITERIA COMPLETED! Use 'report' action to signal completion."
        );
    }
}

fn write_history(out: &mut String, state: &SessionState) {
    let history = state.history();
    if history.is_empty() {
        let _ = writeln!(out, "\n=== ACTION HISTORY ===\nNo actions taken yet.");
        return;
    }

    let _ = writeln!(out, "\n=== ACTION HISTORY (Last {} actions) ===", history.capacity());
    for (i, entry) in history.iter().enumerate() {
        let indicator = if entry.success { "✓" } else { "✗" };
        let value = match entry.action.fill_value() {
            Some(v) if !v.is_empty() => format!(" (value: {})", ellipsize(v, HISTORY_VALUE_PREVIEW)),
            _ => String::new(),
        };
        let _ = writeln!(
            out,
            "{}. {} {} -> {}{}",
            i + 1,
            indicator,
            entry.action.action_type(),
            entry.action.target(),
            value
        );
    }

    let Some(last) = history.last().filter(|e| !e.success) else {
        return;
    };

    let _ = writeln!(out, "\n⚠️  LAST ACTION FAILED! Consider:");
    if last.action.action_type() == ActionType::Click {
        let _ = writeln!(out, "  - Try a simpler selector (e.g., '.add-to-cart' instead of complex nth-child)");
        let _ = writeln!(out, "  - Use [data-testid] attributes if available");
        let _ = writeln!(out, "  - Try scrolling first if element is off-screen");
        let _ = writeln!(out, "  - Try a different action if selector is incorrect");
    }
    if !state.failed_selectors().is_empty() {
        let _ = writeln!(out, "\n❌ FAILED SELECTORS (DO NOT USE THESE):");
        for (selector, count) in state.failed_selectors() {
            let _ = writeln!(out, "  - {} (failed {}x)", selector, count);
        }
    }
}

fn write_security_probes(out: &mut String, state: &SessionState) {
    if state.security_probes().is_empty() {
        return;
    }
    let _ = writeln!(out, "\n=== SECURITY TESTS ATTEMPTED ===");
    for probe in state.security_probes() {
        let _ = writeln!(out, "  ✓ {}", probe);
    }
    let _ = writeln!(
        out,
        "\nContinue testing different security vulnerabilities. Don't repeat the same test with the same payload."
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::session::scenario::SuccessCriterion;
    use crate::session::state::TurnUpdate;

    fn scenario() -> Scenario {
        Scenario::new("Shop", "Buy one item")
            .with_context("You are a shopper.")
            .with_criterion(SuccessCriterion::visited_view("View products", "/products"))
            .with_criterion(SuccessCriterion::visited_view("View cart", "/cart"))
    }

    fn commit(state: &mut SessionState, turn: usize, action: Action, success: bool, probes: bool) {
        state.commit(TurnUpdate {
            turn,
            action,
            success,
            flag_updates: vec![],
            location: None,
            track_security_probes: probes,
        });
    }

    #[test]
    fn test_sections_in_order() {
        let state = SessionState::default();
        let obs = compose_observation(&scenario(), &state, "<page/>");
        let context = obs.find("=== TEST CONTEXT ===").unwrap();
        let objective = obs.find("=== PRIMARY OBJECTIVE ===").unwrap();
        let history = obs.find("No actions taken yet.").unwrap();
        let page = obs.find("=== CURRENT PAGE STATE ===").unwrap();
        assert!(context < objective && objective < history && history < page);
        assert!(obs.ends_with("<page/>"));
        assert!(obs.contains("1. View products"));
        assert!(obs.contains("  - View cart"));
    }

    #[test]
    fn test_all_done_hint() {
        let mut state = SessionState::default();
        state.mark_completed("View products");
        state.mark_completed("View cart");
        let obs = compose_observation(&scenario(), &state, "");
        assert!(obs.contains("ALL CRITERIA COMPLETED"));
        assert!(obs.contains("  ✓ View cart"));
    }

    #[test]
    fn test_history_marks_and_failure_hints() {
        let mut state = SessionState::default();
        commit(&mut state, 1, Action::fill("#q", "x".repeat(60)), true, false);
        commit(&mut state, 2, Action::click("#missing"), false, false);
        let obs = compose_observation(&scenario(), &state, "");
        assert!(obs.contains(&format!("1. ✓ fill -> #q (value: {}...)", "x".repeat(50))));
        assert!(obs.contains("2. ✗ click -> #missing"));
        assert!(obs.contains("LAST ACTION FAILED"));
        assert!(obs.contains("  - #missing (failed 1x)"));
    }

    #[test]
    fn test_security_section_only_for_security_scenarios() {
        let mut state = SessionState::default();
        commit(&mut state, 1, Action::fill("#q", "<script>"), true, true);
        let obs = compose_observation(&scenario(), &state, "");
        assert!(!obs.contains("SECURITY TESTS ATTEMPTED"));

        let security = scenario().with_security_testing(true);
        let obs = compose_observation(&security, &state, "");
        assert!(obs.contains("  ✓ XSS test in #q"));
    }

    #[test]
    fn test_failure_markers() {
        assert!(action_succeeded("200 OK :: fine", DEFAULT_FAILURE_MARKERS));
        assert!(!action_succeeded("CLICK_ERROR: not found", DEFAULT_FAILURE_MARKERS));
        assert!(!action_succeeded("HTTP_ERROR: refused", &["HTTP_ERROR".to_string()]));
        assert!(action_succeeded("anything", &[""]));
    }
}
