//! Round-2 discussion context
//!
//! Only `(agent, type, target)` tuples are shared with the committee; payloads
//! and reasoning stay private to the agent that produced them.

use super::proposal::Proposal;

/// Summarize round-1 proposals for the discussion round
pub fn discussion_context(proposals: &[Proposal]) -> String {
    let summary = proposals
        .iter()
        .map(|p| {
            format!(
                "Agent {}: {} → {}",
                p.agent.index(),
                p.action.action_type(),
                p.action.target()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Previous proposals from the committee:\n{}\n\n\
         After reviewing the other agents' proposals, refine your decision.\n\
         Consider: Are you changing your mind? Sticking with your original proposal?",
        summary
    )
}

/// Append the discussion context to the original observation
pub fn with_discussion(observation: &str, context: &str) -> String {
    format!("{}\n\n{}", observation, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::committee::proposal::{AgentId, Round};

    #[test]
    fn test_context_lists_type_and_target_only() {
        let proposals = vec![
            Proposal::new(
                AgentId::new(1, "a"),
                Round::Independent,
                Action::fill("#search", "secret-value"),
                0.8,
                "private chain of thought",
            ),
            Proposal::new(AgentId::new(3, "c"), Round::Independent, Action::navigate("/cart"), 0.8, ""),
        ];

        let context = discussion_context(&proposals);
        assert!(context.contains("Agent 1: fill → #search"));
        assert!(context.contains("Agent 3: navigate → /cart"));
        assert!(!context.contains("secret-value"));
        assert!(!context.contains("private chain of thought"));
    }

    #[test]
    fn test_with_discussion_keeps_observation_first() {
        let combined = with_discussion("PAGE", "CONTEXT");
        assert!(combined.starts_with("PAGE"));
        assert!(combined.ends_with("CONTEXT"));
    }
}
