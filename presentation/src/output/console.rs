//! Console output formatter for session reports

use colored::Colorize;
use committee_domain::{SessionReport, SessionStatus};

/// Formats session reports for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete session report
    pub fn format(report: &SessionReport) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Session Report"));
        output.push('\n');

        output.push_str(&format!("{} {}\n", "Scenario:".cyan().bold(), report.scenario));
        output.push_str(&format!("{} {}\n", "Session:".cyan().bold(), report.session_id));
        output.push_str(&format!(
            "{} {}\n",
            "Status:".cyan().bold(),
            Self::status_label(report.status)
        ));
        output.push_str(&format!("{} {}\n", "Ended by:".cyan().bold(), report.termination));

        output.push_str(&Self::section_header("Turns"));
        output.push_str(&format!(
            "  executed: {}\n  recorded: {}\n  duration: {:.1}s\n",
            report.turns_executed,
            report.turns_recorded,
            report.duration_ms() as f64 / 1000.0
        ));

        if !report.completed_criteria.is_empty() {
            output.push_str(&Self::section_header("Completed Criteria"));
            for label in &report.completed_criteria {
                output.push_str(&format!("  {} {}\n", "v".green(), label));
            }
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(report: &SessionReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    fn status_label(status: SessionStatus) -> String {
        let label = status.as_str().to_uppercase();
        match status {
            SessionStatus::Completed => label.green().bold().to_string(),
            SessionStatus::Exhausted => label.yellow().bold().to_string(),
            SessionStatus::Failed => label.red().bold().to_string(),
            SessionStatus::Cancelled => label.dimmed().to_string(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use committee_domain::Termination;

    fn report() -> SessionReport {
        SessionReport {
            session_id: "session_20260101_120000_000".to_string(),
            scenario: "Checkout".to_string(),
            status: SessionStatus::Completed,
            termination: Termination::Reported {
                conclusion: "task_complete".to_string(),
            },
            turns_executed: 4,
            turns_recorded: 4,
            completed_criteria: vec!["Cart visited".to_string()],
            started_at_ms: 1_000,
            finished_at_ms: 3_500,
        }
    }

    #[test]
    fn test_format_contains_summary() {
        colored::control::set_override(false);
        let text = ConsoleFormatter::format(&report());
        assert!(text.contains("Scenario: Checkout"));
        assert!(text.contains("Status: COMPLETED"));
        assert!(text.contains("reported: task_complete"));
        assert!(text.contains("executed: 4"));
        assert!(text.contains("duration: 2.5s"));
        assert!(text.contains("Cart visited"));
    }

    #[test]
    fn test_format_json() {
        let json = ConsoleFormatter::format_json(&report());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "completed");
        assert_eq!(value["termination"]["kind"], "reported");
        assert_eq!(value["termination"]["conclusion"], "task_complete");
        assert_eq!(value["turns_executed"], 4);
    }
}
