//! Progress reporting for committee sessions

use colored::Colorize;
use committee_application::ports::progress::ProgressNotifier;
use committee_domain::{
    Action, AgentId, ConsensusResult, GuardrailRewrite, Round, Scenario, SessionReport, ValidationReport,
};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Reports progress during a session with progress bars
pub struct ProgressReporter {
    multi: MultiProgress,
    round_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            round_bar: Mutex::new(None),
        }
    }

    fn round_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .map(|style| style.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }

    /// Print above the bars without tearing them
    fn line(&self, text: String) {
        let _ = self.multi.println(text);
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_round_start(&self, round: Round, total_agents: usize) {
        let pb = self.multi.add(ProgressBar::new(total_agents as u64));
        pb.set_style(Self::round_style());
        pb.set_prefix(round.display_name().to_string());
        pb.set_message("Waiting for agents...");

        if let Ok(mut bar) = self.round_bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_agent_complete(&self, _round: Round, agent: &AgentId, success: bool) {
        if let Ok(bar) = self.round_bar.lock()
            && let Some(pb) = bar.as_ref()
        {
            let status = if success {
                format!("{} {}", "v".green(), agent)
            } else {
                format!("{} {}", "x".red(), agent)
            };
            pb.set_message(status);
            pb.inc(1);
        }
    }

    fn on_round_complete(&self, round: Round) {
        if let Ok(mut bar) = self.round_bar.lock()
            && let Some(pb) = bar.take()
        {
            pb.finish_and_clear();
            self.multi.remove(&pb);
            self.line(format!("  {} {}", "v".green(), round.display_name().dimmed()));
        }
    }

    fn on_session_start(&self, session_id: &str, scenario: &Scenario, agents: usize) {
        self.line(format!(
            "{} {} {}",
            "Session".cyan().bold(),
            session_id,
            format!("({} agents)", agents).dimmed()
        ));
        self.line(format!("{} {}", "Objective:".bold(), scenario.objective));
    }

    fn on_turn_start(&self, turn: usize, max_turns: usize) {
        self.line(format!("\n{}", format!("── Turn {}/{} ──", turn, max_turns).yellow().bold()));
    }

    fn on_consensus(&self, _turn: usize, result: &ConsensusResult) {
        self.line(format!(
            "  {} {} {}",
            "Consensus:".cyan(),
            result.action,
            format!("(strength {:.2})", result.consensus_strength).dimmed()
        ));
    }

    fn on_guardrail_rewrite(&self, rewrite: &GuardrailRewrite) {
        self.line(format!(
            "  {} {}: {} => {}",
            "Guardrail".magenta(),
            rewrite.rule,
            rewrite.from,
            rewrite.to
        ));
    }

    fn on_loop_detected(&self, _action: &Action, reason: &str) {
        self.line(format!("  {} {}", "!".red().bold(), reason.red()));
    }

    fn on_validation_failed(&self, action: &Action, report: &ValidationReport) {
        self.line(format!(
            "  {} {} rejected: {}",
            "!".red().bold(),
            action,
            report.reasons.join(", ")
        ));
    }

    fn on_action_executed(&self, _turn: usize, action: &Action, succeeded: bool, latency: Duration) {
        let mark = if succeeded { "v".green() } else { "x".red() };
        self.line(format!(
            "  {} {} {}",
            mark,
            action,
            format!("{:.2}s", latency.as_secs_f64()).dimmed()
        ));
    }

    fn on_session_end(&self, report: &SessionReport) {
        if let Ok(mut bar) = self.round_bar.lock()
            && let Some(pb) = bar.take()
        {
            pb.finish_and_clear();
        }
        self.line(format!("\n{} {}", "Session ended:".bold(), report.termination));
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_round_start(&self, round: Round, total_agents: usize) {
        println!("{} {} ({} agents)", "->".cyan(), round.display_name().bold(), total_agents);
    }

    fn on_agent_complete(&self, _round: Round, agent: &AgentId, success: bool) {
        if success {
            println!("  {} {}", "v".green(), agent);
        } else {
            println!("  {} {} (failed)", "x".red(), agent);
        }
    }

    fn on_round_complete(&self, _round: Round) {}

    fn on_turn_start(&self, turn: usize, max_turns: usize) {
        println!("\n{}", format!("Turn {}/{}", turn, max_turns).yellow().bold());
    }

    fn on_consensus(&self, _turn: usize, result: &ConsensusResult) {
        println!("{} {}", "Consensus:".cyan(), result.action);
    }

    fn on_action_executed(&self, _turn: usize, action: &Action, succeeded: bool, _latency: Duration) {
        let mark = if succeeded { "v".green() } else { "x".red() };
        println!("{} {}", mark, action);
    }
}
