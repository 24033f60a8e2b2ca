//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the session summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Summary,
    /// JSON session report
    Json,
}

/// CLI arguments for beta-committee
#[derive(Parser, Debug)]
#[command(name = "beta-committee")]
#[command(author, version, about = "Committee-driven exploratory testing")]
#[command(long_about = r#"
beta-committee runs an exploratory test session against an application under
test. Several proposer agents suggest the next action every turn:

1. Independent: every agent proposes an action on its own
2. Discussion: agents see each other's choices and refine theirs
3. Consensus: proposals are grouped and the highest confidence sum wins

Guardrails and loop detection post-process the winner before it is executed.

Configuration files are loaded from (in priority order):
1. COMMITTEE_* environment variables
2. --config <path>        Explicit config file
3. ./committee.toml       Project-level config
4. ~/.config/beta-committee/config.toml   Global config

Example:
  beta-committee --scenario scenarios/checkout.toml
  beta-committee --scenario probe.json --max-turns 10 --base-url http://localhost:8000 -vv
"#)]
pub struct Cli {
    /// Scenario file (.toml or .json); falls back to the [scenario] config section
    #[arg(short, long, value_name = "PATH")]
    pub scenario: Option<PathBuf>,

    /// Override the turn budget
    #[arg(short = 't', long, value_name = "N")]
    pub max_turns: Option<usize>,

    /// Override the application base URL
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Disable guardrail rewrites
    #[arg(long)]
    pub no_guardrails: bool,

    /// Directory for per-session JSONL records
    #[arg(long, value_name = "DIR")]
    pub results_dir: Option<PathBuf>,

    /// Do not write JSONL records
    #[arg(long)]
    pub no_record: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Write daily-rotated log files into this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_options() {
        let cli = Cli::parse_from([
            "beta-committee",
            "--scenario",
            "checkout.toml",
            "-t",
            "7",
            "--no-guardrails",
            "-o",
            "json",
            "-vv",
        ]);
        assert_eq!(cli.scenario, Some(PathBuf::from("checkout.toml")));
        assert_eq!(cli.max_turns, Some(7));
        assert!(cli.no_guardrails);
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["beta-committee"]);
        assert!(cli.scenario.is_none());
        assert_eq!(cli.output, OutputFormat::Summary);
        assert_eq!(cli.verbose, 0);
    }
}
