//! CLI entrypoint for beta-committee
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use committee_application::{
    CommitteeUseCase, ExecutorPort, NoProgress, NoRecorder, ProgressNotifier, ProposerPort,
    RunSessionUseCase, TurnRecorder,
};
use committee_domain::{GuardrailChain, Scenario, SessionStatus};
use committee_infrastructure::{
    CommandProposer, ConfigLoader, FileConfig, JsonlTurnRecorder, PatternValidator,
};
use committee_presentation::{Cli, ConsoleFormatter, OutputFormat, ProgressReporter};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_tracing(cli.verbose, cli.log_dir.as_deref());

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(ExitCode::SUCCESS);
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("failed to load configuration")?
    };
    config.validate().context("invalid configuration")?;

    let scenario = load_scenario(&cli, &config)?;
    info!("Starting beta-committee for scenario '{}'", scenario.name);

    // === Dependency Injection ===
    let proposers = build_proposers(&config)?;
    let executor = build_executor(&cli, &config)?;

    let mut params = config.session_params();
    if let Some(max_turns) = cli.max_turns {
        if max_turns == 0 {
            bail!("--max-turns must be at least 1");
        }
        params = params.with_max_turns(max_turns);
    }

    let guardrails = if cli.no_guardrails {
        GuardrailChain::disabled()
    } else {
        config.guardrails.to_chain()
    };

    let jsonl_recorder = (!cli.no_record && config.recorder.enabled).then(|| {
        let dir = cli
            .results_dir
            .clone()
            .unwrap_or_else(|| config.recorder.results_dir.clone());
        Arc::new(JsonlTurnRecorder::new(dir))
    });
    let recorder: Arc<dyn TurnRecorder> = match &jsonl_recorder {
        Some(recorder) => recorder.clone() as Arc<dyn TurnRecorder>,
        None => Arc::new(NoRecorder),
    };

    let validator = PatternValidator::new().with_safety_checks(config.validation.safety_checks);

    let cancellation = CancellationToken::new();
    spawn_ctrl_c_handler(cancellation.clone());

    let committee = CommitteeUseCase::new(proposers, config.committee_params());
    let use_case = RunSessionUseCase::new(committee, executor)
        .with_validator(Arc::new(validator))
        .with_recorder(recorder)
        .with_guardrails(guardrails)
        .with_params(params)
        .with_cancellation(cancellation);

    let progress: Box<dyn ProgressNotifier> = if cli.quiet || cli.output == OutputFormat::Json {
        Box::new(NoProgress)
    } else {
        Box::new(ProgressReporter::new())
    };

    let report = use_case
        .execute_with_progress(&scenario, progress.as_ref())
        .await
        .context("session could not start")?;

    let output = match cli.output {
        OutputFormat::Summary => ConsoleFormatter::format(&report),
        OutputFormat::Json => ConsoleFormatter::format_json(&report),
    };
    println!("{}", output);

    if let Some(path) = jsonl_recorder.as_ref().and_then(|r| r.path()) {
        info!("Turn records written to {}", path.display());
    }

    Ok(exit_code(report.status))
}

/// Console logs go to stderr so `--output json` stays machine-readable
fn init_tracing(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console = fmt::layer().with_target(false).with_writer(std::io::stderr);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "beta-committee.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(console).init();
            None
        }
    }
}

fn load_scenario(cli: &Cli, config: &FileConfig) -> Result<Scenario> {
    let scenario = match &cli.scenario {
        Some(path) => ConfigLoader::load_scenario(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?,
        None => config
            .scenario
            .clone()
            .ok_or_else(|| anyhow!("no scenario: pass --scenario <PATH> or add a [scenario] section"))?,
    };
    scenario.validate()?;
    Ok(scenario)
}

fn build_proposers(config: &FileConfig) -> Result<Vec<Arc<dyn ProposerPort>>> {
    if config.agents.is_empty() {
        bail!("no proposers configured: add at least one [[agents]] entry");
    }
    Ok(config
        .agents
        .iter()
        .map(|agent| {
            Arc::new(
                CommandProposer::new(agent.label(), &agent.command)
                    .with_args(agent.args.clone())
                    .with_env(agent.env.clone()),
            ) as Arc<dyn ProposerPort>
        })
        .collect())
}

#[cfg(feature = "rest")]
fn build_executor(cli: &Cli, config: &FileConfig) -> Result<Arc<dyn ExecutorPort>> {
    use committee_infrastructure::RestExecutor;
    use std::time::Duration;

    let base_url = cli.base_url.clone().unwrap_or_else(|| config.aut.base_url.clone());
    info!("Application under test: {}", base_url);
    let executor = RestExecutor::new(base_url, Duration::from_secs(config.aut.request_timeout_secs))?;
    Ok(Arc::new(executor))
}

#[cfg(not(feature = "rest"))]
fn build_executor(_cli: &Cli, _config: &FileConfig) -> Result<Arc<dyn ExecutorPort>> {
    bail!("no executor available: build with the `rest` feature")
}

fn spawn_ctrl_c_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling session");
            token.cancel();
        }
    });
}

fn exit_code(status: SessionStatus) -> ExitCode {
    match status {
        SessionStatus::Completed | SessionStatus::Exhausted => ExitCode::SUCCESS,
        SessionStatus::Failed => ExitCode::FAILURE,
        SessionStatus::Cancelled => ExitCode::from(130),
    }
}
