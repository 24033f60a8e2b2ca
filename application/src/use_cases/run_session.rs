//! Run Session use case
//!
//! The top-level turn loop. Each turn runs
//! `capture → decide → guardrails → loop check → validate → execute → update`
//! and exactly one [`Termination`] ends the session.

use crate::config::SessionParams;
use crate::ports::executor::{ExecutorPort, Snapshot};
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::recorder::{NoRecorder, SessionStart, TurnRecord, TurnRecorder};
use crate::use_cases::run_committee::{CommitteeError, CommitteeUseCase};
use crate::use_cases::shared::is_cancelled;
use chrono::Utc;
use committee_domain::{
    Action, ActionValidator, DomainError, GuardrailChain, HistoryEntry, LoopDetector, LoopVerdict, Scenario,
    SchemaValidator, SessionReport, SessionState, Termination, TurnUpdate, ValidationContext,
    action_succeeded, compose_observation,
};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that prevent a session from starting
///
/// Everything that happens once the session runs is reported as a
/// [`Termination`] in the [`SessionReport`] instead.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    InvalidScenario(#[from] DomainError),
}

/// Counters kept while the turn loop runs
#[derive(Debug, Default)]
struct TurnCounters {
    executed: usize,
    recorded: usize,
}

/// Use case for running one test session
pub struct RunSessionUseCase {
    committee: CommitteeUseCase,
    executor: Arc<dyn ExecutorPort>,
    validator: Arc<dyn ActionValidator>,
    recorder: Arc<dyn TurnRecorder>,
    guardrails: GuardrailChain,
    detector: LoopDetector,
    params: SessionParams,
    cancellation_token: Option<CancellationToken>,
}

impl RunSessionUseCase {
    pub fn new(committee: CommitteeUseCase, executor: Arc<dyn ExecutorPort>) -> Self {
        let params = SessionParams::default();
        Self {
            committee,
            executor,
            validator: Arc::new(SchemaValidator),
            recorder: Arc::new(NoRecorder),
            guardrails: GuardrailChain::disabled(),
            detector: LoopDetector::new(params.loop_policy.clone()),
            params,
            cancellation_token: None,
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_validator(mut self, validator: Arc<dyn ActionValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn TurnRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn with_guardrails(mut self, guardrails: GuardrailChain) -> Self {
        self.guardrails = guardrails;
        self
    }

    pub fn with_params(mut self, params: SessionParams) -> Self {
        self.detector = LoopDetector::new(params.loop_policy.clone());
        self.params = params;
        self
    }

    /// Honor `token` before each turn, between rounds and before execution
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.committee = self.committee.with_cancellation(token.clone());
        self.cancellation_token = Some(token);
        self
    }

    /// Execute the session with default (no-op) progress
    pub async fn execute(&self, scenario: &Scenario) -> Result<SessionReport, SessionError> {
        self.execute_with_progress(scenario, &NoProgress).await
    }

    /// Execute the session with progress callbacks
    pub async fn execute_with_progress(
        &self,
        scenario: &Scenario,
        progress: &dyn ProgressNotifier,
    ) -> Result<SessionReport, SessionError> {
        scenario.validate()?;

        let started_at = Utc::now();
        let session_id = format!("session_{}", started_at.format("%Y%m%d_%H%M%S_%3f"));
        let agents = self.committee.agents();
        let max_turns = self.params.max_turns.unwrap_or(scenario.max_turns);

        info!(
            "Starting session {} for '{}' with {} agents, {} turns max",
            session_id,
            scenario.name,
            agents.len(),
            max_turns
        );

        self.recorder.start_session(&SessionStart {
            session_id: session_id.clone(),
            scenario: scenario.name.clone(),
            scenario_slug: scenario.slug(),
            agents: agents.iter().map(|a| a.source().to_string()).collect(),
            max_turns,
            started_at,
        });
        progress.on_session_start(&session_id, scenario, agents.len());

        let mut state = SessionState::new(self.params.loop_policy.history_window);
        let mut counters = TurnCounters::default();
        let termination = self
            .run_turns(scenario, max_turns, &mut state, &mut counters, progress)
            .await;

        let finished_at = Utc::now();
        let report = SessionReport {
            session_id,
            scenario: scenario.name.clone(),
            status: termination.status(),
            termination,
            turns_executed: counters.executed,
            turns_recorded: counters.recorded,
            completed_criteria: state.completed_criteria().iter().cloned().collect(),
            started_at_ms: started_at.timestamp_millis().max(0) as u64,
            finished_at_ms: finished_at.timestamp_millis().max(0) as u64,
        };

        info!(
            "Session {} {}: {} ({} turns executed)",
            report.session_id, report.status, report.termination, report.turns_executed
        );
        self.recorder.end_session(&report);
        progress.on_session_end(&report);
        Ok(report)
    }

    async fn run_turns(
        &self,
        scenario: &Scenario,
        max_turns: usize,
        state: &mut SessionState,
        counters: &mut TurnCounters,
        progress: &dyn ProgressNotifier,
    ) -> Termination {
        if let Some(url) = &scenario.initial_url {
            if is_cancelled(&self.cancellation_token) {
                return Termination::Cancelled;
            }
            match self.executor.execute(&Action::navigate(url)).await {
                Ok(execution) => state.set_location(execution.location.unwrap_or_else(|| url.clone())),
                Err(e) => {
                    return Termination::ExecutionFailed {
                        error: format!("initial navigation to {} failed: {}", url, e),
                    };
                }
            }
        }

        let safety = ValidationContext {
            safety_checks: !scenario.is_security_test(),
        };

        for turn in 1..=max_turns {
            if is_cancelled(&self.cancellation_token) {
                return Termination::Cancelled;
            }
            state.begin_turn(turn);
            info!("Turn {}/{}", turn, max_turns);
            progress.on_turn_start(turn, max_turns);

            // Capture context
            let snapshot = match self.executor.snapshot().await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    return Termination::ExecutionFailed {
                        error: format!("snapshot failed: {}", e),
                    };
                }
            };
            self.observe(scenario, state, &snapshot);
            let observation = compose_observation(scenario, state, &snapshot.page_state);

            // Decide
            let consensus = match self
                .committee
                .decide(&observation, snapshot.image.as_deref(), progress)
                .await
            {
                Ok(consensus) => consensus,
                Err(CommitteeError::Cancelled) => return Termination::Cancelled,
                Err(CommitteeError::ProposerPoolExhausted) => return Termination::ProposerPoolExhausted,
                Err(e) => return Termination::CommitteeFailed { error: e.to_string() },
            };
            progress.on_consensus(turn, &consensus);

            // Guardrails
            let outcome = self
                .guardrails
                .apply(consensus.action.clone(), state.flags(), state.current_url());
            for rewrite in &outcome.rewrites {
                debug!("Guardrail {}", rewrite);
                progress.on_guardrail_rewrite(rewrite);
            }
            let action = outcome.action;
            let record = TurnRecord::new(turn, action.clone(), &consensus, outcome.rewrites);

            // Loop check
            match self.detector.check(state.history(), &action) {
                LoopVerdict::Loop(reason) => {
                    warn!("{}", reason);
                    progress.on_loop_detected(&action, &reason);
                    let history: Vec<HistoryEntry> = state.history().iter().cloned().collect();
                    self.record(
                        counters,
                        record
                            .rejected(vec![format!("loop_detected:{}", reason)], &snapshot.page_state)
                            .with_history(history.clone()),
                    );
                    return Termination::LoopDetected {
                        action,
                        reason,
                        history,
                    };
                }
                LoopVerdict::Allow(reason) if reason.is_repeat() => {
                    info!("Repeated {}: {} - allowing", action, reason.describe());
                }
                LoopVerdict::Allow(_) => {}
            }

            // Validate
            let validation = self.validator.validate(&action, &safety);
            if !validation.passed {
                warn!("Validation failed for {}: {}", action, validation.reasons.join(", "));
                progress.on_validation_failed(&action, &validation);
                let mut record = record.rejected(validation.reasons.clone(), &snapshot.page_state);
                record.safety_pass = validation.safety_pass();
                self.record(counters, record);
                return Termination::ValidationFailed {
                    action,
                    reasons: validation.reasons,
                };
            }

            if is_cancelled(&self.cancellation_token) {
                return Termination::Cancelled;
            }

            // Execute
            let url_before = state.current_url().to_string();
            let execution = match self.executor.execute(&action).await {
                Ok(execution) => execution,
                Err(e) => {
                    warn!("Execution of {} failed: {}", action, e);
                    counters.executed += 1;
                    let mut record = record.rejected(vec![format!("execution_error:{}", e)], &snapshot.page_state);
                    record.safety_pass = validation.safety_pass();
                    self.record(counters, record);
                    return Termination::ExecutionFailed { error: e.to_string() };
                }
            };
            counters.executed += 1;

            let succeeded = action_succeeded(&execution.observation, &self.params.failure_markers);
            let conclusion = if action.is_report() {
                action
                    .report_issue()
                    .unwrap_or(action.target())
                    .to_string()
            } else {
                String::new()
            };

            let mut record = record;
            record.success = true;
            record.action_succeeded = Some(succeeded);
            record.latency_secs = execution.latency.as_secs_f64();
            record.safety_pass = validation.safety_pass();
            record.validators = vec!["ok".to_string()];
            record.conclusion = conclusion.clone();
            record.page_state = execution.observation.clone();
            self.record(counters, record);

            // Update state
            let url_after = execution.location.clone().unwrap_or_else(|| url_before.clone());
            let flag_updates = if succeeded {
                self.guardrails
                    .derive_flag_updates(&action, state.flags(), &url_before, &url_after)
            } else {
                Vec::new()
            };
            if !succeeded {
                warn!("{} reported a failure marker", action);
            }
            state.commit(TurnUpdate {
                turn,
                action: action.clone(),
                success: succeeded,
                flag_updates,
                location: execution.location,
                track_security_probes: scenario.is_security_test(),
            });
            self.update_criteria(scenario, state);
            progress.on_action_executed(turn, &action, succeeded, execution.latency);

            if action.is_report() {
                return Termination::Reported { conclusion };
            }
        }

        Termination::TurnBudgetExhausted { max_turns }
    }

    /// Fold a fresh snapshot into the session state
    fn observe(&self, scenario: &Scenario, state: &mut SessionState, snapshot: &Snapshot) {
        if !snapshot.url.is_empty() {
            state.set_location(snapshot.url.clone());
        }
        if let Some(update) = self.guardrails.observe_location(state.current_url()) {
            state.apply_flags(&[update]);
        }
        self.update_criteria(scenario, state);
    }

    fn update_criteria(&self, scenario: &Scenario, state: &mut SessionState) {
        let newly_met: Vec<String> = scenario
            .success_criteria
            .iter()
            .filter(|c| !state.completed_criteria().contains(&c.label))
            .filter(|c| c.is_met(state.current_url(), state.history()))
            .map(|c| c.label.clone())
            .collect();
        for label in newly_met {
            info!("Criterion met: {}", label);
            state.mark_completed(label);
        }
    }

    fn record(&self, counters: &mut TurnCounters, record: TurnRecord) {
        self.recorder.log_turn(&record);
        counters.recorded += 1;
    }
}
