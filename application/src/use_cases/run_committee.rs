//! Committee use case
//!
//! Runs the three-round protocol over the configured proposers: independent
//! proposals, discussion, consensus vote.

use crate::config::CommitteeParams;
use crate::ports::progress::ProgressNotifier;
use crate::ports::proposer::{ProposerError, ProposerPort};
use crate::use_cases::shared::check_cancelled;
use committee_domain::{
    Action, AgentId, ConsensusResult, Proposal, Round, Stance, discussion_context, with_discussion,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that end a committee decision
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommitteeError {
    #[error("No proposers configured")]
    NoProposers,

    #[error("All proposers failed in round 1")]
    ProposerPoolExhausted,

    #[error("All proposers failed in round {round}")]
    RoundExhausted { round: u8 },

    #[error("Operation cancelled")]
    Cancelled,
}

/// Use case for one committee decision
pub struct CommitteeUseCase {
    proposers: Vec<Arc<dyn ProposerPort>>,
    params: CommitteeParams,
    cancellation_token: Option<CancellationToken>,
}

impl CommitteeUseCase {
    pub fn new(proposers: Vec<Arc<dyn ProposerPort>>, params: CommitteeParams) -> Self {
        Self {
            proposers,
            params,
            cancellation_token: None,
        }
    }

    /// Abort outstanding proposer calls when `token` fires
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub fn params(&self) -> &CommitteeParams {
        &self.params
    }

    /// Agent identities in registration order
    pub fn agents(&self) -> Vec<AgentId> {
        self.proposers
            .iter()
            .enumerate()
            .map(|(i, p)| AgentId::new(i + 1, p.name()))
            .collect()
    }

    /// Run all three rounds and return the consensus
    pub async fn decide(
        &self,
        observation: &str,
        image: Option<&[u8]>,
        progress: &dyn ProgressNotifier,
    ) -> Result<ConsensusResult, CommitteeError> {
        if self.proposers.is_empty() {
            return Err(CommitteeError::NoProposers);
        }

        let image: Option<Arc<[u8]>> = image.map(Arc::from);

        // Round 1: independent proposals
        check_cancelled(&self.cancellation_token)?;
        let independent = self
            .run_round(Round::Independent, Arc::from(observation), image.clone(), progress)
            .await?;
        if independent.is_empty() {
            warn!("All {} proposers failed in round 1", self.proposers.len());
            return Err(CommitteeError::ProposerPoolExhausted);
        }

        let initial = self.params.confidence.confidence_for(Stance::Independent);
        let independent: Vec<Proposal> = independent
            .into_iter()
            .map(|(agent, action)| {
                let reasoning = format!("{} {}", agent, Stance::Independent.describe());
                Proposal::new(agent, Round::Independent, action, initial, reasoning)
            })
            .collect();

        // Round 2: discussion
        check_cancelled(&self.cancellation_token)?;
        let context = discussion_context(&independent);
        let refined = self
            .run_round(
                Round::Discussion,
                Arc::from(with_discussion(observation, &context)),
                image,
                progress,
            )
            .await?;
        if refined.is_empty() {
            warn!("All proposers failed in round 2");
            return Err(CommitteeError::RoundExhausted { round: 2 });
        }

        let discussion: Vec<Proposal> = refined
            .into_iter()
            .map(|(agent, action)| {
                let original = independent
                    .iter()
                    .find(|p| p.agent == agent)
                    .map(|p| &p.action);
                let stance = Stance::between(original, &action);
                let confidence = self.params.confidence.confidence_for(stance);
                debug!("{} {} ({})", agent, stance.describe(), action);
                let reasoning = format!("{} {}", agent, stance.describe());
                Proposal::new(agent, Round::Discussion, action, confidence, reasoning)
            })
            .collect();

        // Round 3: consensus vote
        check_cancelled(&self.cancellation_token)?;
        progress.on_round_start(Round::Consensus, discussion.len());
        let result = ConsensusResult::from_rounds(independent, discussion)
            .ok_or(CommitteeError::RoundExhausted { round: 2 })?;
        progress.on_round_complete(Round::Consensus);

        info!(
            "Consensus: {} (strength {:.2}, {} group(s))",
            result.action,
            result.consensus_strength,
            result.tally.groups.len()
        );
        Ok(result)
    }

    /// Fan out one round to every proposer, bounded by the per-call timeout
    ///
    /// Failed agents are left out. The result is ordered by agent index so
    /// that the vote does not depend on completion order.
    async fn run_round(
        &self,
        round: Round,
        observation: Arc<str>,
        image: Option<Arc<[u8]>>,
        progress: &dyn ProgressNotifier,
    ) -> Result<Vec<(AgentId, Action)>, CommitteeError> {
        info!("{}", round.display_name());
        progress.on_round_start(round, self.proposers.len());

        let timeout = self.params.proposer_timeout;
        let mut join_set = JoinSet::new();

        for (agent, proposer) in self.agents().into_iter().zip(&self.proposers) {
            let proposer = Arc::clone(proposer);
            let observation = Arc::clone(&observation);
            let image = image.clone();

            join_set.spawn(async move {
                let call = proposer.propose(&observation, image.as_deref());
                let result = match tokio::time::timeout(timeout, call).await {
                    Ok(r) => r,
                    Err(_) => Err(ProposerError::Timeout(timeout)),
                };
                (agent, result)
            });
        }

        let mut collected = Vec::new();

        loop {
            let result = if let Some(ref token) = self.cancellation_token {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        join_set.abort_all();
                        return Err(CommitteeError::Cancelled);
                    }
                    result = join_set.join_next() => result,
                }
            } else {
                join_set.join_next().await
            };

            let Some(result) = result else {
                break;
            };

            match result {
                Ok((agent, Ok(action))) => {
                    debug!("{} proposed {}", agent, action);
                    progress.on_agent_complete(round, &agent, true);
                    collected.push((agent, action));
                }
                Ok((agent, Err(e))) => {
                    warn!("{} failed in {}: {}", agent, round.as_str(), e);
                    progress.on_agent_complete(round, &agent, false);
                }
                Err(e) => {
                    warn!("Task join error: {}", e);
                }
            }
        }

        collected.sort_by_key(|(agent, _)| agent.index());
        progress.on_round_complete(round);
        Ok(collected)
    }
}
