use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::BackendError;
use crate::locator::locator_model::ElementDescriptor;
use crate::locator::synthesizer::Synthesizer;
use crate::suggest::backend::ScoringBackend;
use crate::suggest::heuristic::local_result;
use crate::suggest::merge::{flatten, merge};
use crate::suggest::relevance::{partition, rank};
use crate::suggest::suggest_model::{
    DegradedReason, ScoringRequest, ScoringResponse, ShardReport, ShardStatus, SuggestConfig,
    SuggestionOutcome, SuggestionResult, SuggestionSource,
};

/// Fans descriptor shards out to a scoring backend and merges the answers.
///
/// All shard futures are polled on the caller's task: there is one writer
/// for the result list and the early-stop flag, and no locking.
pub struct SuggestionOrchestrator<B: ScoringBackend> {
    backend: B,
    config: SuggestConfig,
    synthesizer: Synthesizer,
}

impl<B: ScoringBackend> SuggestionOrchestrator<B> {
    pub fn new(backend: B, config: SuggestConfig) -> Self {
        Self {
            backend,
            config,
            synthesizer: Synthesizer::default(),
        }
    }

    pub fn with_synthesizer(mut self, synthesizer: Synthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn config(&self) -> &SuggestConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Rank, shard, dispatch and merge.
    ///
    /// A failed or timed-out shard contributes nothing. Once any shard
    /// returns a candidate at or above the early-stop threshold no further
    /// shard is dispatched, but those already in flight are awaited and
    /// merged. Only when every dispatched shard failed is the outcome
    /// `Degraded`.
    pub async fn suggest(&self, intent: &str, descriptors: &[ElementDescriptor]) -> SuggestionOutcome {
        let ranked = rank(intent, descriptors, self.config.max_candidates);
        if ranked.is_empty() {
            debug!(intent, "no plausible candidates to score");
            return SuggestionOutcome::Degraded(DegradedReason::NoCandidates);
        }

        let shards = partition(ranked, self.config.shard_size);
        let total = shards.len();
        let window = self.config.max_in_flight.max(1);
        info!(intent, shards = total, window, "dispatching suggestion shards");

        let mut reports: Vec<ShardReport> = Vec::with_capacity(total);
        let mut responses: Vec<ScoringResponse> = Vec::new();
        let mut early_stopped = false;

        let mut pending = shards.into_iter().enumerate().map(|(i, elements)| (i + 1, elements));
        let mut in_flight = FuturesUnordered::new();

        loop {
            while !early_stopped && in_flight.len() < window {
                match pending.next() {
                    Some((shard, elements)) => in_flight.push(self.score_shard(intent, shard, elements)),
                    None => break,
                }
            }

            let Some((shard, size, result)) = in_flight.next().await else {
                break;
            };

            match result {
                Ok(response) => {
                    let top = top_score(&response);
                    let count = flatten(&response).len();
                    debug!(shard, candidates = count, top_score = ?top, "shard completed");

                    if top.is_some_and(|s| s >= self.config.early_stop_threshold) && !early_stopped {
                        info!(shard, "high-confidence candidate found, stopping dispatch");
                        early_stopped = true;
                    }
                    reports.push(ShardReport {
                        shard,
                        size,
                        status: ShardStatus::Completed { candidates: count },
                    });
                    responses.push(response);
                }
                Err(BackendError::Timeout(after)) => {
                    warn!(shard, ?after, "shard timed out");
                    reports.push(ShardReport {
                        shard,
                        size,
                        status: ShardStatus::TimedOut,
                    });
                }
                Err(e) => {
                    warn!(shard, error = %e, "shard failed");
                    reports.push(ShardReport {
                        shard,
                        size,
                        status: ShardStatus::Failed {
                            error: e.to_string(),
                        },
                    });
                }
            }
        }

        for (shard, elements) in pending {
            reports.push(ShardReport {
                shard,
                size: elements.len(),
                status: ShardStatus::Skipped,
            });
        }
        reports.sort_by_key(|r| r.shard);

        let dispatched = reports
            .iter()
            .filter(|r| r.status != ShardStatus::Skipped)
            .count();
        if dispatched > 0 && reports.iter().filter(|r| r.failed()).count() == dispatched {
            warn!(intent, shards = dispatched, "every shard failed, suggestion degraded");
            return SuggestionOutcome::Degraded(DegradedReason::AllShardsFailed { shards: reports });
        }

        let merged = merge(&responses, self.config.top_k);
        SuggestionOutcome::Suggested(SuggestionResult {
            best: merged.best,
            candidates: merged.candidates,
            dedupe_key: merged.dedupe_key,
            shards: reports,
            early_stopped,
            source: SuggestionSource::Backend,
        })
    }

    /// `suggest`, falling back to the local heuristic when degraded.
    pub async fn suggest_or_local(&self, intent: &str, descriptors: &[ElementDescriptor]) -> SuggestionResult {
        let shards = match self.suggest(intent, descriptors).await {
            SuggestionOutcome::Suggested(result) => return result,
            SuggestionOutcome::Degraded(DegradedReason::AllShardsFailed { shards }) => shards,
            SuggestionOutcome::Degraded(DegradedReason::NoCandidates) => Vec::new(),
        };

        info!(intent, "falling back to local heuristic suggestions");
        SuggestionResult {
            shards,
            ..local_result(intent, descriptors, &self.synthesizer, self.config.top_k)
        }
    }

    async fn score_shard(
        &self,
        intent: &str,
        shard: usize,
        elements: Vec<ElementDescriptor>,
    ) -> (usize, usize, Result<ScoringResponse, BackendError>) {
        let size = elements.len();
        let request = ScoringRequest {
            intent: intent.to_string(),
            elements,
            shard,
        };
        let budget = self.config.shard_timeout();

        let result = match timeout(budget, self.backend.score(request)).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(budget)),
        };
        (shard, size, result)
    }
}

fn top_score(response: &ScoringResponse) -> Option<f64> {
    response
        .best
        .iter()
        .chain(response.candidates.iter().flatten())
        .map(|c| c.score)
        .filter(|s| s.is_finite())
        .max_by(f64::total_cmp)
}
