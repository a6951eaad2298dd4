use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::locator::locator_model::ElementDescriptor;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestConfig {
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    #[serde(default = "default_shard_size")]
    pub shard_size: usize,
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    #[serde(default = "default_early_stop_threshold")]
    pub early_stop_threshold: f64,
    #[serde(default = "default_shard_timeout_ms")]
    pub shard_timeout_ms: u64,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_max_candidates() -> usize {
    320
}

fn default_shard_size() -> usize {
    80
}

fn default_max_in_flight() -> usize {
    4
}

fn default_early_stop_threshold() -> f64 {
    0.90
}

fn default_shard_timeout_ms() -> u64 {
    5_000
}

fn default_top_k() -> usize {
    10
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            max_candidates: default_max_candidates(),
            shard_size: default_shard_size(),
            max_in_flight: default_max_in_flight(),
            early_stop_threshold: default_early_stop_threshold(),
            shard_timeout_ms: default_shard_timeout_ms(),
            top_k: default_top_k(),
        }
    }
}

impl SuggestConfig {
    pub fn shard_timeout(&self) -> Duration {
        Duration::from_millis(self.shard_timeout_ms)
    }
}

// ============================================================================
// Backend wire format
// ============================================================================

/// One shard as sent to the scoring backend.
#[derive(Debug, Clone, Serialize)]
pub struct ScoringRequest {
    pub intent: String,
    pub elements: Vec<ElementDescriptor>,
    /// 1-based shard number; local bookkeeping only.
    #[serde(skip)]
    pub shard: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringResponse {
    #[serde(default)]
    pub best: Option<ScoredCandidate>,
    #[serde(default)]
    pub candidates: Option<Vec<ScoredCandidate>>,
}

/// A backend-scored locator. Unknown fields are kept so that candidates
/// without a locator value can still be told apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    #[serde(rename = "locatorValue", default, skip_serializing_if = "Option::is_none")]
    pub locator_value: Option<String>,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ScoredCandidate {
    pub fn new(locator_value: &str, score: f64) -> Self {
        Self {
            locator_value: Some(locator_value.to_string()),
            score,
            rationale: None,
            extra: Map::new(),
        }
    }

    pub fn with_rationale(mut self, rationale: &str) -> Self {
        self.rationale = Some(rationale.to_string());
        self
    }

    /// Structural dedupe key: the locator value, or else the JSON form of
    /// the remaining fields (score excluded, so rescored copies collapse).
    pub fn dedupe_key(&self) -> String {
        if let Some(value) = &self.locator_value {
            return value.clone();
        }
        let mut fields = self.extra.clone();
        if let Some(rationale) = &self.rationale {
            fields.insert("rationale".to_string(), Value::String(rationale.clone()));
        }
        Value::Object(fields).to_string()
    }
}

// ============================================================================
// Results
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum ShardStatus {
    Completed { candidates: usize },
    Failed { error: String },
    TimedOut,
    /// Never dispatched because of early stop.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShardReport {
    pub shard: usize,
    pub size: usize,
    #[serde(flatten)]
    pub status: ShardStatus,
}

impl ShardReport {
    pub fn failed(&self) -> bool {
        matches!(self.status, ShardStatus::Failed { .. } | ShardStatus::TimedOut)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionSource {
    Backend,
    LocalHeuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionResult {
    pub best: Option<ScoredCandidate>,
    pub candidates: Vec<ScoredCandidate>,
    pub dedupe_key: String,
    pub shards: Vec<ShardReport>,
    pub early_stopped: bool,
    pub source: SuggestionSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum DegradedReason {
    /// Nothing survived the prefilter.
    NoCandidates,
    AllShardsFailed { shards: Vec<ShardReport> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum SuggestionOutcome {
    Suggested(SuggestionResult),
    /// The caller should fall back to local heuristics.
    Degraded(DegradedReason),
}
