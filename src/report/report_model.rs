use serde::{Deserialize, Serialize};

use crate::verify::check::CheckResult;

// ============================================================================
// Verification report — aggregates CheckResult instances
// ============================================================================

/// Aggregated report for one check suite.
///
/// Built from a `Vec<CheckResult>` via `from_results()` and rendered by the
/// console reporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Name of the check suite
    pub suite_name: String,

    pub total: usize,
    pub passed: usize,
    pub failed: usize,

    /// Total execution duration in milliseconds (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,

    pub results: Vec<CheckResult>,
}

impl VerifyReport {
    /// Build a report, computing total, passed and failed counts.
    pub fn from_results(suite_name: &str, results: Vec<CheckResult>) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        Self {
            suite_name: suite_name.to_string(),
            total,
            passed,
            failed: total - passed,
            duration_ms: None,
            results,
        }
    }

    pub fn with_duration(mut self, duration_ms: u128) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
