use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::report::report_model::VerifyReport;
use crate::resolve::healing::HealReport;
use crate::resolve::resolver::{Resolution, ResolvedVia};
use crate::suggest::suggest_model::{SuggestionOutcome, SuggestionResult, SuggestionSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditKind {
    Resolve,
    Heal,
    Suggest,
    Verify,
}

/// One line of the audit trail.
#[derive(Debug, Serialize)]
pub struct AuditEvent {
    pub timestamp_ms: u128,
    pub kind: AuditKind,

    pub subject: String,
    pub outcome: String,

    pub rule: Option<String>,
    pub locator: Option<String>,
    pub match_count: Option<usize>,

    pub detail: Option<String>,
}

impl AuditEvent {
    pub fn now(kind: AuditKind, subject: &str) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            kind,
            subject: subject.to_string(),
            outcome: String::new(),
            rule: None,
            locator: None,
            match_count: None,
            detail: None,
        }
    }

    pub fn with_outcome(mut self, outcome: impl ToString) -> Self {
        self.outcome = outcome.to_string();
        self
    }

    pub fn with_rule(mut self, rule: impl ToString) -> Self {
        self.rule = Some(rule.to_string());
        self
    }

    pub fn with_locator(mut self, locator: &str) -> Self {
        self.locator = Some(locator.to_string());
        self
    }

    pub fn with_match_count(mut self, count: usize) -> Self {
        self.match_count = Some(count);
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    pub fn resolution(element_id: &str, resolution: &Resolution) -> Self {
        let event = Self::now(AuditKind::Resolve, element_id);
        match resolution {
            Resolution::Resolved(r) => {
                let event = event
                    .with_outcome("resolved")
                    .with_rule(r.via.rule())
                    .with_match_count(r.match_count);
                match &r.via {
                    ResolvedVia::Locator { value, .. } => event.with_locator(value),
                    _ => event,
                }
            }
            Resolution::Unresolved(u) => event
                .with_outcome("unresolved")
                .with_detail(format!("{} attempts, {} near misses", u.attempts.len(), u.near_misses.len())),
        }
    }

    pub fn heal(element_id: &str, report: &HealReport) -> Self {
        let event = Self::now(AuditKind::Heal, element_id);
        match (&report.resolution, &report.proposal) {
            (Resolution::Unresolved(_), _) => event.with_outcome("unresolved"),
            (Resolution::Resolved(r), None) => event.with_outcome("unchanged").with_rule(r.via.rule()),
            (Resolution::Resolved(r), Some(proposal)) => event
                .with_outcome("proposed")
                .with_rule(r.via.rule())
                .with_detail(format!("version {}", proposal.version)),
        }
    }

    pub fn suggestion(intent: &str, outcome: &SuggestionOutcome) -> Self {
        let event = Self::now(AuditKind::Suggest, intent);
        match outcome {
            SuggestionOutcome::Suggested(result) => Self::suggestion_result(event, result),
            SuggestionOutcome::Degraded(reason) => event
                .with_outcome("degraded")
                .with_detail(format!("{:?}", reason)),
        }
    }

    pub fn suggestion_fallback(intent: &str, result: &SuggestionResult) -> Self {
        Self::suggestion_result(Self::now(AuditKind::Suggest, intent), result)
    }

    pub fn verify(report: &VerifyReport) -> Self {
        let outcome = if report.all_passed() { "passed" } else { "failed" };
        Self::now(AuditKind::Verify, &report.suite_name)
            .with_outcome(outcome)
            .with_match_count(report.total)
            .with_detail(format!("{} passed, {} failed", report.passed, report.failed))
    }

    fn suggestion_result(event: Self, result: &SuggestionResult) -> Self {
        let event = event
            .with_outcome(match result.source {
                SuggestionSource::Backend => "backend",
                SuggestionSource::LocalHeuristic => "local-heuristic",
            })
            .with_match_count(result.candidates.len())
            .with_detail(format!("dedupe {}", result.dedupe_key));
        match result.best.as_ref().and_then(|b| b.locator_value.as_deref()) {
            Some(locator) => event.with_locator(locator),
            None => event,
        }
    }
}
