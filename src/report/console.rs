use crate::report::report_model::VerifyReport;
use crate::resolve::resolver::{NearMiss, Resolution, ResolvedVia};
use crate::suggest::suggest_model::{ShardStatus, SuggestionOutcome, SuggestionResult};

// ============================================================================
// Console reporter — formatted terminal output
// ============================================================================

/// Format a verification report for terminal output.
///
/// ```text
/// === Check Suite: checkout ===
///
/// ✓ PASS  Exists login-button
/// ✗ FAIL  TextContains price — text does not contain '$24.99'
///
/// === Results: 1 passed, 1 failed (2 total) ===
/// ```
pub fn format_verify_report(report: &VerifyReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Check Suite: {} ===\n\n", report.suite_name));

    for result in &report.results {
        let marker = if result.passed {
            "\u{2713} PASS"
        } else {
            "\u{2717} FAIL"
        };
        out.push_str(&format!(
            "{}  {} {}",
            marker,
            result.check.name(),
            result.check.element()
        ));
        if let Some(message) = &result.message {
            out.push_str(&format!(" \u{2014} {}", message));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "\n=== Results: {} passed, {} failed ({} total)",
        report.passed, report.failed, report.total
    ));

    if let Some(ms) = report.duration_ms {
        let secs = ms as f64 / 1000.0;
        out.push_str(&format!(" in {:.1}s", secs));
    }

    out.push_str(" ===\n");
    out
}

/// One-paragraph summary of a resolution.
pub fn format_resolution(element_id: &str, resolution: &Resolution) -> String {
    match resolution {
        Resolution::Resolved(r) => {
            let how = match &r.via {
                ResolvedVia::Locator {
                    index,
                    value,
                    stability,
                } => {
                    let tier = stability
                        .map(|s| format!("{:?}", s).to_lowercase())
                        .unwrap_or_else(|| "unrated".to_string());
                    format!("locator #{} {} ({})", index + 1, value, tier)
                }
                ResolvedVia::TextFragment { fragment } => format!("text fragment \"{}\"", fragment),
                ResolvedVia::Attribute { name, value } => format!("fallback {}=\"{}\"", name, value),
            };
            let mut out = format!(
                "\u{2713} {} resolved to node {} via {}",
                element_id, r.node.0, how
            );
            if r.match_count > 1 {
                out.push_str(&format!(" [ambiguous: {} matches]", r.match_count));
            }
            out.push('\n');
            out
        }
        Resolution::Unresolved(u) => {
            let mut out = format!(
                "\u{2717} {} unresolved after {} locator attempts\n",
                element_id,
                u.attempts.len()
            );
            for miss in &u.near_misses {
                let line = match miss {
                    NearMiss::AttributeOnOtherTag {
                        node,
                        attribute,
                        value,
                        tag,
                    } => format!("{}=\"{}\" found on <{}> (node {})", attribute, value, tag, node.0),
                    NearMiss::PartialText { node, overlap } => {
                        format!("{:.0}% of expected text on node {}", overlap * 100.0, node.0)
                    }
                };
                out.push_str(&format!("    near miss: {}\n", line));
            }
            out
        }
    }
}

pub fn format_suggestion(outcome: &SuggestionOutcome) -> String {
    match outcome {
        SuggestionOutcome::Suggested(result) => format_suggestion_result(result),
        SuggestionOutcome::Degraded(reason) => format!("suggestion degraded: {:?}\n", reason),
    }
}

pub fn format_suggestion_result(result: &SuggestionResult) -> String {
    let mut out = format!(
        "=== Suggestions ({:?}{}) ===\n",
        result.source,
        if result.early_stopped { ", early stop" } else { "" }
    );

    for (rank, candidate) in result.candidates.iter().enumerate() {
        out.push_str(&format!(
            "{:>2}. {:.2}  {}",
            rank + 1,
            candidate.score,
            candidate.locator_value.as_deref().unwrap_or("<no locator>")
        ));
        if let Some(rationale) = &candidate.rationale {
            out.push_str(&format!("  ({})", rationale));
        }
        out.push('\n');
    }

    for shard in &result.shards {
        let status = match &shard.status {
            ShardStatus::Completed { candidates } => format!("{} candidates", candidates),
            ShardStatus::Failed { error } => format!("failed: {}", error),
            ShardStatus::TimedOut => "timed out".to_string(),
            ShardStatus::Skipped => "skipped".to_string(),
        };
        out.push_str(&format!("    shard {} ({} elements): {}\n", shard.shard, shard.size, status));
    }

    out
}
