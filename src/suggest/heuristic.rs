use crate::content::normalize::{intent_tokens, token_overlap};
use crate::locator::locator_model::ElementDescriptor;
use crate::locator::synthesizer::Synthesizer;
use crate::suggest::merge::{Merged, merge_candidates};
use crate::suggest::relevance::{is_plausibly_interactive, searchable_text};
use crate::suggest::suggest_model::{ScoredCandidate, SuggestionResult, SuggestionSource};

/// Ceiling for locally scored candidates. Kept below any sensible early-stop
/// threshold so a local guess never reads as high confidence.
pub const LOCAL_SCORE_CEILING: f64 = 0.85;

/// Intent-token overlap over each descriptor's accessible text and
/// identifiers, located with the synthesizer's best candidate.
pub fn local_suggestions(
    intent: &str,
    descriptors: &[ElementDescriptor],
    synthesizer: &Synthesizer,
    top_k: usize,
) -> Merged {
    let tokens = intent_tokens(intent);

    let scored = descriptors.iter().filter_map(|descriptor| {
        let overlap = token_overlap(&tokens, &searchable_text(descriptor));
        if overlap <= 0.0 {
            return None;
        }
        let locator = synthesizer.synthesize(descriptor, descriptors).into_iter().next()?;
        let rationale = format!("local heuristic: {:.0}% intent overlap ({})", overlap * 100.0, locator.rationale);
        Some(ScoredCandidate::new(&locator.value, overlap * LOCAL_SCORE_CEILING).with_rationale(&rationale))
    });

    merge_candidates(scored, top_k)
}

/// A complete local-heuristic result over the plausibly interactive
/// descriptors. No shard is ever dispatched.
pub fn local_result(
    intent: &str,
    descriptors: &[ElementDescriptor],
    synthesizer: &Synthesizer,
    top_k: usize,
) -> SuggestionResult {
    let plausible: Vec<ElementDescriptor> = descriptors
        .iter()
        .filter(|d| is_plausibly_interactive(d))
        .cloned()
        .collect();
    let merged = local_suggestions(intent, &plausible, synthesizer, top_k);

    SuggestionResult {
        best: merged.best,
        candidates: merged.candidates,
        dedupe_key: merged.dedupe_key,
        shards: Vec::new(),
        early_stopped: false,
        source: SuggestionSource::LocalHeuristic,
    }
}
