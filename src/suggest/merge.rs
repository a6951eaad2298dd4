use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::content::normalize::text_fingerprint;
use crate::suggest::suggest_model::{ScoredCandidate, ScoringResponse};

#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    pub best: Option<ScoredCandidate>,
    pub candidates: Vec<ScoredCandidate>,
    pub dedupe_key: String,
}

/// Candidates one shard contributes: its list, or its single best when the
/// list is missing or empty.
pub fn flatten(response: &ScoringResponse) -> Vec<ScoredCandidate> {
    match &response.candidates {
        Some(list) if !list.is_empty() => list.clone(),
        _ => response.best.iter().cloned().collect(),
    }
}

/// Merge shard responses into one ranked, deduplicated list.
///
/// Independent of response order: per dedupe key the highest score wins
/// (ties broken by JSON form), and the final order is score descending, then
/// key ascending. Non-finite scores are discarded.
pub fn merge(responses: &[ScoringResponse], top_k: usize) -> Merged {
    merge_candidates(responses.iter().flat_map(flatten), top_k)
}

pub fn merge_candidates(candidates: impl IntoIterator<Item = ScoredCandidate>, top_k: usize) -> Merged {
    let mut by_key: BTreeMap<String, ScoredCandidate> = BTreeMap::new();

    for candidate in candidates {
        if !candidate.score.is_finite() {
            continue;
        }
        let key = candidate.dedupe_key();
        match by_key.get(&key) {
            Some(existing) if prefer(existing, &candidate) != Ordering::Less => {}
            _ => {
                by_key.insert(key, candidate);
            }
        }
    }

    let mut ranked: Vec<(String, ScoredCandidate)> = by_key.into_iter().collect();
    ranked.sort_by(|(ka, a), (kb, b)| b.score.total_cmp(&a.score).then_with(|| ka.cmp(kb)));
    ranked.truncate(top_k);

    let keys: Vec<&str> = ranked.iter().map(|(k, _)| k.as_str()).collect();
    let dedupe_key = text_fingerprint(&keys.join("\n"));

    let candidates: Vec<ScoredCandidate> = ranked.into_iter().map(|(_, c)| c).collect();
    Merged {
        best: candidates.first().cloned(),
        candidates,
        dedupe_key,
    }
}

/// Total order between two candidates sharing a key.
fn prefer(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    a.score.total_cmp(&b.score).then_with(|| {
        let ja = serde_json::to_string(a).unwrap_or_default();
        let jb = serde_json::to_string(b).unwrap_or_default();
        jb.cmp(&ja)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(candidates: Vec<ScoredCandidate>) -> ScoringResponse {
        ScoringResponse {
            best: None,
            candidates: Some(candidates),
        }
    }

    #[test]
    fn keeps_highest_score_per_locator() {
        let merged = merge(
            &[
                response(vec![ScoredCandidate::new("#buy", 0.4)]),
                response(vec![ScoredCandidate::new("#buy", 0.8), ScoredCandidate::new("#cart", 0.6)]),
            ],
            10,
        );

        assert_eq!(merged.candidates.len(), 2);
        assert_eq!(merged.candidates[0], ScoredCandidate::new("#buy", 0.8));
        assert_eq!(merged.best, Some(ScoredCandidate::new("#buy", 0.8)));
    }

    #[test]
    fn falls_back_to_best_without_list() {
        let shard = ScoringResponse {
            best: Some(ScoredCandidate::new("#only", 0.5)),
            candidates: None,
        };
        assert_eq!(flatten(&shard), vec![ScoredCandidate::new("#only", 0.5)]);
    }

    #[test]
    fn drops_non_finite_and_truncates() {
        let merged = merge_candidates(
            vec![
                ScoredCandidate::new("#a", f64::NAN),
                ScoredCandidate::new("#b", 0.3),
                ScoredCandidate::new("#c", 0.2),
            ],
            1,
        );
        assert_eq!(merged.candidates, vec![ScoredCandidate::new("#b", 0.3)]);
    }
}
