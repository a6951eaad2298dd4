use serde::Serialize;
use tracing::debug;

use crate::content::identifiers::is_dynamic_identifier;
use crate::dom::dom_model::{DocumentLike, NodeId};
use crate::dom::query::query;
use crate::locator::locator_model::{ElementDescriptor, LocatorCandidate, Stability};
use crate::locator::synthesizer::Synthesizer;
use crate::scan::context::ScanContext;
use crate::scan::describe::{describe, is_scan_candidate};

pub const DEFAULT_MAX_RESULTS: usize = 300;

// ============================================================================
// Output model
// ============================================================================

/// What contributed to a group's rank.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "signal", rename_all = "kebab-case")]
pub enum RankSignal {
    Tag { tag: String, weight: u32 },
    TestId,
    Id,
    GroupLabel,
    Visible,
}

impl RankSignal {
    pub fn weight(&self) -> u32 {
        match self {
            RankSignal::Tag { weight, .. } => *weight,
            RankSignal::TestId => 25,
            RankSignal::Id => 15,
            RankSignal::GroupLabel => 10,
            RankSignal::Visible => 10,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCandidateGroup {
    pub node: NodeId,
    pub descriptor: ElementDescriptor,
    pub accessible_name: Option<String>,
    pub candidates: Vec<LocatorCandidate>,
    pub score: u32,
    pub signals: Vec<RankSignal>,
}

// ============================================================================
// Scanner
// ============================================================================

#[derive(Debug, Clone)]
pub struct Scanner {
    pub synthesizer: Synthesizer,
    pub max_results: usize,
}

impl Default for Scanner {
    fn default() -> Self {
        Self {
            synthesizer: Synthesizer::default(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl Scanner {
    pub fn new(synthesizer: Synthesizer, max_results: usize) -> Self {
        Self {
            synthesizer,
            max_results,
        }
    }

    /// One document-order pass over `doc`.
    ///
    /// Every accepted node is described first so synthesis sees the whole
    /// page; ranking and truncation happen afterwards. The document is never
    /// modified.
    pub fn scan<D: DocumentLike + ?Sized>(&self, doc: &D, ctx: &mut ScanContext) -> Vec<RankedCandidateGroup> {
        let accepted: Vec<NodeId> = doc
            .all_nodes()
            .into_iter()
            .filter(|n| is_scan_candidate(doc, *n))
            .collect();

        let descriptors: Vec<ElementDescriptor> =
            accepted.iter().map(|n| describe(doc, *n, ctx)).collect();

        let mut groups: Vec<RankedCandidateGroup> = accepted
            .iter()
            .zip(&descriptors)
            .map(|(node, descriptor)| {
                let signals = rank_signals(descriptor);
                RankedCandidateGroup {
                    node: *node,
                    descriptor: descriptor.clone(),
                    accessible_name: descriptor.accessible_name().map(str::to_string),
                    candidates: self.synthesizer.synthesize(descriptor, &descriptors),
                    score: signals.iter().map(RankSignal::weight).sum(),
                    signals,
                }
            })
            .collect();

        // stable: equal scores keep document order
        groups.sort_by(|a, b| b.score.cmp(&a.score));
        groups.truncate(self.max_results);

        for group in &mut groups {
            confirm_on_page(doc, group.node, &mut group.candidates);
        }

        let (lookups, hits) = ctx.stats();
        debug!(
            accepted = accepted.len(),
            returned = groups.len(),
            group_lookups = lookups,
            group_memo_hits = hits,
            "scan complete"
        );

        groups
    }
}

/// Scan with default settings and a throwaway context.
pub fn scan<D: DocumentLike + ?Sized>(doc: &D, max_results: usize) -> Vec<RankedCandidateGroup> {
    let scanner = Scanner {
        max_results,
        ..Scanner::default()
    };
    scanner.scan(doc, &mut ScanContext::new())
}

fn rank_signals(descriptor: &ElementDescriptor) -> Vec<RankSignal> {
    let tag_weight = match (descriptor.tag.as_str(), descriptor.role()) {
        ("button", _) | (_, Some("button")) => 30,
        ("input" | "select" | "textarea" | "a", _) => 20,
        _ => 10,
    };

    let mut signals = vec![RankSignal::Tag {
        tag: descriptor.tag.clone(),
        weight: tag_weight,
    }];
    if descriptor.test_id.is_some() {
        signals.push(RankSignal::TestId);
    }
    if descriptor.id.as_deref().is_some_and(|id| !is_dynamic_identifier(id)) {
        signals.push(RankSignal::Id);
    }
    if descriptor.group_context.is_some() {
        signals.push(RankSignal::GroupLabel);
    }
    if descriptor.visible {
        signals.push(RankSignal::Visible);
    }
    signals
}

/// Unique among accepted descriptors is not always unique on the page
/// (a class also worn by nodes the scanner skipped). Every `High` or
/// `Medium` candidate must query to exactly `node`; the rest drop to `Low`.
pub fn confirm_on_page<D: DocumentLike + ?Sized>(doc: &D, node: NodeId, candidates: &mut [LocatorCandidate]) {
    for candidate in candidates {
        if candidate.stability == Stability::Low {
            continue;
        }
        let matches = query(doc, &candidate.value).unwrap_or_default();
        if matches != [node] {
            debug!(
                locator = %candidate.value,
                matches = matches.len(),
                "candidate not unique on page, demoting"
            );
            candidate.stability = Stability::Low;
            candidate.rationale.push_str(" (not unique on page)");
        }
    }
}
