use serde::Serialize;
use tracing::{debug, warn};

use crate::content::normalize::{intent_tokens, token_overlap};
use crate::dom::dom_model::{DocumentLike, NodeId, collapse_whitespace};
use crate::dom::query::Locator;
use crate::locator::locator_model::{Stability, StoredElementRecord};

/// Fallback attributes tried before any other, in this order.
const PRIORITY_ATTRIBUTES: &[&str] = &["id", "name", "class"];

/// Near misses kept in an unresolved report.
const MAX_NEAR_MISSES: usize = 5;

/// Minimum token overlap for a text near miss.
const NEAR_MISS_OVERLAP: f64 = 0.5;

// ============================================================================
// Resolution model
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolverState {
    Init,
    TryPrimary,
    TryFallback,
    Resolved,
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum AttemptOutcome {
    NoMatch,
    Matched { count: usize },
    Invalid { reason: String },
}

/// One primary locator tried during resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocatorAttempt {
    pub locator: String,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

/// How a resolved node was found.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "via", rename_all = "kebab-case")]
pub enum ResolvedVia {
    Locator {
        index: usize,
        value: String,
        stability: Option<Stability>,
    },
    TextFragment {
        fragment: String,
    },
    Attribute {
        name: String,
        value: String,
    },
}

impl ResolvedVia {
    pub fn rule(&self) -> &'static str {
        match self {
            ResolvedVia::Locator { .. } => "primary-locator",
            ResolvedVia::TextFragment { .. } => "text-fragment",
            ResolvedVia::Attribute { .. } => "fallback-attribute",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedElement {
    pub node: NodeId,
    pub via: ResolvedVia,
    /// Nodes the winning rule matched; above 1 means the pick was ambiguous.
    pub match_count: usize,
    pub attempts: Vec<LocatorAttempt>,
}

impl ResolvedElement {
    /// True when the first stored locator found the node.
    pub fn used_first_locator(&self) -> bool {
        matches!(self.via, ResolvedVia::Locator { index: 0, .. })
    }

    pub fn used_fallback(&self) -> bool {
        !matches!(self.via, ResolvedVia::Locator { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum NearMiss {
    /// A fallback attribute matched, but on a different tag.
    AttributeOnOtherTag {
        node: NodeId,
        attribute: String,
        value: String,
        tag: String,
    },
    /// Some, not all, of the expected text tokens were present.
    PartialText { node: NodeId, overlap: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedElement {
    pub element_id: String,
    pub attempts: Vec<LocatorAttempt>,
    pub near_misses: Vec<NearMiss>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Resolution {
    Resolved(ResolvedElement),
    Unresolved(UnresolvedElement),
}

impl Resolution {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Resolution::Resolved(r) => Some(r.node),
            Resolution::Unresolved(_) => None,
        }
    }

    pub fn state(&self) -> ResolverState {
        match self {
            Resolution::Resolved(_) => ResolverState::Resolved,
            Resolution::Unresolved(_) => ResolverState::Unresolved,
        }
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Find the live node for a stored record.
///
/// Primary locators are tried in stored order and the first one matching
/// anything wins (its first match in document order). Locators that fail to
/// parse are recorded and skipped. Only when every primary locator misses
/// does the resolver fall back to text, then attributes. The record is never
/// modified.
pub fn resolve<D: DocumentLike + ?Sized>(record: &StoredElementRecord, doc: &D) -> Resolution {
    let mut attempts = Vec::new();
    let mut state = ResolverState::Init;

    loop {
        debug!(element = %record.element_id, ?state, "resolver step");
        state = match state {
            ResolverState::Init => ResolverState::TryPrimary,

            ResolverState::TryPrimary => match try_primary(record, doc, &mut attempts) {
                Some((node, via, match_count)) => {
                    return Resolution::Resolved(ResolvedElement {
                        node,
                        via,
                        match_count,
                        attempts,
                    });
                }
                None => ResolverState::TryFallback,
            },

            ResolverState::TryFallback => match try_fallback(record, doc) {
                Some((node, via, match_count)) => {
                    debug!(element = %record.element_id, rule = via.rule(), "resolved by fallback");
                    return Resolution::Resolved(ResolvedElement {
                        node,
                        via,
                        match_count,
                        attempts,
                    });
                }
                None => ResolverState::Unresolved,
            },

            ResolverState::Resolved | ResolverState::Unresolved => {
                warn!(element = %record.element_id, "element could not be resolved");
                return Resolution::Unresolved(UnresolvedElement {
                    element_id: record.element_id.clone(),
                    attempts,
                    near_misses: near_misses(record, doc),
                });
            }
        };
    }
}

type Found = (NodeId, ResolvedVia, usize);

fn try_primary<D: DocumentLike + ?Sized>(
    record: &StoredElementRecord,
    doc: &D,
    attempts: &mut Vec<LocatorAttempt>,
) -> Option<Found> {
    for (index, stored) in record.primary_locators.iter().enumerate() {
        let locator = match Locator::parse(&stored.value) {
            Ok(locator) => locator,
            Err(e) => {
                warn!(element = %record.element_id, locator = %stored.value, error = %e, "skipping invalid locator");
                attempts.push(LocatorAttempt {
                    locator: stored.value.clone(),
                    outcome: AttemptOutcome::Invalid {
                        reason: e.to_string(),
                    },
                });
                continue;
            }
        };

        let matches = locator.evaluate(doc);
        match matches.first() {
            Some(first) => {
                attempts.push(LocatorAttempt {
                    locator: stored.value.clone(),
                    outcome: AttemptOutcome::Matched {
                        count: matches.len(),
                    },
                });
                if matches.len() > 1 {
                    debug!(locator = %stored.value, count = matches.len(), "ambiguous locator, taking first match");
                }
                let via = ResolvedVia::Locator {
                    index,
                    value: stored.value.clone(),
                    stability: stored.stability,
                };
                return Some((*first, via, matches.len()));
            }
            None => attempts.push(LocatorAttempt {
                locator: stored.value.clone(),
                outcome: AttemptOutcome::NoMatch,
            }),
        }
    }
    None
}

fn try_fallback<D: DocumentLike + ?Sized>(record: &StoredElementRecord, doc: &D) -> Option<Found> {
    let pool = tag_pool(record, doc);

    // (a) text fragment
    if let Some(fragment) = record
        .expected_text_fragment
        .as_deref()
        .map(collapse_whitespace)
        .filter(|f| !f.is_empty())
    {
        let mut matches: Vec<NodeId> = pool
            .iter()
            .copied()
            .filter(|n| doc.text_content(*n).contains(&fragment))
            .collect();
        if record.expected_tag.is_none() {
            matches = innermost(doc, &matches);
        }
        if let Some(first) = matches.first() {
            return Some((*first, ResolvedVia::TextFragment { fragment }, matches.len()));
        }
    }

    // (b) attributes: id, name, class, then the rest in name order
    for (name, value) in ordered_attributes(record) {
        let matches: Vec<NodeId> = pool
            .iter()
            .copied()
            .filter(|n| attribute_matches(doc, *n, name, value))
            .collect();
        if let Some(first) = matches.first() {
            let via = ResolvedVia::Attribute {
                name: name.to_string(),
                value: value.to_string(),
            };
            return Some((*first, via, matches.len()));
        }
    }

    None
}

fn tag_pool<D: DocumentLike + ?Sized>(record: &StoredElementRecord, doc: &D) -> Vec<NodeId> {
    match record.expected_tag.as_deref() {
        Some(tag) => doc.query_all_by_tag(tag),
        None => doc.all_nodes(),
    }
}

/// Drop every node that has another matching node inside it.
fn innermost<D: DocumentLike + ?Sized>(doc: &D, nodes: &[NodeId]) -> Vec<NodeId> {
    nodes
        .iter()
        .copied()
        .filter(|n| {
            !nodes
                .iter()
                .any(|other| other != n && doc.ancestors(*other).contains(n))
        })
        .collect()
}

fn ordered_attributes(record: &StoredElementRecord) -> Vec<(&str, &str)> {
    let attrs = &record.fallback_attributes;
    let mut ordered: Vec<(&str, &str)> = PRIORITY_ATTRIBUTES
        .iter()
        .filter_map(|name| attrs.get(*name).map(|v| (*name, v.as_str())))
        .collect();
    ordered.extend(
        attrs
            .iter()
            .filter(|(name, _)| !PRIORITY_ATTRIBUTES.contains(&name.as_str()))
            .map(|(name, value)| (name.as_str(), value.as_str())),
    );
    ordered
}

/// `class` with a single token checks membership; everything else is exact.
fn attribute_matches<D: DocumentLike + ?Sized>(doc: &D, node: NodeId, name: &str, value: &str) -> bool {
    if name == "class" && !value.trim().contains(char::is_whitespace) {
        return doc.class_tokens(node).contains(&value.trim());
    }
    doc.attribute(node, name) == Some(value)
}

fn near_misses<D: DocumentLike + ?Sized>(record: &StoredElementRecord, doc: &D) -> Vec<NearMiss> {
    let mut misses = Vec::new();
    let Some(expected_tag) = record.expected_tag.as_deref() else {
        return misses;
    };

    for (name, value) in ordered_attributes(record) {
        for node in doc.all_nodes() {
            if doc.tag(node) != expected_tag && attribute_matches(doc, node, name, value) {
                misses.push(NearMiss::AttributeOnOtherTag {
                    node,
                    attribute: name.to_string(),
                    value: value.to_string(),
                    tag: doc.tag(node).to_string(),
                });
            }
        }
    }

    if let Some(fragment) = record.expected_text_fragment.as_deref() {
        let tokens = intent_tokens(fragment);
        for node in doc.query_all_by_tag(expected_tag) {
            let overlap = token_overlap(&tokens, &doc.text_content(node));
            if overlap >= NEAR_MISS_OVERLAP && overlap < 1.0 {
                misses.push(NearMiss::PartialText { node, overlap });
            }
        }
    }

    misses.truncate(MAX_NEAR_MISSES);
    misses
}
