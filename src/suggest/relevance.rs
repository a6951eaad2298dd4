use std::collections::BTreeSet;

use crate::content::identifiers::is_dynamic_identifier;
use crate::content::normalize::{intent_tokens, token_overlap};
use crate::locator::locator_model::ElementDescriptor;
use crate::scan::describe::INTERACTIVE_TAGS;

const TEST_ID_WEIGHT: f64 = 3.0;
const ID_WEIGHT: f64 = 2.0;
const NAME_WEIGHT: f64 = 1.0;
const VISIBLE_WEIGHT: f64 = 1.0;
const INTENT_WEIGHT: f64 = 5.0;

/// Whether a descriptor is worth sending to the scorer at all: anything
/// interactive, or anything carrying an identifier or structural attribute
/// a locator could be built from.
pub fn is_plausibly_interactive(descriptor: &ElementDescriptor) -> bool {
    let present = |v: &Option<String>| v.as_deref().is_some_and(|v| !v.trim().is_empty());

    descriptor.interactive
        || INTERACTIVE_TAGS.contains(&descriptor.tag.as_str())
        || present(&descriptor.id)
        || present(&descriptor.name)
        || present(&descriptor.test_id)
        || descriptor.attributes.values().any(|v| !v.trim().is_empty())
}

fn tag_weight(tag: &str) -> f64 {
    match tag {
        "button" => 2.0,
        "a" | "input" | "select" | "textarea" => 1.5,
        _ => 0.5,
    }
}

/// Text the intent is matched against: accessible name plus identifiers.
pub fn searchable_text(descriptor: &ElementDescriptor) -> String {
    let mut parts: Vec<&str> = Vec::new();
    parts.extend(descriptor.accessible_name());
    parts.extend(descriptor.text.as_deref());
    parts.extend(descriptor.id.as_deref());
    parts.extend(descriptor.test_id.as_deref());
    parts.extend(descriptor.name.as_deref());
    parts.join(" ")
}

pub fn relevance(descriptor: &ElementDescriptor, intent: &BTreeSet<String>) -> f64 {
    let mut score = tag_weight(&descriptor.tag);
    if descriptor.test_id.is_some() {
        score += TEST_ID_WEIGHT;
    }
    if descriptor.id.as_deref().is_some_and(|id| !is_dynamic_identifier(id)) {
        score += ID_WEIGHT;
    }
    if descriptor.name.is_some() {
        score += NAME_WEIGHT;
    }
    if descriptor.visible {
        score += VISIBLE_WEIGHT;
    }
    score + INTENT_WEIGHT * token_overlap(intent, &searchable_text(descriptor))
}

/// Prefilter, rank by relevance (stable on ties) and cap at `max`.
pub fn rank(intent: &str, descriptors: &[ElementDescriptor], max: usize) -> Vec<ElementDescriptor> {
    let tokens = intent_tokens(intent);
    let mut scored: Vec<(f64, &ElementDescriptor)> = descriptors
        .iter()
        .filter(|d| is_plausibly_interactive(d))
        .map(|d| (relevance(d, &tokens), d))
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().take(max).map(|(_, d)| d.clone()).collect()
}

/// Split into consecutive shards of at most `size`.
pub fn partition(ranked: Vec<ElementDescriptor>, size: usize) -> Vec<Vec<ElementDescriptor>> {
    ranked
        .chunks(size.max(1))
        .map(<[ElementDescriptor]>::to_vec)
        .collect()
}
