use serde::Serialize;
use tracing::{info, warn};

use crate::dom::dom_model::DocumentLike;
use crate::locator::locator_model::StoredElementRecord;
use crate::locator::record::build_record;
use crate::locator::synthesizer::Synthesizer;
use crate::resolve::resolver::{Resolution, resolve};
use crate::scan::context::ScanContext;
use crate::scan::describe::{describe, is_scan_candidate};
use crate::scan::scanner::confirm_on_page;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealReport {
    pub resolution: Resolution,
    /// New record version, present when the stored locators have drifted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposal: Option<StoredElementRecord>,
}

/// Resolve `record` and, if that needed a fallback or a later locator,
/// propose a re-synthesized record at `version + 1`.
///
/// Proposed locators go through the same on-page check as scan results, so
/// a `High` or `Medium` entry always selects exactly the resolved node.
///
/// Nothing is persisted here; the caller decides what to do with the proposal.
pub fn heal<D: DocumentLike + ?Sized>(
    record: &StoredElementRecord,
    doc: &D,
    synthesizer: &Synthesizer,
    ctx: &mut ScanContext,
) -> HealReport {
    let resolution = resolve(record, doc);

    let Resolution::Resolved(resolved) = &resolution else {
        return HealReport {
            resolution,
            proposal: None,
        };
    };

    if resolved.used_first_locator() {
        return HealReport {
            resolution,
            proposal: None,
        };
    }

    let target = describe(doc, resolved.node, ctx);
    let mut page: Vec<_> = doc
        .all_nodes()
        .into_iter()
        .filter(|n| *n == resolved.node || is_scan_candidate(doc, *n))
        .map(|n| describe(doc, n, ctx))
        .collect();
    if !page.contains(&target) {
        page.push(target.clone());
    }

    let mut candidates = synthesizer.synthesize(&target, &page);
    confirm_on_page(doc, resolved.node, &mut candidates);
    if candidates.is_empty() {
        warn!(element = %record.element_id, "resolved node has no locatable signal, keeping record");
        return HealReport {
            resolution,
            proposal: None,
        };
    }

    let mut proposal = build_record(&record.element_id, &target, &candidates, &synthesizer.severity);
    proposal.version = record.version + 1;

    info!(
        element = %record.element_id,
        from_version = record.version,
        to_version = proposal.version,
        rule = resolved.via.rule(),
        "proposing healed record"
    );

    HealReport {
        resolution,
        proposal: Some(proposal),
    }
}
