use std::collections::HashMap;

use crate::content::identifiers::is_dynamic_identifier;
use crate::content::normalize::short_fingerprint;
use crate::dom::dom_model::{DocumentLike, NodeId};
use crate::locator::locator_model::{AncestorAnchor, GroupContext, TEST_ID_ATTRIBUTES, bounded_text};

const CONTAINER_TAGS: &[&str] = &["article", "li", "tr", "section"];
const CONTAINER_ROLES: &[&str] = &["region", "listitem", "row", "article", "group"];
const CONTAINER_CLASS_HINTS: &[&str] = &["card", "item", "row", "tile", "product", "result", "listing"];
const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];
const HEADING_CLASS_HINTS: &[&str] = &["title", "name", "heading"];

/// Per-snapshot memo for the scanner.
///
/// Owned by the caller and valid for exactly one document snapshot: node ids
/// from another document would hit stale entries. Create a fresh context
/// whenever the page changes.
#[derive(Debug, Default)]
pub struct ScanContext {
    groups: HashMap<NodeId, Option<GroupContext>>,
    identifier_counts: Option<HashMap<(String, String), usize>>,
    lookups: usize,
    hits: usize,
}

impl ScanContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// (lookups, memo hits) so far.
    pub fn stats(&self) -> (usize, usize) {
        (self.lookups, self.hits)
    }

    /// Group context of the nearest labelled repeated container above `node`.
    pub fn group_for<D: DocumentLike + ?Sized>(&mut self, doc: &D, node: NodeId) -> Option<GroupContext> {
        for ancestor in doc.ancestors(node) {
            if !is_container(doc, ancestor) {
                continue;
            }
            self.lookups += 1;
            let group = match self.groups.get(&ancestor) {
                Some(cached) => {
                    self.hits += 1;
                    cached.clone()
                }
                None => {
                    let computed = describe_group(doc, ancestor);
                    self.groups.insert(ancestor, computed.clone());
                    computed
                }
            };
            if group.is_some() {
                return group;
            }
        }
        None
    }

    /// Nearest ancestor carrying a page-unique stable identifier, with the
    /// 1-based position of `node` among that ancestor's same-tag descendants.
    pub fn anchor_for<D: DocumentLike + ?Sized>(&mut self, doc: &D, node: NodeId) -> Option<AncestorAnchor> {
        let tag = doc.tag(node).to_string();

        for ancestor in doc.ancestors(node) {
            let Some((attribute, value)) = self.unique_identifier(doc, ancestor) else {
                continue;
            };

            let index = doc
                .subtree(ancestor)
                .into_iter()
                .skip(1)
                .filter(|n| doc.tag(*n) == tag)
                .position(|n| n == node)?
                + 1;

            return Some(AncestorAnchor {
                attribute,
                value,
                index,
            });
        }
        None
    }

    fn unique_identifier<D: DocumentLike + ?Sized>(&mut self, doc: &D, node: NodeId) -> Option<(String, String)> {
        let counts = self
            .identifier_counts
            .get_or_insert_with(|| count_identifiers(doc));

        identifier_attributes()
            .filter_map(|attr| doc.attribute(node, attr).map(|v| (attr, v)))
            .filter(|(attr, value)| *attr != "id" || !is_dynamic_identifier(value))
            .find(|(attr, value)| {
                counts.get(&(attr.to_string(), value.to_string())).copied() == Some(1)
            })
            .map(|(attr, value)| (attr.to_string(), value.to_string()))
    }
}

fn identifier_attributes() -> impl Iterator<Item = &'static str> {
    std::iter::once("id").chain(TEST_ID_ATTRIBUTES.iter().copied())
}

fn count_identifiers<D: DocumentLike + ?Sized>(doc: &D) -> HashMap<(String, String), usize> {
    let mut counts = HashMap::new();
    for node in doc.all_nodes() {
        for attr in identifier_attributes() {
            if let Some(value) = doc.attribute(node, attr).filter(|v| !v.is_empty()) {
                *counts.entry((attr.to_string(), value.to_string())).or_insert(0) += 1;
            }
        }
    }
    counts
}

fn is_container<D: DocumentLike + ?Sized>(doc: &D, node: NodeId) -> bool {
    if CONTAINER_TAGS.contains(&doc.tag(node)) {
        return true;
    }
    if doc.attribute(node, "role").is_some_and(|r| CONTAINER_ROLES.contains(&r)) {
        return true;
    }
    doc.class_tokens(node).iter().any(|token| {
        let token = token.to_lowercase();
        CONTAINER_CLASS_HINTS.iter().any(|hint| token.contains(hint))
    })
}

fn is_heading<D: DocumentLike + ?Sized>(doc: &D, node: NodeId) -> bool {
    HEADING_TAGS.contains(&doc.tag(node))
        || doc.attribute(node, "role") == Some("heading")
        || doc.class_tokens(node).iter().any(|token| {
            let token = token.to_lowercase();
            HEADING_CLASS_HINTS.iter().any(|hint| token.contains(hint))
        })
}

fn describe_group<D: DocumentLike + ?Sized>(doc: &D, container: NodeId) -> Option<GroupContext> {
    let (heading, label) = doc
        .subtree(container)
        .into_iter()
        .skip(1)
        .filter(|n| is_heading(doc, *n))
        .find_map(|n| bounded_text(&doc.text_content(n)).map(|label| (n, label)))?;

    let key = identifier_attributes()
        .find_map(|attr| doc.attribute(container, attr))
        .filter(|v| !v.is_empty() && !is_dynamic_identifier(v))
        .map(str::to_string)
        .unwrap_or_else(|| format!("group-{}", short_fingerprint(&label)));

    Some(GroupContext {
        label,
        key,
        container_tag: Some(doc.tag(container).to_string()),
        heading_tag: Some(doc.tag(heading).to_string()),
    })
}
