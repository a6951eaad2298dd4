use crate::dom::dom_model::{DocumentLike, NodeId};
use crate::dom::visibility::is_visible;
use crate::locator::locator_model::{
    ElementDescriptor, STRUCTURAL_ATTRIBUTES, TEST_ID_ATTRIBUTES, bounded_text,
};
use crate::scan::context::ScanContext;

pub const INTERACTIVE_TAGS: &[&str] = &[
    "a", "button", "input", "select", "textarea", "summary", "option",
];

const INTERACTIVE_ROLES: &[&str] = &[
    "button", "link", "checkbox", "radio", "tab", "menuitem", "option", "switch", "textbox",
    "combobox", "searchbox",
];

/// Never rendered, never located.
const SKIPPED_TAGS: &[&str] = &[
    "html", "head", "meta", "script", "style", "link", "title", "noscript", "template", "base",
];

/// Attributes that make any element worth describing.
const IDENTIFYING_ATTRIBUTES: &[&str] = &["id", "name", "aria-label", "placeholder", "title"];

/// Text of these belongs to the user, not the page.
const USER_TEXT_TAGS: &[&str] = &["input", "textarea"];

pub fn is_interactive<D: DocumentLike + ?Sized>(doc: &D, node: NodeId) -> bool {
    INTERACTIVE_TAGS.contains(&doc.tag(node))
        || doc.attribute(node, "role").is_some_and(|r| INTERACTIVE_ROLES.contains(&r))
        || doc
            .attribute(node, "tabindex")
            .and_then(|t| t.trim().parse::<i32>().ok())
            .is_some_and(|t| t >= 0)
        || is_content_editable(doc, node)
}

/// Whether the scanner should emit a descriptor for this node.
pub fn is_scan_candidate<D: DocumentLike + ?Sized>(doc: &D, node: NodeId) -> bool {
    let tag = doc.tag(node);
    if SKIPPED_TAGS.contains(&tag) {
        return false;
    }

    INTERACTIVE_TAGS.contains(&tag)
        || doc.attribute(node, "role").is_some()
        || doc.attribute(node, "tabindex").is_some()
        || IDENTIFYING_ATTRIBUTES
            .iter()
            .chain(TEST_ID_ATTRIBUTES)
            .any(|attr| doc.attribute(node, attr).is_some_and(|v| !v.trim().is_empty()))
}

fn is_content_editable<D: DocumentLike + ?Sized>(doc: &D, node: NodeId) -> bool {
    doc.attribute(node, "contenteditable")
        .is_some_and(|v| !v.eq_ignore_ascii_case("false"))
}

/// Structural descriptor of one node. Form-field values and free text
/// beyond the bounded excerpt are never copied out of the document.
pub fn describe<D: DocumentLike + ?Sized>(doc: &D, node: NodeId, ctx: &mut ScanContext) -> ElementDescriptor {
    let tag = doc.tag(node);
    // values stay byte-exact: `=` selectors built from them compare raw
    let non_empty = |attr: &str| doc.attribute(node, attr).filter(|v| !v.trim().is_empty());

    let mut descriptor = ElementDescriptor::new(tag)
        .with_visible(is_visible(doc, node))
        .with_interactive(is_interactive(doc, node));

    descriptor.id = non_empty("id").map(str::to_string);
    descriptor.name = non_empty("name").map(str::to_string);

    if let Some((attr, value)) = TEST_ID_ATTRIBUTES
        .iter()
        .find_map(|&attr| non_empty(attr).map(|v| (attr, v)))
    {
        descriptor.test_id = Some(value.to_string());
        if attr != TEST_ID_ATTRIBUTES[0] {
            descriptor.test_id_attribute = Some(attr.to_string());
        }
    }

    descriptor.classes = doc.class_tokens(node).into_iter().map(str::to_string).collect();

    for &attr in STRUCTURAL_ATTRIBUTES {
        if let Some(value) = non_empty(attr) {
            descriptor = descriptor.with_attribute(attr, value);
        }
    }

    let user_text = USER_TEXT_TAGS.contains(&tag) || is_content_editable(doc, node);
    if !user_text {
        descriptor.text = bounded_text(&doc.text_content(node));
    }

    descriptor.group_context = ctx.group_for(doc, node);
    descriptor.anchor = ctx.anchor_for(doc, node);
    descriptor
}

/// Descriptors for every scan candidate in document order, without
/// synthesizing locators for them.
pub fn describe_page<D: DocumentLike + ?Sized>(doc: &D, ctx: &mut ScanContext) -> Vec<ElementDescriptor> {
    doc.all_nodes()
        .into_iter()
        .filter(|n| is_scan_candidate(doc, *n))
        .map(|n| describe(doc, n, ctx))
        .collect()
}
