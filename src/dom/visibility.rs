use crate::dom::dom_model::{DocumentLike, NodeId};

/// Whether a node would be perceivable by a user.
///
/// A node is hidden when it or any ancestor is `display: none`, carries the
/// `hidden` attribute, or has zero opacity; when the nearest ancestor that
/// sets `visibility` says `hidden`/`collapse`; or when its own layout box is
/// empty. A node without a measured layout box is assumed to be rendered.
pub fn is_visible<D: DocumentLike + ?Sized>(doc: &D, node: NodeId) -> bool {
    if let Some(layout) = doc.layout(node) {
        if layout.is_empty() {
            return false;
        }
    }

    if doc.tag(node) == "input" && doc.attribute(node, "type") == Some("hidden") {
        return false;
    }

    let mut visibility_resolved = false;
    let chain = std::iter::once(node).chain(doc.ancestors(node));

    for n in chain {
        let style = doc.style(n);

        if style.display.as_deref() == Some("none") || doc.attribute(n, "hidden").is_some() {
            return false;
        }

        if style.opacity.is_some_and(|o| o <= 0.0) {
            return false;
        }

        // visibility is inherited: only the nearest explicit value counts
        if !visibility_resolved {
            if let Some(v) = style.visibility.as_deref() {
                if v == "hidden" || v == "collapse" {
                    return false;
                }
                visibility_resolved = true;
            }
        }
    }

    true
}
