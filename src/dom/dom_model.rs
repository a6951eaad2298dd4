use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// Snapshot wire model (what a DOM extractor produces)
// ============================================================================

/// Border box of a rendered node, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutBox {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// The subset of computed style that decides visibility.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComputedStyle {
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub opacity: Option<f64>,
}

/// One element in a serialized DOM snapshot.
///
/// `text` holds the element's own text nodes (not its descendants').
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomNode {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub layout: Option<LayoutBox>,
    #[serde(default)]
    pub style: ComputedStyle,
    #[serde(default)]
    pub children: Vec<DomNode>,
}

impl DomNode {
    pub fn element(tag: &str) -> Self {
        Self {
            tag: tag.to_lowercase(),
            attributes: BTreeMap::new(),
            text: None,
            layout: None,
            style: ComputedStyle::default(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_lowercase(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn layout(mut self, width: f64, height: f64) -> Self {
        self.layout = Some(LayoutBox::new(0.0, 0.0, width, height));
        self
    }

    pub fn display(mut self, display: &str) -> Self {
        self.style.display = Some(display.to_string());
        self
    }

    pub fn visibility(mut self, visibility: &str) -> Self {
        self.style.visibility = Some(visibility.to_string());
        self
    }

    pub fn opacity(mut self, opacity: f64) -> Self {
        self.style.opacity = Some(opacity);
        self
    }

    pub fn child(mut self, child: DomNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = DomNode>) -> Self {
        self.children.extend(children);
        self
    }
}

/// A full page snapshot as delivered by the live document provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomSnapshot {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: String,
    pub root: DomNode,
}

// ============================================================================
// Read-only tree view
// ============================================================================

/// Index of a node inside a document. Ids are assigned in document order,
/// so comparing two ids compares their document positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// The live document as seen by the scanner and resolver.
///
/// Implementors own the tree; this engine only reads it.
pub trait DocumentLike {
    fn root(&self) -> NodeId;
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn children(&self, node: NodeId) -> &[NodeId];
    fn tag(&self, node: NodeId) -> &str;
    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;
    fn own_text(&self, node: NodeId) -> Option<&str>;
    fn layout(&self, node: NodeId) -> Option<LayoutBox>;
    fn style(&self, node: NodeId) -> &ComputedStyle;

    /// Node and all of its descendants, in document order.
    fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            out.push(current);
            for child in self.children(current).iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Every node in document order.
    fn all_nodes(&self) -> Vec<NodeId> {
        self.subtree(self.root())
    }

    /// Ancestors from nearest to farthest.
    fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(node);
        while let Some(p) = current {
            out.push(p);
            current = self.parent(p);
        }
        out
    }

    fn query_all_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.all_nodes()
            .into_iter()
            .filter(|n| self.tag(*n).eq_ignore_ascii_case(tag))
            .collect()
    }

    fn query_by_attribute(&self, name: &str, value: &str) -> Vec<NodeId> {
        self.all_nodes()
            .into_iter()
            .filter(|n| self.attribute(*n, name) == Some(value))
            .collect()
    }

    /// Concatenated text of the subtree, whitespace-collapsed and trimmed.
    fn text_content(&self, node: NodeId) -> String {
        let mut parts = Vec::new();
        for n in self.subtree(node) {
            if let Some(text) = self.own_text(n) {
                parts.push(text);
            }
        }
        collapse_whitespace(&parts.join(" "))
    }

    fn class_tokens(&self, node: NodeId) -> Vec<&str> {
        self.attribute(node, "class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug)]
struct NodeData {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: Option<String>,
    layout: Option<LayoutBox>,
    style: ComputedStyle,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed, immutable document built from a `DomSnapshot`.
#[derive(Debug)]
pub struct Document {
    pub url: Option<String>,
    pub title: String,
    nodes: Vec<NodeData>,
}

impl Document {
    pub fn from_snapshot(snapshot: DomSnapshot) -> Self {
        let mut doc = Document::from_root(snapshot.root);
        doc.url = snapshot.url;
        doc.title = snapshot.title;
        doc
    }

    pub fn from_root(root: DomNode) -> Self {
        let mut nodes = Vec::new();
        // (node, parent) pairs; children pushed in reverse so ids follow document order
        let mut stack: Vec<(DomNode, Option<NodeId>)> = vec![(root, None)];

        while let Some((node, parent)) = stack.pop() {
            let id = NodeId(nodes.len());
            if let Some(p) = parent {
                let parent_data: &mut NodeData = &mut nodes[p.0];
                parent_data.children.push(id);
            }

            let DomNode {
                tag,
                attributes,
                text,
                layout,
                style,
                children,
            } = node;

            nodes.push(NodeData {
                tag: tag.to_lowercase(),
                attributes: attributes
                    .into_iter()
                    .map(|(k, v)| (k.to_lowercase(), v))
                    .collect(),
                text,
                layout,
                style,
                parent,
                children: Vec::new(),
            });

            for child in children.into_iter().rev() {
                stack.push((child, Some(id)));
            }
        }

        Document {
            url: None,
            title: String::new(),
            nodes,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let snapshot: DomSnapshot = serde_json::from_str(json)?;
        Ok(Document::from_snapshot(snapshot))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl DocumentLike for Document {
    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    fn tag(&self, node: NodeId) -> &str {
        self.nodes.get(node.0).map(|n| n.tag.as_str()).unwrap_or("")
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(node.0)
            .and_then(|n| n.attributes.get(name))
            .map(|v| v.as_str())
    }

    fn own_text(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0).and_then(|n| n.text.as_deref())
    }

    fn layout(&self, node: NodeId) -> Option<LayoutBox> {
        self.nodes.get(node.0).and_then(|n| n.layout)
    }

    fn style(&self, node: NodeId) -> &ComputedStyle {
        static DEFAULT_STYLE: ComputedStyle = ComputedStyle {
            display: None,
            visibility: None,
            opacity: None,
        };
        self.nodes
            .get(node.0)
            .map(|n| &n.style)
            .unwrap_or(&DEFAULT_STYLE)
    }
}
