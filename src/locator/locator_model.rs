use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dom::dom_model::collapse_whitespace;

/// Attributes an `ElementDescriptor` may carry. Everything else (values,
/// data attributes, inline handlers) stays in the page.
pub const STRUCTURAL_ATTRIBUTES: &[&str] =
    &["role", "type", "href", "placeholder", "title", "aria-label"];

/// Test-identifier attributes, in lookup priority.
pub const TEST_ID_ATTRIBUTES: &[&str] =
    &["data-testid", "data-test-id", "data-test", "data-qa", "data-cy"];

/// Upper bound on the visible-text excerpt, in characters.
pub const MAX_TEXT_LEN: usize = 80;

// ============================================================================
// Element descriptor
// ============================================================================

/// Enclosing repeated region (card, row, list item) of an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupContext {
    pub label: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_tag: Option<String>,
}

/// Nearest ancestor with a page-unique identifier, plus this element's
/// 1-based index among that ancestor's same-tag descendants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AncestorAnchor {
    pub attribute: String,
    pub value: String,
    pub index: usize,
}

/// Structural snapshot of one node at observation time.
///
/// Never carries form-field values; `text` is a bounded excerpt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDescriptor {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_id_attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub interactive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_context: Option<GroupContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<AncestorAnchor>,
}

impl ElementDescriptor {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_lowercase(),
            id: None,
            test_id: None,
            test_id_attribute: None,
            name: None,
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            text: None,
            visible: true,
            interactive: false,
            group_context: None,
            anchor: None,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_test_id(mut self, value: &str) -> Self {
        self.test_id = Some(value.to_string());
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    /// Non-structural attributes are silently dropped.
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        let name = name.to_lowercase();
        if STRUCTURAL_ATTRIBUTES.contains(&name.as_str()) {
            self.attributes.insert(name, value.to_string());
        }
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = bounded_text(text);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn with_group(mut self, group: GroupContext) -> Self {
        self.group_context = Some(group);
        self
    }

    pub fn with_anchor(mut self, anchor: AncestorAnchor) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// Re-apply the privacy bounds to a descriptor received from outside
    /// (deserialized input may carry anything).
    pub fn sanitized(mut self) -> Self {
        self.tag = self.tag.to_lowercase();
        self.attributes
            .retain(|k, _| STRUCTURAL_ATTRIBUTES.contains(&k.as_str()));
        self.text = self.text.as_deref().and_then(bounded_text);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn aria_label(&self) -> Option<&str> {
        self.attribute("aria-label")
    }

    pub fn role(&self) -> Option<&str> {
        self.attribute("role")
    }

    pub fn test_id_attr(&self) -> &str {
        self.test_id_attribute.as_deref().unwrap_or(TEST_ID_ATTRIBUTES[0])
    }

    /// aria-label → title → placeholder → text.
    pub fn accessible_name(&self) -> Option<&str> {
        self.aria_label()
            .or_else(|| self.attribute("title"))
            .or_else(|| self.attribute("placeholder"))
            .or(self.text.as_deref())
    }
}

/// Collapse whitespace and cap at `MAX_TEXT_LEN` characters.
pub fn bounded_text(raw: &str) -> Option<String> {
    let collapsed = collapse_whitespace(raw);
    if collapsed.is_empty() {
        return None;
    }
    let bounded: String = collapsed.chars().take(MAX_TEXT_LEN).collect();
    Some(bounded.trim_end().to_string())
}

// ============================================================================
// Locator candidates
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocatorKind {
    StructuralCss,
    StructuralXpath,
    TextXpath,
    AttributeCss,
}

impl LocatorKind {
    pub fn name(&self) -> &'static str {
        match self {
            LocatorKind::StructuralCss => "structural-css",
            LocatorKind::StructuralXpath => "structural-xpath",
            LocatorKind::TextXpath => "text-xpath",
            LocatorKind::AttributeCss => "attribute-css",
        }
    }
}

/// Ordinal confidence that a locator keeps matching the same element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stability {
    Low,
    Medium,
    High,
}

impl Stability {
    /// One tier down; `Low` stays `Low`.
    pub fn demote(self) -> Stability {
        match self {
            Stability::High => Stability::Medium,
            Stability::Medium | Stability::Low => Stability::Low,
        }
    }

    /// Tier for a backend confidence score in `[0, 1]`.
    pub fn from_score(score: f64) -> Stability {
        if score >= 0.9 {
            Stability::High
        } else if score >= 0.6 {
            Stability::Medium
        } else {
            Stability::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatorCandidate {
    pub kind: LocatorKind,
    pub value: String,
    pub stability: Stability,
    pub rationale: String,
}

// ============================================================================
// Stored element record
// ============================================================================

/// A primary locator as persisted. Accepts either a bare string or
/// `{ "value": ..., "stability": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredLocatorRepr")]
pub struct StoredLocator {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability: Option<Stability>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredLocatorRepr {
    Bare(String),
    Full {
        value: String,
        #[serde(default)]
        stability: Option<Stability>,
    },
}

impl From<StoredLocatorRepr> for StoredLocator {
    fn from(repr: StoredLocatorRepr) -> Self {
        match repr {
            StoredLocatorRepr::Bare(value) => StoredLocator {
                value,
                stability: None,
            },
            StoredLocatorRepr::Full { value, stability } => StoredLocator { value, stability },
        }
    }
}

impl StoredLocator {
    pub fn bare(value: &str) -> Self {
        Self {
            value: value.to_string(),
            stability: None,
        }
    }
}

impl From<&LocatorCandidate> for StoredLocator {
    fn from(candidate: &LocatorCandidate) -> Self {
        Self {
            value: candidate.value.clone(),
            stability: Some(candidate.stability),
        }
    }
}

/// Durable, versioned form of an element handed to the resolver later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredElementRecord {
    pub element_id: String,
    #[serde(default = "first_version")]
    pub version: u32,
    pub primary_locators: Vec<StoredLocator>,
    #[serde(default)]
    pub fallback_attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_text_fragment: Option<String>,
}

fn first_version() -> u32 {
    1
}

impl StoredElementRecord {
    pub fn new(element_id: &str) -> Self {
        Self {
            element_id: element_id.to_string(),
            version: 1,
            primary_locators: Vec::new(),
            fallback_attributes: BTreeMap::new(),
            expected_tag: None,
            expected_text_fragment: None,
        }
    }

    pub fn with_locator(mut self, value: &str) -> Self {
        self.primary_locators.push(StoredLocator::bare(value));
        self
    }

    pub fn with_fallback_attribute(mut self, name: &str, value: &str) -> Self {
        self.fallback_attributes
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_expected_tag(mut self, tag: &str) -> Self {
        self.expected_tag = Some(tag.to_lowercase());
        self
    }

    pub fn with_expected_text(mut self, fragment: &str) -> Self {
        self.expected_text_fragment = Some(fragment.to_string());
        self
    }
}
