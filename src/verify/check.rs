use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dom::dom_model::DocumentLike;
use crate::dom::visibility::is_visible;
use crate::locator::locator_model::StoredElementRecord;
use crate::report::report_model::VerifyReport;
use crate::resolve::resolver::{Resolution, resolve};

/// A check file: named list of checks over stored elements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckSuite {
    pub name: String,
    pub checks: Vec<ElementCheck>,
}

/// A single check against a resolved element.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementCheck {
    /// The element resolves to a live node
    Exists { element: String },

    /// The element resolves and is visible
    Visible { element: String },

    /// The resolved node's text contains the expected string
    TextContains { element: String, expected: String },

    /// An attribute of the resolved node equals the expected value
    AttributeEquals {
        element: String,
        attribute: String,
        expected: String,
    },

    /// The winning resolution rule matched this many nodes
    Count { element: String, expected: usize },
}

impl ElementCheck {
    pub fn element(&self) -> &str {
        match self {
            ElementCheck::Exists { element }
            | ElementCheck::Visible { element }
            | ElementCheck::TextContains { element, .. }
            | ElementCheck::AttributeEquals { element, .. }
            | ElementCheck::Count { element, .. } => element,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ElementCheck::Exists { .. } => "Exists",
            ElementCheck::Visible { .. } => "Visible",
            ElementCheck::TextContains { .. } => "TextContains",
            ElementCheck::AttributeEquals { .. } => "AttributeEquals",
            ElementCheck::Count { .. } => "Count",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckResult {
    pub check: ElementCheck,
    pub passed: bool,
    /// Actual value found (for debugging failed checks)
    pub actual: Option<String>,
    pub message: Option<String>,
}

impl CheckResult {
    fn new(check: &ElementCheck, passed: bool, actual: Option<String>, failure: impl FnOnce() -> String) -> Self {
        Self {
            check: check.clone(),
            passed,
            actual,
            message: if passed { None } else { Some(failure()) },
        }
    }
}

/// Evaluate every check of `suite`; each element is resolved once.
pub fn run_checks<D: DocumentLike + ?Sized>(
    suite: &CheckSuite,
    records: &[StoredElementRecord],
    doc: &D,
) -> VerifyReport {
    let by_id: HashMap<&str, &StoredElementRecord> =
        records.iter().map(|r| (r.element_id.as_str(), r)).collect();
    let mut resolutions: HashMap<&str, Resolution> = HashMap::new();

    let results = suite
        .checks
        .iter()
        .map(|check| {
            let Some(record) = by_id.get(check.element()) else {
                return CheckResult::new(check, false, None, || {
                    format!("no stored record for '{}'", check.element())
                });
            };
            let resolution = resolutions
                .entry(record.element_id.as_str())
                .or_insert_with(|| resolve(record, doc));
            evaluate_one(check, resolution, doc)
        })
        .collect();

    VerifyReport::from_results(&suite.name, results)
}

fn evaluate_one<D: DocumentLike + ?Sized>(check: &ElementCheck, resolution: &Resolution, doc: &D) -> CheckResult {
    let node = resolution.node();
    let unresolved = || {
        CheckResult::new(check, false, None, || {
            format!("element '{}' could not be resolved", check.element())
        })
    };

    match check {
        ElementCheck::Count { expected, .. } => {
            let actual = match resolution {
                Resolution::Resolved(r) => r.match_count,
                Resolution::Unresolved(_) => 0,
            };
            CheckResult::new(check, actual == *expected, Some(actual.to_string()), || {
                format!("expected {} matches, found {}", expected, actual)
            })
        }

        ElementCheck::Exists { .. } => match node {
            Some(node) => CheckResult::new(check, true, Some(doc.tag(node).to_string()), String::new),
            None => unresolved(),
        },

        ElementCheck::Visible { .. } => {
            let Some(node) = node else { return unresolved() };
            let visible = is_visible(doc, node);
            CheckResult::new(check, visible, Some(visible.to_string()), || "element is hidden".to_string())
        }

        ElementCheck::TextContains { expected, .. } => {
            let Some(node) = node else { return unresolved() };
            let text = doc.text_content(node);
            let passed = text.contains(expected.as_str());
            CheckResult::new(check, passed, Some(text), || format!("text does not contain '{}'", expected))
        }

        ElementCheck::AttributeEquals {
            attribute,
            expected,
            ..
        } => {
            let Some(node) = node else { return unresolved() };
            let actual = doc.attribute(node, attribute).map(str::to_string);
            let passed = actual.as_deref() == Some(expected.as_str());
            CheckResult::new(check, passed, actual, || {
                format!("attribute '{}' is not '{}'", attribute, expected)
            })
        }
    }
}
