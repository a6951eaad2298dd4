use crate::content::dynamic::SeverityPolicy;
use crate::content::identifiers::{is_dynamic_identifier, is_generated_class};
use crate::locator::locator_model::{
    ElementDescriptor, LocatorCandidate, StoredElementRecord, StoredLocator,
};

/// Fallback-attribute names written into a record, in resolver priority.
pub const RECORD_ATTRIBUTES: &[&str] = &["aria-label", "placeholder", "title", "role", "type"];

/// Build the persisted form of an element from its descriptor and
/// synthesized candidates.
///
/// Primary locators keep the candidates' highest-first order. Dynamic ids,
/// names and class tokens are left out of the fallback attributes; the
/// expected text fragment is dropped when the text itself is dynamic.
pub fn build_record(
    element_id: &str,
    descriptor: &ElementDescriptor,
    candidates: &[LocatorCandidate],
    severity: &SeverityPolicy,
) -> StoredElementRecord {
    let mut ordered: Vec<&LocatorCandidate> = candidates.iter().collect();
    ordered.sort_by(|a, b| b.stability.cmp(&a.stability));

    let mut record = StoredElementRecord::new(element_id).with_expected_tag(&descriptor.tag);
    record.primary_locators = ordered.into_iter().map(StoredLocator::from).collect();

    if let Some(id) = descriptor.id.as_deref().filter(|v| !is_dynamic_identifier(v)) {
        record = record.with_fallback_attribute("id", id);
    }
    if let Some(name) = descriptor.name.as_deref().filter(|v| !is_dynamic_identifier(v)) {
        record = record.with_fallback_attribute("name", name);
    }
    if let Some(test_id) = descriptor.test_id.as_deref() {
        record = record.with_fallback_attribute(descriptor.test_id_attr(), test_id);
    }
    if let Some(class) = descriptor.classes.iter().find(|c| !is_generated_class(c)) {
        record = record.with_fallback_attribute("class", class);
    }
    for attr in RECORD_ATTRIBUTES {
        if let Some(value) = descriptor.attribute(attr) {
            record = record.with_fallback_attribute(attr, value);
        }
    }

    if let Some(text) = descriptor.text.as_deref() {
        if !severity.grade(text).is_veto() {
            record = record.with_expected_text(text);
        }
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::locator_model::{LocatorKind, Stability};

    fn candidate(value: &str, stability: Stability) -> LocatorCandidate {
        LocatorCandidate {
            kind: LocatorKind::AttributeCss,
            value: value.to_string(),
            stability,
            rationale: "test".to_string(),
        }
    }

    #[test]
    fn orders_locators_and_skips_dynamic_values() {
        let descriptor = ElementDescriptor::new("span")
            .with_id("price-1700000000123")
            .with_class("price")
            .with_text("$24.99");
        let candidates = vec![
            candidate("span.price", Stability::Low),
            candidate("//span[@data-x]", Stability::Medium),
        ];

        let record = build_record("price", &descriptor, &candidates, &SeverityPolicy::default());

        assert_eq!(record.version, 1);
        assert_eq!(record.primary_locators[0].value, "//span[@data-x]");
        assert_eq!(record.primary_locators[0].stability, Some(Stability::Medium));
        assert!(!record.fallback_attributes.contains_key("id"));
        assert_eq!(record.fallback_attributes.get("class").map(String::as_str), Some("price"));
        assert_eq!(record.expected_tag.as_deref(), Some("span"));
        assert_eq!(record.expected_text_fragment, None);
    }
}
