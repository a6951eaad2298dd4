use crate::content::dynamic::SeverityPolicy;
use crate::content::identifiers::{is_dynamic_identifier, is_generated_class};
use crate::dom::css::{is_plain_ident, quote_css};
use crate::dom::xpath::quote_xpath;
use crate::locator::locator_model::{ElementDescriptor, LocatorCandidate, LocatorKind, Stability};

/// Longest visible text still used as a text locator.
pub const MAX_LOCATOR_TEXT: usize = 50;

/// Attributes tried (in order) by the labelled-attribute rule.
const LABEL_ATTRIBUTES: &[(&str, &str)] = &[
    ("aria-label", "unique-aria-label"),
    ("placeholder", "unique-placeholder"),
    ("title", "unique-title"),
];

// ============================================================================
// Synthesizer
// ============================================================================

/// Produces ranked locator candidates for one element.
///
/// The cascade stops at the first rule that identifies the target uniquely
/// among `all_on_page`; rules after it never run. When no rule is unique,
/// whatever partial signals exist are returned at `Low` stability. An empty
/// result means the element is not locatable.
#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    pub severity: SeverityPolicy,
}

impl Synthesizer {
    pub fn new(severity: SeverityPolicy) -> Self {
        Self { severity }
    }

    pub fn synthesize(
        &self,
        target: &ElementDescriptor,
        all_on_page: &[ElementDescriptor],
    ) -> Vec<LocatorCandidate> {
        let page = PageView::new(target, all_on_page);
        let tag = target.tag.as_str();

        // 1. id
        if let Some(id) = target.id.as_deref().filter(|id| !is_dynamic_identifier(id)) {
            if page.unique(|d| d.id.as_deref() == Some(id)) {
                let value = if is_plain_ident(id) {
                    format!("#{}", id)
                } else {
                    format!("[id={}]", quote_css(id))
                };
                return vec![self.candidate(LocatorKind::AttributeCss, value, Stability::High, "unique-id", id)];
            }
        }

        // 2. test id
        if let Some(test_id) = target.test_id.as_deref() {
            let attr = target.test_id_attr();
            if page.unique(|d| d.test_id.as_deref() == Some(test_id) && d.test_id_attr() == attr) {
                let value = format!("[{}={}]", attr, quote_css(test_id));
                return vec![self.candidate(LocatorKind::AttributeCss, value, Stability::High, "unique-test-id", test_id)];
            }
        }

        // 3. name, scoped to tag
        if let Some(name) = target.name.as_deref().filter(|n| !is_dynamic_identifier(n)) {
            if page.unique(|d| d.tag == tag && d.name.as_deref() == Some(name)) {
                let value = format!("{}[name={}]", tag, quote_css(name));
                return vec![self.candidate(LocatorKind::AttributeCss, value, Stability::High, "unique-name", name)];
            }
        }

        // 4. aria-label / placeholder / title, scoped to tag
        for (attr, rule) in LABEL_ATTRIBUTES {
            if let Some(label) = target.attribute(attr) {
                if page.unique(|d| d.tag == tag && d.attribute(attr) == Some(label)) {
                    let value = format!("{}[{}={}]", tag, attr, quote_css(label));
                    return vec![self.candidate(LocatorKind::AttributeCss, value, Stability::High, rule, label)];
                }
            }
        }

        // 5. trailing href fragment for anchors
        if tag == "a" {
            if let Some(href) = target.attribute("href") {
                for fragment in href_fragments(href) {
                    let unique = page.unique(|d| {
                        d.tag == "a" && d.attribute("href").is_some_and(|h| h.ends_with(fragment))
                    });
                    if unique {
                        let value = format!("a[href$={}]", quote_css(fragment));
                        return vec![self.candidate(LocatorKind::AttributeCss, value, Stability::Medium, "unique-href-fragment", fragment)];
                    }
                }
            }
        }

        // 6. rare class token within the tag
        let mut tie_break: Option<(&str, usize)> = None;
        for token in target.classes.iter().map(String::as_str) {
            if is_generated_class(token) {
                continue;
            }
            let count = page.count(|d| d.tag == tag && d.classes.iter().any(|c| c == token));
            if count == page.expected {
                let value = class_selector(tag, token);
                return vec![self.candidate(LocatorKind::StructuralCss, value, Stability::Medium, "unique-class", token)];
            }
            if tie_break.is_none_or(|(_, best)| count < best) {
                tie_break = Some((token, count));
            }
        }

        // 7. ancestor anchor + tag index
        if let Some(anchor) = &target.anchor {
            if page.unique(|d| d.tag == tag && d.anchor.as_ref() == Some(anchor)) {
                if let Some(quoted) = quote_xpath(&anchor.value) {
                    let value = format!(
                        "(//*[@{}={}]//{})[{}]",
                        anchor.attribute, quoted, tag, anchor.index
                    );
                    return vec![self.candidate(LocatorKind::StructuralXpath, value, Stability::Medium, "ancestor-anchor", &anchor.value)];
                }
            }
        }

        // 8. short, non-dynamic text
        let mut partial_text = None;
        if let Some(text) = target.text.as_deref().filter(|t| self.usable_text(t)) {
            if let Some(quoted) = quote_xpath(text) {
                let text_xpath = format!("//{}[normalize-space(.)={}]", tag, quoted);

                if page.unique(|d| d.tag == tag && d.text.as_deref() == Some(text)) {
                    return vec![self.candidate(LocatorKind::TextXpath, text_xpath, Stability::Low, "unique-text", text)];
                }

                if let Some(scoped) = group_scoped_text(target, tag, &quoted) {
                    let group_key = target.group_context.as_ref().map(|g| g.key.as_str());
                    let unique = page.unique(|d| {
                        d.tag == tag
                            && d.text.as_deref() == Some(text)
                            && d.group_context.as_ref().map(|g| g.key.as_str()) == group_key
                    });
                    if unique {
                        return vec![self.candidate(LocatorKind::TextXpath, scoped, Stability::Low, "group-scoped-text", text)];
                    }
                }

                partial_text = Some((text_xpath, text));
            }
        }

        // 9. partial signals
        let mut partial = Vec::new();
        if let Some((token, _)) = tie_break {
            partial.push(self.candidate(LocatorKind::StructuralCss, class_selector(tag, token), Stability::Low, "partial-class", token));
        }
        if let Some(label) = target.aria_label() {
            let value = format!("{}[aria-label={}]", tag, quote_css(label));
            partial.push(self.candidate(LocatorKind::AttributeCss, value, Stability::Low, "partial-aria-label", label));
        }
        if let Some(role) = target.role() {
            let value = format!("{}[role={}]", tag, quote_css(role));
            partial.push(self.candidate(LocatorKind::AttributeCss, value, Stability::Low, "partial-role", role));
        }
        if let Some((value, text)) = partial_text {
            partial.push(self.candidate(LocatorKind::TextXpath, value, Stability::Low, "partial-text", text));
        }

        partial
    }

    /// Build a candidate, demoting it when its source value is dynamic.
    fn candidate(
        &self,
        kind: LocatorKind,
        value: String,
        stability: Stability,
        rule: &str,
        source: &str,
    ) -> LocatorCandidate {
        let severity = self.severity.grade(source);
        let (stability, rationale) = if severity.is_veto() {
            (
                stability.demote(),
                format!("{} (demoted: {:?} dynamic content)", rule, severity),
            )
        } else {
            (stability, rule.to_string())
        };

        LocatorCandidate {
            kind,
            value,
            stability,
            rationale,
        }
    }

    fn usable_text(&self, text: &str) -> bool {
        text.chars().count() <= MAX_LOCATOR_TEXT && !self.severity.grade(text).is_veto()
    }
}

/// Synthesize with the default severity policy.
pub fn synthesize(target: &ElementDescriptor, all_on_page: &[ElementDescriptor]) -> Vec<LocatorCandidate> {
    Synthesizer::default().synthesize(target, all_on_page)
}

// ============================================================================
// Helpers
// ============================================================================

/// Counts keys over the page. The target is expected once if it is part of
/// the page list, zero times otherwise; identical twins make a key ambiguous.
struct PageView<'a> {
    all: &'a [ElementDescriptor],
    expected: usize,
}

impl<'a> PageView<'a> {
    fn new(target: &ElementDescriptor, all: &'a [ElementDescriptor]) -> Self {
        let expected = usize::from(all.iter().any(|d| d == target));
        Self { all, expected }
    }

    fn count(&self, pred: impl Fn(&ElementDescriptor) -> bool) -> usize {
        self.all.iter().filter(|d| pred(d)).count()
    }

    fn unique(&self, pred: impl Fn(&ElementDescriptor) -> bool) -> bool {
        self.count(pred) == self.expected
    }
}

fn class_selector(tag: &str, token: &str) -> String {
    if is_plain_ident(token) {
        format!("{}.{}", tag, token)
    } else {
        format!("{}[class~={}]", tag, quote_css(token))
    }
}

/// Trailing `/`-delimited suffixes of an href, shortest first, never
/// reaching into the scheme or host.
fn href_fragments(href: &str) -> Vec<&str> {
    let href = href.trim();
    if href.is_empty() || href == "/" || href == "#" {
        return Vec::new();
    }

    let path_start = match href.find("://") {
        Some(scheme_end) => href[scheme_end + 3..]
            .find('/')
            .map(|i| scheme_end + 3 + i)
            .unwrap_or(href.len()),
        None => 0,
    };

    let mut fragments: Vec<&str> = href[path_start..]
        .match_indices('/')
        .map(|(i, _)| &href[path_start + i..])
        .filter(|f| f.len() > 1)
        .collect();
    fragments.reverse();

    if fragments.is_empty() && path_start == 0 {
        fragments.push(href);
    }
    fragments
}

fn group_scoped_text(target: &ElementDescriptor, tag: &str, quoted_text: &str) -> Option<String> {
    let group = target.group_context.as_ref()?;
    let container = group.container_tag.as_deref()?;
    let heading = group.heading_tag.as_deref()?;
    let label = quote_xpath(&group.label)?;
    Some(format!(
        "//{}[.//{}[normalize-space(.)={}]]//{}[normalize-space(.)={}]",
        container, heading, label, tag, quoted_text
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn href_fragments_shortest_first() {
        assert_eq!(
            href_fragments("https://shop.example.com/products/shoes"),
            vec!["/shoes", "/products/shoes"]
        );
        assert_eq!(href_fragments("/account/settings"), vec!["/settings", "/account/settings"]);
        assert_eq!(href_fragments("mailto:help@example.com"), vec!["mailto:help@example.com"]);
        assert!(href_fragments("/").is_empty());
        assert!(href_fragments("https://example.com").is_empty());
    }
}
