use locator_healing::content::dynamic::{DynamicCategory, SeverityPolicy};
use locator_healing::locator::locator_model::{
    AncestorAnchor, ElementDescriptor, GroupContext, LocatorKind, Stability,
};
use locator_healing::locator::synthesizer::{Synthesizer, synthesize};

// ============================================================================
// Helper builders
// ============================================================================

fn button(text: &str) -> ElementDescriptor {
    ElementDescriptor::new("button").with_interactive(true).with_text(text)
}

fn card_group(label: &str) -> GroupContext {
    GroupContext {
        label: label.to_string(),
        key: format!("group-{}", label.to_lowercase().replace(' ', "-")),
        container_tag: Some("li".to_string()),
        heading_tag: Some("h3".to_string()),
    }
}

fn values(candidates: &[locator_healing::locator::locator_model::LocatorCandidate]) -> Vec<&str> {
    candidates.iter().map(|c| c.value.as_str()).collect()
}

// ============================================================================
// Cascade order
// ============================================================================

#[test]
fn unique_id_wins_and_short_circuits() {
    let target = button("Login").with_id("login-btn").with_test_id("login");
    let page = vec![target.clone(), button("Cancel"), button("Help")];

    let candidates = synthesize(&target, &page);

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].value, "#login-btn");
    assert_eq!(candidates[0].kind, LocatorKind::AttributeCss);
    assert_eq!(candidates[0].stability, Stability::High);
    assert_eq!(candidates[0].rationale, "unique-id");
}

#[test]
fn id_with_special_characters_uses_attribute_form() {
    let target = button("Go").with_id("search:go");
    let candidates = synthesize(&target, &[target.clone()]);
    assert_eq!(values(&candidates), vec!["[id=\"search:go\"]"]);
}

#[test]
fn generated_id_falls_through_to_test_id() {
    let target = button("Checkout")
        .with_id("input-1700000000123")
        .with_test_id("checkout");
    let page = vec![target.clone(), button("Back")];

    let candidates = synthesize(&target, &page);

    assert_eq!(values(&candidates), vec!["[data-testid=\"checkout\"]"]);
    assert_eq!(candidates[0].rationale, "unique-test-id");
}

#[test]
fn test_id_attribute_is_preserved() {
    let mut target = button("Pay").with_test_id("pay-now");
    target.test_id_attribute = Some("data-qa".to_string());

    let candidates = synthesize(&target, &[target.clone()]);
    assert_eq!(values(&candidates), vec!["[data-qa=\"pay-now\"]"]);
}

#[test]
fn duplicate_id_falls_through_to_name() {
    let target = ElementDescriptor::new("input").with_id("field").with_name("email");
    let twin = ElementDescriptor::new("input").with_id("field").with_name("password");
    let page = vec![target.clone(), twin];

    let candidates = synthesize(&target, &page);

    assert_eq!(values(&candidates), vec!["input[name=\"email\"]"]);
    assert_eq!(candidates[0].stability, Stability::High);
}

#[test]
fn aria_label_is_scoped_to_tag() {
    let target = button("×").with_attribute("aria-label", "Close dialog");
    let link = ElementDescriptor::new("a").with_attribute("aria-label", "Close dialog");
    let page = vec![target.clone(), link];

    let candidates = synthesize(&target, &page);

    assert_eq!(values(&candidates), vec!["button[aria-label=\"Close dialog\"]"]);
    assert_eq!(candidates[0].rationale, "unique-aria-label");
}

#[test]
fn placeholder_used_when_aria_label_is_shared() {
    let target = ElementDescriptor::new("input")
        .with_attribute("aria-label", "Search")
        .with_attribute("placeholder", "Search products");
    let other = ElementDescriptor::new("input")
        .with_attribute("aria-label", "Search")
        .with_attribute("placeholder", "Search help");
    let page = vec![target.clone(), other];

    let candidates = synthesize(&target, &page);
    assert_eq!(values(&candidates), vec!["input[placeholder=\"Search products\"]"]);
}

#[test]
fn href_fragment_grows_until_unique() {
    let target = ElementDescriptor::new("a").with_attribute("href", "https://shop.example.com/products/shoes");
    let other = ElementDescriptor::new("a").with_attribute("href", "/sale/shoes");
    let page = vec![target.clone(), other];

    let candidates = synthesize(&target, &page);

    assert_eq!(values(&candidates), vec!["a[href$=\"/products/shoes\"]"]);
    assert_eq!(candidates[0].stability, Stability::Medium);
}

#[test]
fn rare_class_token_skips_generated_tokens() {
    let target = button("Buy").with_class("css-1q2w3e").with_class("primary");
    let other = button("Buy").with_class("css-1q2w3e").with_class("secondary");
    let page = vec![target.clone(), other];

    let candidates = synthesize(&target, &page);

    assert_eq!(values(&candidates), vec!["button.primary"]);
    assert_eq!(candidates[0].kind, LocatorKind::StructuralCss);
    assert_eq!(candidates[0].stability, Stability::Medium);
}

#[test]
fn ancestor_anchor_indexes_within_tag() {
    let anchor = |index| AncestorAnchor {
        attribute: "id".to_string(),
        value: "results".to_string(),
        index,
    };
    let target = button("Add").with_anchor(anchor(2));
    let page = vec![button("Add").with_anchor(anchor(1)), target.clone()];

    let candidates = synthesize(&target, &page);

    assert_eq!(values(&candidates), vec!["(//*[@id=\"results\"]//button)[2]"]);
    assert_eq!(candidates[0].kind, LocatorKind::StructuralXpath);
}

#[test]
fn unique_text_is_low_stability() {
    let target = button("Sign in");
    let page = vec![target.clone(), button("Register")];

    let candidates = synthesize(&target, &page);

    assert_eq!(values(&candidates), vec!["//button[normalize-space(.)=\"Sign in\"]"]);
    assert_eq!(candidates[0].kind, LocatorKind::TextXpath);
    assert_eq!(candidates[0].stability, Stability::Low);
}

#[test]
fn words_starting_with_a_month_stay_locatable() {
    let target = button("Decrease 1");
    let page = vec![target.clone(), button("Increase 1")];

    let candidates = synthesize(&target, &page);

    assert_eq!(values(&candidates), vec!["//button[normalize-space(.)=\"Decrease 1\"]"]);
    assert_eq!(candidates[0].stability, Stability::Low);
}

#[test]
fn shared_text_is_scoped_by_group() {
    let target = button("Add to cart").with_group(card_group("Road Shoe"));
    let page = vec![
        button("Add to cart").with_group(card_group("Trail Shoe")),
        target.clone(),
    ];

    let candidates = synthesize(&target, &page);

    assert_eq!(
        values(&candidates),
        vec!["//li[.//h3[normalize-space(.)=\"Road Shoe\"]]//button[normalize-space(.)=\"Add to cart\"]"]
    );
    assert_eq!(candidates[0].rationale, "group-scoped-text");
}

// ============================================================================
// Dynamic-content veto
// ============================================================================

#[test]
fn price_text_never_becomes_a_text_locator() {
    let target = ElementDescriptor::new("span").with_text("$24.99");
    let page = vec![target.clone(), ElementDescriptor::new("span").with_text("$9.99")];

    let candidates = synthesize(&target, &page);

    assert!(candidates.is_empty(), "price-only span should not be locatable: {:?}", candidates);
}

#[test]
fn flagged_source_value_is_demoted() {
    let target = button("Track").with_test_id("order-1700000000123");
    let candidates = synthesize(&target, &[target.clone()]);

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].stability, Stability::Medium);
    assert!(candidates[0].rationale.contains("demoted"));
}

#[test]
fn severity_policy_controls_the_veto() {
    // With status words promoted to high, "Online" text can no longer be used.
    let policy = SeverityPolicy {
        high: vec![DynamicCategory::Status],
        medium: vec![],
    };
    let target = button("Online");
    let page = vec![target.clone(), button("Offline help")];

    assert_eq!(synthesize(&target, &page).len(), 1);
    assert!(Synthesizer::new(policy).synthesize(&target, &page).is_empty());
}

// ============================================================================
// Fallback signals
// ============================================================================

#[test]
fn identical_twins_get_only_partial_signals() {
    let twin = button("Edit")
        .with_class("btn")
        .with_attribute("role", "button")
        .with_attribute("aria-label", "Edit row");
    let page = vec![twin.clone(), twin.clone()];

    let candidates = synthesize(&twin, &page);

    assert_eq!(
        values(&candidates),
        vec![
            "button.btn",
            "button[aria-label=\"Edit row\"]",
            "button[role=\"button\"]",
            "//button[normalize-space(.)=\"Edit\"]",
        ]
    );
    assert!(candidates.iter().all(|c| c.stability == Stability::Low));
    assert!(candidates.iter().all(|c| c.value != "button"));
}

#[test]
fn bare_element_is_not_locatable() {
    let target = ElementDescriptor::new("div");
    let page = vec![target.clone(), target.clone()];
    assert!(synthesize(&target, &page).is_empty());
}

#[test]
fn target_missing_from_page_list_counts_as_zero() {
    let target = button("Login").with_id("login-btn");
    let page = vec![button("Cancel")];
    assert_eq!(values(&synthesize(&target, &page)), vec!["#login-btn"]);
}
