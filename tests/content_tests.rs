use locator_healing::content::dynamic::{
    DynamicCategory, Severity, SeverityPolicy, classify, severity,
};
use locator_healing::content::identifiers::{is_dynamic_identifier, is_generated_class};

fn categories(text: &str) -> Vec<DynamicCategory> {
    classify(text).into_iter().map(|m| m.category).collect()
}

// ============================================================================
// Classifier
// ============================================================================

#[test]
fn recognizes_each_category() {
    let cases = [
        ("$1,299.00", DynamicCategory::Price),
        ("49.90 EUR", DynamicCategory::Price),
        ("2025-03-14", DynamicCategory::Date),
        ("Updated 3 hours ago", DynamicCategory::Date),
        ("Departs 12:45 PM", DynamicCategory::Time),
        ("-15% today only", DynamicCategory::Percentage),
        ("ts 1700000000123", DynamicCategory::Timestamp),
        ("Confirmation ABC123", DynamicCategory::BookingCode),
        ("Only 3 left", DynamicCategory::InventoryCounter),
        ("1,234 reviews", DynamicCategory::SocialCounter),
        ("Rated 4.5 out of 5", DynamicCategory::SocialCounter),
        ("Loading results", DynamicCategory::Status),
    ];

    for (text, expected) in cases {
        assert!(
            categories(text).contains(&expected),
            "{:?} not found in {:?}: {:?}",
            expected,
            text,
            categories(text)
        );
    }
}

#[test]
fn stable_labels_are_clean() {
    for text in ["Sign in", "Add to cart", "Continue", "Search products", "Help & FAQ"] {
        assert!(classify(text).is_empty(), "{} classified as {:?}", text, categories(text));
    }
}

#[test]
fn month_names_match_whole_words_only() {
    for text in ["Mar 3, 2025", "Sept. 12", "December 24th", "Due 3 March"] {
        assert_eq!(categories(text), vec![DynamicCategory::Date], "{}", text);
    }
    for text in ["Decrease 1", "Increase 1", "Junior 3 pack", "Add 2 Mars bars", "Octopus 8"] {
        assert!(classify(text).is_empty(), "{} classified as {:?}", text, categories(text));
    }
}

#[test]
fn results_follow_rule_order_then_position() {
    let matches = classify("Sale ends 12:30, was $40.00 now $30.00");
    let found: Vec<_> = matches.iter().map(|m| (m.category, m.matched.as_str())).collect();

    assert_eq!(
        found,
        vec![
            (DynamicCategory::Price, "$40.00"),
            (DynamicCategory::Price, "$30.00"),
            (DynamicCategory::Time, "12:30"),
        ]
    );
}

#[test]
fn spans_point_into_the_input() {
    let text = "Ships in 2 days, 5 left";
    for m in classify(text) {
        assert_eq!(&text[m.start..m.end], m.matched);
    }
}

// ============================================================================
// Severity
// ============================================================================

#[test]
fn default_severities() {
    assert_eq!(severity(&classify("$24.99")), Severity::High);
    assert_eq!(severity(&classify("Mar 3, 2025")), Severity::Medium);
    assert_eq!(severity(&classify("50% off")), Severity::Low);
    assert_eq!(severity(&classify("Checkout")), Severity::Low);
}

#[test]
fn highest_severity_wins() {
    // date (medium) and price (high) together
    assert_eq!(severity(&classify("2025-01-01 special $5")), Severity::High);
}

#[test]
fn veto_starts_at_medium() {
    assert!(!Severity::Low.is_veto());
    assert!(Severity::Medium.is_veto());
    assert!(Severity::High.is_veto());
}

#[test]
fn policy_overrides_thresholds() {
    let policy = SeverityPolicy {
        high: vec![DynamicCategory::Percentage],
        medium: vec![],
    };

    assert_eq!(policy.grade("50% off"), Severity::High);
    assert_eq!(policy.grade("$24.99"), Severity::Low);
}

#[test]
fn policy_sections_default_independently() {
    let policy: SeverityPolicy = serde_yaml::from_str("high: [percentage, status]").unwrap();

    assert_eq!(policy.category_severity(DynamicCategory::Status), Severity::High);
    assert_eq!(policy.category_severity(DynamicCategory::Date), Severity::Medium);
    assert_eq!(policy.category_severity(DynamicCategory::Price), Severity::Low);
}

// ============================================================================
// Identifiers
// ============================================================================

#[test]
fn readable_identifiers_are_stable() {
    for value in ["login-btn", "search", "main-nav", "checkout", "btn-primary", "user_email"] {
        assert!(!is_dynamic_identifier(value), "{} flagged as dynamic", value);
    }
}

#[test]
fn generated_identifiers_are_dynamic() {
    for value in [
        "",
        "ember1234",
        "price-1700000000123",
        "item_4821",
        "a1b2c3d4e5",
        "Button_root_a1B2c",
        "block__element",
        ":r5:",
    ] {
        assert!(is_dynamic_identifier(value), "{:?} not flagged", value);
    }
}

#[test]
fn framework_class_tokens_are_generated() {
    assert!(is_generated_class("css-1q2w3e"));
    assert!(is_generated_class("sc-bdVaJa"));
    assert!(is_generated_class("jsx-2345"));
    assert!(!is_generated_class("price"));
    assert!(!is_generated_class("card"));
}
