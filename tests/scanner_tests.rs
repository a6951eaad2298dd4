use locator_healing::dom::dom_model::{Document, DomNode};
use locator_healing::dom::query::query;
use locator_healing::locator::locator_model::Stability;
use locator_healing::scan::context::ScanContext;
use locator_healing::scan::describe::describe_page;
use locator_healing::scan::scanner::{RankSignal, Scanner, scan};

use crate::common::{catalog_page, login_page, nodes_with_text};

mod common;

// ============================================================================
// Ranking
// ============================================================================

#[test]
fn login_button_ranks_first() {
    let doc = login_page("btn btn-primary");
    let groups = scan(&doc, 300);

    assert_eq!(groups.len(), 10);
    assert_eq!(groups[0].descriptor.id.as_deref(), Some("login-btn"));
    assert!(groups[0].score > groups[1].score);
    assert!(groups[0].signals.contains(&RankSignal::Id));
    assert_eq!(groups[0].accessible_name.as_deref(), Some("Login"));
}

#[test]
fn login_button_gets_high_id_locator() {
    let doc = login_page("btn btn-primary");
    let groups = scan(&doc, 300);

    let login = &groups[0].candidates;
    assert_eq!(login.len(), 1);
    assert_eq!(login[0].value, "#login-btn");
    assert_eq!(login[0].stability, Stability::High);
}

#[test]
fn equal_scores_keep_document_order() {
    let doc = login_page("btn");
    let groups = scan(&doc, 300);

    let texts: Vec<_> = groups[1..]
        .iter()
        .map(|g| g.descriptor.text.clone().unwrap_or_default())
        .collect();
    let expected: Vec<_> = (1..=9).map(|i| format!("Action {}", i)).collect();
    assert_eq!(texts, expected);
}

#[test]
fn truncates_to_max() {
    let doc = login_page("btn");
    let groups = scan(&doc, 3);
    assert_eq!(groups.len(), 3);
    // synthesis saw all ten buttons, so the survivors still carry text locators
    assert!(groups[1].candidates[0].value.contains("Action 1"));
}

// ============================================================================
// Uniqueness invariant
// ============================================================================

#[test]
fn high_and_medium_candidates_match_exactly_their_node() {
    let doc = Document::from_root(
        DomNode::element("body").children([
            DomNode::element("nav").attr("id", "main-nav").children([
                DomNode::element("a").attr("href", "/home").text("Home"),
                DomNode::element("a").attr("href", "/account/orders").text("Orders"),
            ]),
            DomNode::element("input").attr("name", "q").attr("placeholder", "Search"),
            DomNode::element("button").attr("class", "promo").attr("title", "Deals"),
            // a non-candidate div wearing the same class as the promo button
            DomNode::element("div").attr("class", "promo"),
            DomNode::element("button").attr("data-testid", "cart").text("Cart (2)"),
        ]),
    );

    let groups = scan(&doc, 300);
    assert!(!groups.is_empty());

    for group in &groups {
        for candidate in &group.candidates {
            if candidate.stability >= Stability::Medium {
                let matches = query(&doc, &candidate.value).unwrap();
                assert_eq!(matches, vec![group.node], "{} is not unique", candidate.value);
            }
        }
    }
}

#[test]
fn class_shared_with_skipped_node_is_demoted() {
    let doc = Document::from_root(DomNode::element("body").children([
        DomNode::element("span").attr("role", "button").attr("class", "chip"),
        DomNode::element("span").attr("class", "chip"),
    ]));

    let groups = scan(&doc, 300);
    let chip = groups
        .iter()
        .find(|g| g.descriptor.role() == Some("button"))
        .unwrap();

    assert_eq!(chip.candidates[0].value, "span.chip");
    assert_eq!(chip.candidates[0].stability, Stability::Low);
    assert!(chip.candidates[0].rationale.contains("not unique on page"));
}

// ============================================================================
// Group context
// ============================================================================

#[test]
fn repeated_cards_get_group_scoped_locators() {
    let doc = catalog_page();
    let mut ctx = ScanContext::new();
    let groups = Scanner::default().scan(&doc, &mut ctx);

    let buttons = nodes_with_text(&doc, "button", "Add to cart");
    assert_eq!(buttons.len(), 3);

    for button in buttons {
        let group = groups.iter().find(|g| g.node == button).unwrap();
        assert!(group.signals.contains(&RankSignal::GroupLabel));
        assert_eq!(group.candidates[0].rationale, "group-scoped-text");

        let matches = query(&doc, &group.candidates[0].value).unwrap();
        assert_eq!(matches, vec![button]);
    }

    let (lookups, hits) = ctx.stats();
    assert!(lookups >= 3);
    assert_eq!(hits, 0);
}

// ============================================================================
// Descriptor-only pass
// ============================================================================

#[test]
fn describe_page_keeps_document_order() {
    let doc = Document::from_root(
        DomNode::element("form")
            .child(DomNode::element("input").attr("name", "q"))
            .child(DomNode::element("span").attr("title", "Help").text("?"))
            .child(DomNode::element("button").text("Go")),
    );
    let page = describe_page(&doc, &mut ScanContext::new());
    let groups = scan(&doc, usize::MAX);

    let tags: Vec<_> = page.iter().map(|d| d.tag.as_str()).collect();
    assert_eq!(tags, vec!["input", "span", "button"]);
    assert_eq!(groups[0].descriptor.tag, "button");

    assert_eq!(page.len(), groups.len());
    for group in &groups {
        assert!(page.contains(&group.descriptor), "{:?} missing", group.descriptor);
    }
}
