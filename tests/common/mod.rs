#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use locator_healing::dom::dom_model::{DocumentLike, Document, DomNode, NodeId};
use locator_healing::error::BackendError;
use locator_healing::locator::locator_model::ElementDescriptor;
use locator_healing::suggest::backend::ScoringBackend;
use locator_healing::suggest::suggest_model::{ScoredCandidate, ScoringRequest, ScoringResponse};

// ============================================================================
// Document fixtures
// ============================================================================

/// A login form plus nine anonymous buttons. `login_classes` lets a test
/// simulate a restyle of the login button.
pub fn login_page(login_classes: &str) -> Document {
    let others = (1..=9).map(|i| {
        DomNode::element("button")
            .attr("class", "btn")
            .text(&format!("Action {}", i))
    });

    Document::from_root(
        DomNode::element("body")
            .child(
                DomNode::element("form").child(
                    DomNode::element("button")
                        .attr("id", "login-btn")
                        .attr("class", login_classes)
                        .text("Login"),
                ),
            )
            .child(DomNode::element("div").children(others)),
    )
}

/// Three product cards with identical "Add to cart" buttons.
pub fn catalog_page() -> Document {
    let card = |title: &str, price: &str| {
        DomNode::element("li")
            .child(DomNode::element("h3").text(title))
            .child(DomNode::element("span").attr("class", "price").text(price))
            .child(DomNode::element("button").text("Add to cart"))
    };

    Document::from_root(
        DomNode::element("main").child(DomNode::element("ul").children([
            card("Trail Shoe", "$89.00"),
            card("Road Shoe", "$24.99"),
            card("Court Shoe", "$54.50"),
        ])),
    )
}

pub fn node_with_attr(doc: &Document, name: &str, value: &str) -> NodeId {
    doc.query_by_attribute(name, value)[0]
}

pub fn nodes_with_text(doc: &Document, tag: &str, text: &str) -> Vec<NodeId> {
    doc.query_all_by_tag(tag)
        .into_iter()
        .filter(|n| doc.text_content(*n) == text)
        .collect()
}

// ============================================================================
// Descriptor fixtures
// ============================================================================

pub fn button_descriptors(count: usize) -> Vec<ElementDescriptor> {
    (0..count)
        .map(|i| {
            ElementDescriptor::new("button")
                .with_interactive(true)
                .with_text(&format!("Action {}", i))
        })
        .collect()
}

// ============================================================================
// Scripted scoring backend
// ============================================================================

pub enum Script {
    Respond { delay_ms: u64, response: ScoringResponse },
    Fail,
    Hang,
}

/// Scoring backend whose behaviour per shard number is scripted. Unscripted
/// shards answer immediately with an empty response.
#[derive(Default)]
pub struct ScriptedBackend {
    scripts: HashMap<usize, Script>,
    pub dispatched: Mutex<Vec<usize>>,
    in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, shard: usize, script: Script) -> Self {
        self.scripts.insert(shard, script);
        self
    }

    pub fn dispatched(&self) -> Vec<usize> {
        let mut shards = self.dispatched.lock().unwrap().clone();
        shards.sort();
        shards
    }

    pub fn peak(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScoringBackend for ScriptedBackend {
    async fn score(&self, request: ScoringRequest) -> Result<ScoringResponse, BackendError> {
        self.dispatched.lock().unwrap().push(request.shard);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let result = match self.scripts.get(&request.shard) {
            Some(Script::Respond { delay_ms, response }) => {
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                Ok(response.clone())
            }
            Some(Script::Fail) => Err(BackendError::Status { status: 503 }),
            Some(Script::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(ScoringResponse::default())
            }
            None => Ok(ScoringResponse::default()),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

pub fn respond(delay_ms: u64, candidates: Vec<ScoredCandidate>) -> Script {
    Script::Respond {
        delay_ms,
        response: ScoringResponse {
            best: None,
            candidates: Some(candidates),
        },
    }
}

pub fn respond_best(delay_ms: u64, best: ScoredCandidate) -> Script {
    Script::Respond {
        delay_ms,
        response: ScoringResponse {
            best: Some(best),
            candidates: None,
        },
    }
}
