use crate::dom::css::{SelectorList, parse_css, select};
use crate::dom::dom_model::{DocumentLike, NodeId};
use crate::dom::xpath::{XPathExpr, evaluate, parse_xpath};
use crate::error::LocatorError;

/// A parsed locator expression, ready to evaluate against any document.
#[derive(Debug, Clone, PartialEq)]
pub enum Locator {
    Css(SelectorList),
    XPath(XPathExpr),
}

impl Locator {
    /// Parse a locator string.
    ///
    /// `css=` and `xpath=` prefixes force the dialect; otherwise anything
    /// starting with `/` or `(` is XPath and everything else is CSS.
    pub fn parse(expression: &str) -> Result<Locator, LocatorError> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(LocatorError::Empty);
        }

        if let Some(rest) = trimmed.strip_prefix("xpath=") {
            return Ok(Locator::XPath(parse_xpath(rest)?));
        }
        if let Some(rest) = trimmed.strip_prefix("css=") {
            return Ok(Locator::Css(parse_css(rest)?));
        }

        if trimmed.starts_with('/') || trimmed.starts_with('(') {
            Ok(Locator::XPath(parse_xpath(trimmed)?))
        } else {
            Ok(Locator::Css(parse_css(trimmed)?))
        }
    }

    /// Matching nodes in document order.
    pub fn evaluate<D: DocumentLike + ?Sized>(&self, doc: &D) -> Vec<NodeId> {
        match self {
            Locator::Css(selectors) => select(doc, selectors),
            Locator::XPath(expr) => evaluate(doc, expr),
        }
    }

    pub fn is_xpath(&self) -> bool {
        matches!(self, Locator::XPath(_))
    }
}

/// Parse and evaluate in one call.
pub fn query<D: DocumentLike + ?Sized>(doc: &D, expression: &str) -> Result<Vec<NodeId>, LocatorError> {
    Ok(Locator::parse(expression)?.evaluate(doc))
}
