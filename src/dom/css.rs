use crate::dom::dom_model::{DocumentLike, NodeId};
use crate::error::LocatorError;

// ============================================================================
// Selector AST
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList(pub Vec<ComplexSelector>);

/// Compounds joined by combinators, stored left to right. The combinator on
/// each part links it to the part before it (ignored on the first part).
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSelector {
    pub parts: Vec<(Combinator, Compound)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttributeSelector>,
    pub nth_of_type: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSelector {
    pub name: String,
    pub matcher: Option<(AttributeOp, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOp {
    Equals,
    Prefix,
    Suffix,
    Contains,
    Includes,
}

// ============================================================================
// Parser
// ============================================================================

pub fn parse_css(source: &str) -> Result<SelectorList, LocatorError> {
    let mut parser = CssParser {
        src: source,
        pos: 0,
    };
    parser.parse_list()
}

struct CssParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> CssParser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) -> usize {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos - start
    }

    fn error(&self, reason: impl Into<String>) -> LocatorError {
        LocatorError::malformed(self.src, self.pos, reason)
    }

    fn parse_list(&mut self) -> Result<SelectorList, LocatorError> {
        let mut selectors = Vec::new();
        loop {
            self.skip_ws();
            selectors.push(self.parse_complex()?);
            self.skip_ws();
            match self.peek() {
                None => break,
                Some(',') => {
                    self.bump();
                }
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            }
        }
        Ok(SelectorList(selectors))
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, LocatorError> {
        let mut parts = vec![(Combinator::Descendant, self.parse_compound()?)];

        loop {
            let ws = self.skip_ws();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.bump();
                    self.skip_ws();
                    Combinator::Child
                }
                Some('+') | Some('~') => {
                    return Err(LocatorError::unsupported(self.src, "sibling combinator"));
                }
                Some(_) if ws > 0 => Combinator::Descendant,
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            };
            parts.push((combinator, self.parse_compound()?));
        }

        Ok(ComplexSelector { parts })
    }

    fn parse_compound(&mut self) -> Result<Compound, LocatorError> {
        let start = self.pos;
        let mut compound = Compound::default();

        match self.peek() {
            Some('*') => {
                self.bump();
            }
            Some(c) if is_ident_start(c) => {
                compound.tag = Some(self.parse_ident()?.to_lowercase());
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.id = Some(self.parse_ident()?);
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.parse_ident()?);
                }
                Some('[') => {
                    self.bump();
                    compound.attributes.push(self.parse_attribute()?);
                }
                Some(':') => {
                    self.bump();
                    self.parse_pseudo(&mut compound)?;
                }
                _ => break,
            }
        }

        if self.pos == start {
            return Err(self.error("expected a selector"));
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String, LocatorError> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.bump();
                match self.bump() {
                    Some(escaped) => out.push(escaped),
                    None => return Err(self.error("dangling escape")),
                }
            } else if is_ident_char(c) {
                out.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if out.is_empty() {
            return Err(self.error("expected an identifier"));
        }
        Ok(out)
    }

    fn parse_attribute(&mut self) -> Result<AttributeSelector, LocatorError> {
        self.skip_ws();
        let name = self.parse_ident()?.to_lowercase();
        self.skip_ws();

        let op = match self.peek() {
            Some(']') => {
                self.bump();
                return Ok(AttributeSelector {
                    name,
                    matcher: None,
                });
            }
            Some('=') => {
                self.bump();
                AttributeOp::Equals
            }
            Some(c @ ('^' | '$' | '*' | '~')) => {
                self.bump();
                if self.bump() != Some('=') {
                    return Err(self.error("expected '=' in attribute operator"));
                }
                match c {
                    '^' => AttributeOp::Prefix,
                    '$' => AttributeOp::Suffix,
                    '*' => AttributeOp::Contains,
                    _ => AttributeOp::Includes,
                }
            }
            Some('|') => return Err(LocatorError::unsupported(self.src, "|= attribute operator")),
            _ => return Err(self.error("expected ']' or attribute operator")),
        };

        self.skip_ws();
        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.bump();
                self.parse_quoted(q)?
            }
            _ => self.parse_ident()?,
        };
        self.skip_ws();
        // case-sensitivity flags are not supported
        if self.bump() != Some(']') {
            return Err(self.error("unterminated attribute selector"));
        }

        Ok(AttributeSelector {
            name,
            matcher: Some((op, value)),
        })
    }

    fn parse_quoted(&mut self, quote: char) -> Result<String, LocatorError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some('\\') => match self.bump() {
                    Some(c) => out.push(c),
                    None => return Err(self.error("dangling escape")),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_pseudo(&mut self, compound: &mut Compound) -> Result<(), LocatorError> {
        let name = self.parse_ident()?.to_lowercase();
        match name.as_str() {
            "first-of-type" => {
                compound.nth_of_type = Some(1);
                Ok(())
            }
            "nth-of-type" => {
                if self.bump() != Some('(') {
                    return Err(self.error("expected '(' after :nth-of-type"));
                }
                self.skip_ws();
                let digits_start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
                let n: usize = self.src[digits_start..self.pos]
                    .parse()
                    .map_err(|_| LocatorError::unsupported(self.src, "non-numeric :nth-of-type"))?;
                self.skip_ws();
                if self.bump() != Some(')') {
                    return Err(self.error("expected ')'"));
                }
                if n == 0 {
                    return Err(self.error(":nth-of-type index starts at 1"));
                }
                compound.nth_of_type = Some(n);
                Ok(())
            }
            other => Err(LocatorError::unsupported(
                self.src,
                format!("pseudo-class :{}", other),
            )),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '-' || c == '\\' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

/// Whether `value` can be written as a bare CSS identifier (`#value`, `.value`).
pub fn is_plain_ident(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        Some('-') => match chars.clone().next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        },
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Quote a value for use inside a CSS attribute selector.
pub fn quote_css(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

// ============================================================================
// Matching
// ============================================================================

pub fn select<D: DocumentLike + ?Sized>(doc: &D, selectors: &SelectorList) -> Vec<NodeId> {
    doc.all_nodes()
        .into_iter()
        .filter(|node| {
            selectors
                .0
                .iter()
                .any(|complex| matches_complex(doc, *node, &complex.parts))
        })
        .collect()
}

fn matches_complex<D: DocumentLike + ?Sized>(
    doc: &D,
    node: NodeId,
    parts: &[(Combinator, Compound)],
) -> bool {
    let Some(((combinator, compound), rest)) = parts.split_last() else {
        return true;
    };

    if !matches_compound(doc, node, compound) {
        return false;
    }
    if rest.is_empty() {
        return true;
    }

    match combinator {
        Combinator::Child => doc
            .parent(node)
            .is_some_and(|p| matches_complex(doc, p, rest)),
        Combinator::Descendant => doc
            .ancestors(node)
            .into_iter()
            .any(|a| matches_complex(doc, a, rest)),
    }
}

fn matches_compound<D: DocumentLike + ?Sized>(doc: &D, node: NodeId, compound: &Compound) -> bool {
    if let Some(tag) = &compound.tag {
        if doc.tag(node) != tag {
            return false;
        }
    }

    if let Some(id) = &compound.id {
        if doc.attribute(node, "id") != Some(id.as_str()) {
            return false;
        }
    }

    if !compound.classes.is_empty() {
        let tokens = doc.class_tokens(node);
        if !compound.classes.iter().all(|c| tokens.contains(&c.as_str())) {
            return false;
        }
    }

    for attr in &compound.attributes {
        let Some(actual) = doc.attribute(node, &attr.name) else {
            return false;
        };
        if let Some((op, expected)) = &attr.matcher {
            let ok = match op {
                AttributeOp::Equals => actual == expected,
                AttributeOp::Prefix => !expected.is_empty() && actual.starts_with(expected.as_str()),
                AttributeOp::Suffix => !expected.is_empty() && actual.ends_with(expected.as_str()),
                AttributeOp::Contains => !expected.is_empty() && actual.contains(expected.as_str()),
                AttributeOp::Includes => actual.split_whitespace().any(|t| t == expected),
            };
            if !ok {
                return false;
            }
        }
    }

    if let Some(n) = compound.nth_of_type {
        if position_of_type(doc, node) != n {
            return false;
        }
    }

    true
}

/// 1-based index among same-tag siblings.
pub fn position_of_type<D: DocumentLike + ?Sized>(doc: &D, node: NodeId) -> usize {
    let tag = doc.tag(node);
    match doc.parent(node) {
        Some(parent) => doc
            .children(parent)
            .iter()
            .filter(|c| doc.tag(**c) == tag)
            .position(|c| *c == node)
            .map(|i| i + 1)
            .unwrap_or(1),
        None => 1,
    }
}
