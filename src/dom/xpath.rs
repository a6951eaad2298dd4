use crate::dom::dom_model::{DocumentLike, NodeId, collapse_whitespace};
use crate::error::LocatorError;

// ============================================================================
// Expression AST (location paths only)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum XPathExpr {
    Path(LocationPath),
    /// `( path )[n]`: n-th node of the whole result, in document order
    Indexed { path: LocationPath, index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    Any,
    Tag(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Position(usize),
    Condition(Condition),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
    AttributeExists(String),
    Compare(Operand, String),
    Contains(Operand, String),
    StartsWith(Operand, String),
    /// Relative path that must select at least one node
    Exists(LocationPath),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Attribute(String),
    /// String value of the context node (`.`, `normalize-space(.)`)
    StringValue,
    /// The node's own text (`text()`)
    OwnText,
}

// ============================================================================
// Parser
// ============================================================================

pub fn parse_xpath(source: &str) -> Result<XPathExpr, LocatorError> {
    let mut parser = XPathParser {
        src: source,
        pos: 0,
    };
    parser.skip_ws();

    let expr = if parser.eat('(') {
        parser.skip_ws();
        let path = parser.parse_absolute_path()?;
        parser.skip_ws();
        parser.expect(')')?;
        parser.skip_ws();
        parser.expect('[')?;
        parser.skip_ws();
        let index = parser.parse_number()?;
        parser.skip_ws();
        parser.expect(']')?;
        if index == 0 {
            return Err(parser.error("positions start at 1"));
        }
        XPathExpr::Indexed { path, index }
    } else {
        XPathExpr::Path(parser.parse_absolute_path()?)
    };

    parser.skip_ws();
    if parser.pos != source.len() {
        return Err(parser.error("trailing input"));
    }
    Ok(expr)
}

struct XPathParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> XPathParser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), LocatorError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", c)))
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += self.peek().map(char::len_utf8).unwrap_or(1);
        }
    }

    fn error(&self, reason: impl Into<String>) -> LocatorError {
        LocatorError::malformed(self.src, self.pos, reason)
    }

    fn parse_absolute_path(&mut self) -> Result<LocationPath, LocatorError> {
        if !self.rest().starts_with('/') {
            return Err(self.error("expected '/' or '//'"));
        }
        self.parse_steps()
    }

    /// One or more `/step` or `//step` segments.
    fn parse_steps(&mut self) -> Result<LocationPath, LocatorError> {
        let mut steps = Vec::new();
        loop {
            let axis = if self.eat_str("//") {
                Axis::Descendant
            } else if self.eat('/') {
                Axis::Child
            } else {
                break;
            };
            steps.push(self.parse_step(axis)?);
        }
        if steps.is_empty() {
            return Err(self.error("expected a location step"));
        }
        Ok(LocationPath { steps })
    }

    fn parse_step(&mut self, axis: Axis) -> Result<Step, LocatorError> {
        let test = if self.eat('*') {
            NodeTest::Any
        } else {
            let name = self.parse_name()?;
            if self.rest().starts_with("::") {
                return Err(LocatorError::unsupported(self.src, format!("axis {}::", name)));
            }
            if self.rest().starts_with('(') {
                return Err(LocatorError::unsupported(self.src, format!("node test {}()", name)));
            }
            NodeTest::Tag(name.to_lowercase())
        };

        let mut predicates = Vec::new();
        loop {
            self.skip_ws();
            if !self.eat('[') {
                break;
            }
            self.skip_ws();
            let predicate = if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                let n = self.parse_number()?;
                if n == 0 {
                    return Err(self.error("positions start at 1"));
                }
                Predicate::Position(n)
            } else {
                Predicate::Condition(self.parse_or()?)
            };
            self.skip_ws();
            self.expect(']')?;
            predicates.push(predicate);
        }

        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn parse_name(&mut self) -> Result<String, LocatorError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            let ok = if self.pos == start {
                c.is_alphabetic() || c == '_'
            } else {
                c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
            };
            if !ok {
                break;
            }
            self.pos += c.len_utf8();
        }
        if self.pos == start {
            return Err(self.error("expected a name"));
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn parse_number(&mut self) -> Result<usize, LocatorError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        self.src[start..self.pos]
            .parse()
            .map_err(|_| self.error("expected a number"))
    }

    fn parse_literal(&mut self) -> Result<String, LocatorError> {
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error("expected a string literal")),
        };
        self.pos += 1;
        let body_start = self.pos;
        match self.rest().find(quote) {
            Some(len) => {
                self.pos += len + 1;
                Ok(self.src[body_start..body_start + len].to_string())
            }
            None => Err(self.error("unterminated string literal")),
        }
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        let rest = self.rest();
        rest.starts_with(keyword)
            && !rest[keyword.len()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_')
    }

    fn parse_or(&mut self) -> Result<Condition, LocatorError> {
        let mut left = self.parse_and()?;
        loop {
            self.skip_ws();
            if self.at_keyword("or") {
                self.pos += 2;
                self.skip_ws();
                let right = self.parse_and()?;
                left = Condition::Or(Box::new(left), Box::new(right));
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_and(&mut self) -> Result<Condition, LocatorError> {
        let mut left = self.parse_condition()?;
        loop {
            self.skip_ws();
            if self.at_keyword("and") {
                self.pos += 3;
                self.skip_ws();
                let right = self.parse_condition()?;
                left = Condition::And(Box::new(left), Box::new(right));
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_condition(&mut self) -> Result<Condition, LocatorError> {
        self.skip_ws();

        if self.eat('(') {
            let inner = self.parse_or()?;
            self.skip_ws();
            self.expect(')')?;
            return Ok(inner);
        }

        if self.rest().starts_with("./") {
            self.pos += 1;
            return Ok(Condition::Exists(self.parse_steps()?));
        }

        if self.at_keyword("not") {
            self.pos += 3;
            self.skip_ws();
            self.expect('(')?;
            let inner = self.parse_or()?;
            self.skip_ws();
            self.expect(')')?;
            return Ok(Condition::Not(Box::new(inner)));
        }

        for (name, is_contains) in [("contains", true), ("starts-with", false)] {
            if self.at_keyword(name) {
                self.pos += name.len();
                self.skip_ws();
                self.expect('(')?;
                self.skip_ws();
                let operand = self.parse_operand()?;
                self.skip_ws();
                self.expect(',')?;
                self.skip_ws();
                let literal = self.parse_literal()?;
                self.skip_ws();
                self.expect(')')?;
                return Ok(if is_contains {
                    Condition::Contains(operand, literal)
                } else {
                    Condition::StartsWith(operand, literal)
                });
            }
        }

        let operand = self.parse_operand()?;
        self.skip_ws();
        if self.eat('=') {
            self.skip_ws();
            let literal = self.parse_literal()?;
            return Ok(Condition::Compare(operand, literal));
        }

        match operand {
            Operand::Attribute(name) => Ok(Condition::AttributeExists(name)),
            _ => Err(self.error("expected '=' after string expression")),
        }
    }

    fn parse_operand(&mut self) -> Result<Operand, LocatorError> {
        if self.eat('@') {
            return Ok(Operand::Attribute(self.parse_name()?.to_lowercase()));
        }
        if self.eat_str("text()") {
            return Ok(Operand::OwnText);
        }
        if self.at_keyword("normalize-space") {
            self.pos += "normalize-space".len();
            self.skip_ws();
            self.expect('(')?;
            self.skip_ws();
            let operand = if self.eat_str("text()") {
                Operand::OwnText
            } else {
                self.eat('.');
                Operand::StringValue
            };
            self.skip_ws();
            self.expect(')')?;
            return Ok(operand);
        }
        if self.eat('.') {
            return Ok(Operand::StringValue);
        }

        match self.parse_name() {
            Ok(name) => Err(LocatorError::unsupported(self.src, format!("expression '{}'", name))),
            Err(e) => Err(e),
        }
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// `None` stands for the document node above the root element.
type Context = Option<NodeId>;

pub fn evaluate<D: DocumentLike + ?Sized>(doc: &D, expr: &XPathExpr) -> Vec<NodeId> {
    match expr {
        XPathExpr::Path(path) => eval_path(doc, vec![None], path),
        XPathExpr::Indexed { path, index } => eval_path(doc, vec![None], path)
            .get(index - 1)
            .copied()
            .into_iter()
            .collect(),
    }
}

fn eval_path<D: DocumentLike + ?Sized>(
    doc: &D,
    start: Vec<Context>,
    path: &LocationPath,
) -> Vec<NodeId> {
    let mut current = start;

    for step in &path.steps {
        let mut next: Vec<NodeId> = Vec::new();
        for ctx in &current {
            let parents: Vec<Context> = match step.axis {
                Axis::Child => vec![*ctx],
                Axis::Descendant => descendant_or_self(doc, *ctx),
            };
            for parent in parents {
                let candidates: Vec<NodeId> = children_of(doc, parent)
                    .into_iter()
                    .filter(|c| node_test(doc, *c, &step.test))
                    .collect();
                next.extend(apply_predicates(doc, candidates, &step.predicates));
            }
        }
        next.sort();
        next.dedup();
        current = next.into_iter().map(Some).collect();
    }

    current.into_iter().flatten().collect()
}

fn children_of<D: DocumentLike + ?Sized>(doc: &D, ctx: Context) -> Vec<NodeId> {
    match ctx {
        None => vec![doc.root()],
        Some(node) => doc.children(node).to_vec(),
    }
}

fn descendant_or_self<D: DocumentLike + ?Sized>(doc: &D, ctx: Context) -> Vec<Context> {
    match ctx {
        None => std::iter::once(None)
            .chain(doc.all_nodes().into_iter().map(Some))
            .collect(),
        Some(node) => doc.subtree(node).into_iter().map(Some).collect(),
    }
}

fn node_test<D: DocumentLike + ?Sized>(doc: &D, node: NodeId, test: &NodeTest) -> bool {
    match test {
        NodeTest::Any => true,
        NodeTest::Tag(tag) => doc.tag(node) == tag,
    }
}

fn apply_predicates<D: DocumentLike + ?Sized>(
    doc: &D,
    mut nodes: Vec<NodeId>,
    predicates: &[Predicate],
) -> Vec<NodeId> {
    for predicate in predicates {
        nodes = match predicate {
            Predicate::Position(n) => nodes.get(n - 1).copied().into_iter().collect(),
            Predicate::Condition(cond) => nodes
                .into_iter()
                .filter(|node| eval_condition(doc, *node, cond))
                .collect(),
        };
    }
    nodes
}

fn eval_condition<D: DocumentLike + ?Sized>(doc: &D, node: NodeId, cond: &Condition) -> bool {
    match cond {
        Condition::And(a, b) => eval_condition(doc, node, a) && eval_condition(doc, node, b),
        Condition::Or(a, b) => eval_condition(doc, node, a) || eval_condition(doc, node, b),
        Condition::Not(inner) => !eval_condition(doc, node, inner),
        Condition::AttributeExists(name) => doc.attribute(node, name).is_some(),
        Condition::Compare(operand, literal) => {
            operand_value(doc, node, operand).is_some_and(|v| v == *literal)
        }
        Condition::Contains(operand, literal) => {
            operand_value(doc, node, operand).is_some_and(|v| v.contains(literal.as_str()))
        }
        Condition::StartsWith(operand, literal) => {
            operand_value(doc, node, operand).is_some_and(|v| v.starts_with(literal.as_str()))
        }
        Condition::Exists(path) => !eval_path(doc, vec![Some(node)], path).is_empty(),
    }
}

fn operand_value<D: DocumentLike + ?Sized>(
    doc: &D,
    node: NodeId,
    operand: &Operand,
) -> Option<String> {
    match operand {
        Operand::Attribute(name) => doc.attribute(node, name).map(str::to_string),
        Operand::StringValue => Some(doc.text_content(node)),
        Operand::OwnText => Some(collapse_whitespace(doc.own_text(node).unwrap_or(""))),
    }
}

/// Quote a string as an XPath literal. Returns `None` when the value holds
/// both quote characters (no escape syntax exists for that case).
pub fn quote_xpath(value: &str) -> Option<String> {
    if !value.contains('"') {
        Some(format!("\"{}\"", value))
    } else if !value.contains('\'') {
        Some(format!("'{}'", value))
    } else {
        None
    }
}
