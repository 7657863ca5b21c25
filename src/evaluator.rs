use std::{cmp::Ordering, collections::HashSet};

use rust_decimal::{Decimal, prelude::FromPrimitive};
use thiserror::Error;

use crate::{
    ast::{
        BasicExpr, ChildSegment, Comparable, ComparisonExpr, ComparisonOp, FunctionArgument,
        FunctionExpr, Literal, LogicalAndExpr, LogicalOrExpr, Query, QueryRoot, Segment, Selector,
        Slice, Test, TestExpr,
    },
    functions::{FunctionError, FunctionValue},
    tree::{Document, Node, NodeId, Scalar, ScalarTag},
};

/// Errors that can occur during query evaluation.
///
/// Missing members, out-of-range indices and mismatched comparison types are
/// not errors; they only shrink the result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// A `match()` or `search()` pattern that does not compile
    #[error("invalid regular expression '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },

    /// An extension function reported a failure
    #[error(transparent)]
    Function(#[from] FunctionError),
}

/// The value of one side of a comparison, or of a value-typed function
/// argument.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// No value: an empty or multi-node query result
    Nothing,
    /// A scalar
    Literal(Literal),
    /// A mapping or sequence
    Node(NodeId),
}

impl FilterValue {
    /// Scalars become literals; containers stay nodes.
    pub fn from_node(doc: &Document, id: NodeId) -> Self {
        let id = doc.resolve(id);
        match doc.get(id) {
            Node::Scalar(scalar) => FilterValue::Literal(scalar_literal(scalar)),
            _ => FilterValue::Node(id),
        }
    }
}

fn scalar_literal(scalar: &Scalar) -> Literal {
    match scalar.tag {
        ScalarTag::Str => Literal::String(scalar.value.clone()),
        ScalarTag::Bool => Literal::Bool(scalar.value == "true"),
        ScalarTag::Null => Literal::Null,
        ScalarTag::Int | ScalarTag::Float => match (scalar.as_i64(), scalar.as_f64()) {
            (Some(n), _) => Literal::Integer(n),
            (None, Some(f)) => Literal::Float(f),
            (None, None) => Literal::String(scalar.value.clone()),
        },
    }
}

/// A selected node together with the key it is stored under, when it is a
/// mapping value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Located {
    node: NodeId,
    key: Option<NodeId>,
}

impl Located {
    fn new(node: NodeId) -> Self {
        Located { node, key: None }
    }
}

/// Evaluation context holding both the root and the node under test
#[derive(Debug, Clone, Copy)]
pub struct EvalContext {
    /// The document content (referred to by `$`)
    root: Located,
    /// The filter item (what `@` refers to)
    current: Located,
}

/// Walks a document against parsed queries. Never mutates the document.
pub struct Evaluator<'a> {
    doc: &'a Document,
}

impl Query {
    /// Evaluates an absolute query against a document.
    ///
    /// # Examples
    ///
    /// ```
    /// use jsonpath_overlay::{parse, tree::Document};
    ///
    /// let doc = Document::from_yaml_str("[a, b, c, d, e]").unwrap();
    /// let query = parse("$[0:5:2]").unwrap();
    /// let nodes = query.evaluate(&doc).unwrap();
    ///
    /// let values: Vec<_> = nodes
    ///     .iter()
    ///     .map(|id| doc.scalar_at(*id).unwrap().value.as_str())
    ///     .collect();
    /// assert_eq!(values, ["a", "c", "e"]);
    /// ```
    pub fn evaluate(&self, doc: &Document) -> Result<Vec<NodeId>, EvalError> {
        match doc.content_root() {
            Some(root) => self.query(root, doc),
            None => Ok(Vec::new()),
        }
    }

    /// Evaluates the query with `@` bound to `current`. Absolute queries
    /// ignore `current` and start from the document content.
    pub fn query(&self, current: NodeId, doc: &Document) -> Result<Vec<NodeId>, EvalError> {
        let root = doc.content_root().unwrap_or(current);
        let ctx = EvalContext {
            root: Located::new(root),
            current: Located::new(current),
        };
        let nodes = Evaluator::new(doc).eval_query(self, &ctx)?;
        Ok(nodes.into_iter().map(|located| located.node).collect())
    }
}

impl<'a> Evaluator<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Evaluator { doc }
    }

    fn eval_query(&self, query: &Query, ctx: &EvalContext) -> Result<Vec<Located>, EvalError> {
        let start = match query.root {
            QueryRoot::Root => ctx.root,
            QueryRoot::Current => ctx.current,
        };
        let mut nodes = vec![Located {
            node: self.doc.resolve(start.node),
            key: start.key,
        }];

        for segment in &query.segments {
            let mut next = Vec::new();
            for located in nodes {
                self.eval_segment(segment, located, ctx, &mut next)?;
            }
            // a node reachable along several descent paths is reported once
            if let Segment::Descendant(_) = segment {
                let mut seen = HashSet::new();
                next.retain(|l| seen.insert(l.node));
            }
            nodes = next;
        }

        Ok(nodes)
    }

    // ========================================
    // Segments
    // ========================================

    fn eval_segment(
        &self,
        segment: &Segment,
        located: Located,
        ctx: &EvalContext,
        out: &mut Vec<Located>,
    ) -> Result<(), EvalError> {
        match segment {
            Segment::Child(child) => self.eval_child(child, located.node, ctx, out),
            Segment::Descendant(child) => self.descend(child, located.node, ctx, out),
            Segment::PropertyName => {
                if let Some(key) = located.key {
                    out.push(Located::new(key));
                }
                Ok(())
            }
        }
    }

    /// Applies `child` to `node`, then to every descendant in document order.
    fn descend(
        &self,
        child: &ChildSegment,
        node: NodeId,
        ctx: &EvalContext,
        out: &mut Vec<Located>,
    ) -> Result<(), EvalError> {
        self.eval_child(child, node, ctx, out)?;
        for located in self.children(node) {
            self.descend(child, located.node, ctx, out)?;
        }
        Ok(())
    }

    /// Mapping values (with their keys) or sequence elements, aliases
    /// resolved.
    fn children(&self, node: NodeId) -> Vec<Located> {
        let doc = self.doc;
        match doc.get(doc.resolve(node)) {
            Node::Mapping(_) => doc
                .mapping_pairs(node)
                .map(|(key, value)| Located {
                    node: doc.resolve(value),
                    key: Some(key),
                })
                .collect(),
            Node::Sequence(items) => items.iter().map(|item| Located::new(doc.resolve(*item))).collect(),
            _ => Vec::new(),
        }
    }

    fn eval_child(
        &self,
        child: &ChildSegment,
        node: NodeId,
        ctx: &EvalContext,
        out: &mut Vec<Located>,
    ) -> Result<(), EvalError> {
        match child {
            ChildSegment::DotWildcard => out.extend(self.children(node)),
            ChildSegment::DotName(name) => out.extend(self.select_name(node, name)),
            ChildSegment::LongHand(selectors) => {
                for selector in selectors {
                    self.eval_selector(selector, node, ctx, out)?;
                }
            }
        }
        Ok(())
    }

    // ========================================
    // Selectors
    // ========================================

    fn eval_selector(
        &self,
        selector: &Selector,
        node: NodeId,
        ctx: &EvalContext,
        out: &mut Vec<Located>,
    ) -> Result<(), EvalError> {
        match selector {
            Selector::Name(name) => out.extend(self.select_name(node, name)),
            Selector::Wildcard => out.extend(self.children(node)),
            Selector::Index(index) => {
                let items = self.doc.sequence_items(node);
                if let Some(i) = normalize_index(*index, items.len()) {
                    out.push(Located::new(self.doc.resolve(items[i])));
                }
            }
            Selector::Slice(slice) => {
                let items = self.doc.sequence_items(node);
                for i in slice_indices(slice, items.len()) {
                    out.push(Located::new(self.doc.resolve(items[i])));
                }
            }
            Selector::Filter(expr) => {
                for located in self.children(node) {
                    let item_ctx = EvalContext {
                        root: ctx.root,
                        current: located,
                    };
                    if self.eval_logical_or(expr, &item_ctx)? {
                        out.push(located);
                    }
                }
            }
        }
        Ok(())
    }

    /// First value stored under the key `name`, if `node` is a mapping.
    fn select_name(&self, node: NodeId, name: &str) -> Option<Located> {
        let doc = self.doc;
        doc.mapping_pairs(node)
            .find(|(key, _)| doc.scalar_at(*key).is_some_and(|s| s.value == name))
            .map(|(key, value)| Located {
                node: doc.resolve(value),
                key: Some(key),
            })
    }

    // ========================================
    // Filter expressions
    // ========================================

    fn eval_logical_or(&self, expr: &LogicalOrExpr, ctx: &EvalContext) -> Result<bool, EvalError> {
        for operand in &expr.0 {
            if self.eval_logical_and(operand, ctx)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn eval_logical_and(&self, expr: &LogicalAndExpr, ctx: &EvalContext) -> Result<bool, EvalError> {
        for operand in &expr.0 {
            if !self.eval_basic(operand, ctx)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn eval_basic(&self, expr: &BasicExpr, ctx: &EvalContext) -> Result<bool, EvalError> {
        match expr {
            BasicExpr::Paren { not, expr } => Ok(*not != self.eval_logical_or(expr, ctx)?),
            BasicExpr::Comparison(comparison) => self.eval_comparison(comparison, ctx),
            BasicExpr::Test(TestExpr { not, test }) => {
                let result = match test {
                    Test::FilterQuery(query) => !self.eval_query(query, ctx)?.is_empty(),
                    Test::Function(function) => match self.eval_function(function, ctx)? {
                        FunctionValue::Logical(b) => b,
                        FunctionValue::Nodes(nodes) => !nodes.is_empty(),
                        FunctionValue::Value(FilterValue::Nothing) => false,
                        FunctionValue::Value(FilterValue::Literal(Literal::Bool(b))) => b,
                        FunctionValue::Value(_) => true,
                    },
                };
                Ok(*not != result)
            }
        }
    }

    fn eval_comparison(&self, comparison: &ComparisonExpr, ctx: &EvalContext) -> Result<bool, EvalError> {
        let left = self.eval_comparable(&comparison.left, ctx)?;
        let right = self.eval_comparable(&comparison.right, ctx)?;

        Ok(match comparison.op {
            ComparisonOp::Equal => self.values_equal(&left, &right),
            ComparisonOp::NotEqual => !self.values_equal(&left, &right),
            ComparisonOp::LessThan => less_than(&left, &right),
            ComparisonOp::LessEqual => less_than(&left, &right) || self.values_equal(&left, &right),
            ComparisonOp::GreaterThan => less_than(&right, &left),
            ComparisonOp::GreaterEqual => less_than(&right, &left) || self.values_equal(&left, &right),
        })
    }

    fn eval_comparable(&self, comparable: &Comparable, ctx: &EvalContext) -> Result<FilterValue, EvalError> {
        match comparable {
            Comparable::Literal(literal) => Ok(FilterValue::Literal(literal.clone())),
            Comparable::SingularQuery(query) => Ok(self.singular_value(query, ctx)?),
            Comparable::Function(function) => Ok(self.eval_function(function, ctx)?.into_value(self.doc)),
        }
    }

    fn singular_value(&self, query: &Query, ctx: &EvalContext) -> Result<FilterValue, EvalError> {
        let nodes = self.eval_query(query, ctx)?;
        Ok(match nodes.as_slice() {
            [single] => FilterValue::from_node(self.doc, single.node),
            _ => FilterValue::Nothing,
        })
    }

    fn values_equal(&self, left: &FilterValue, right: &FilterValue) -> bool {
        match (left, right) {
            (FilterValue::Nothing, FilterValue::Nothing) => true,
            (FilterValue::Literal(a), FilterValue::Literal(b)) => literals_equal(a, b),
            (FilterValue::Node(a), FilterValue::Node(b)) => self.doc.structural_eq(*a, self.doc, *b),
            _ => false,
        }
    }

    // ========================================
    // Functions
    // ========================================

    fn eval_function(&self, function: &FunctionExpr, ctx: &EvalContext) -> Result<FunctionValue, EvalError> {
        let args = function
            .args
            .iter()
            .map(|arg| self.eval_argument(arg, ctx))
            .collect::<Result<Vec<_>, _>>()?;
        function.function.evaluate(self.doc, args)
    }

    fn eval_argument(&self, arg: &FunctionArgument, ctx: &EvalContext) -> Result<FunctionValue, EvalError> {
        Ok(match arg {
            FunctionArgument::Literal(literal) => FunctionValue::Value(FilterValue::Literal(literal.clone())),
            FunctionArgument::FilterQuery(query) => FunctionValue::Nodes(
                self.eval_query(query, ctx)?
                    .into_iter()
                    .map(|located| located.node)
                    .collect(),
            ),
            FunctionArgument::Logical(expr) => FunctionValue::Logical(self.eval_logical_or(expr, ctx)?),
            FunctionArgument::Function(inner) => self.eval_function(inner, ctx)?,
        })
    }
}

// ========================================
// Literal comparison
// ========================================

fn literals_equal(a: &Literal, b: &Literal) -> bool {
    match (a, b) {
        (Literal::Integer(_) | Literal::Float(_), Literal::Integer(_) | Literal::Float(_)) => {
            compare_numbers(a, b) == Some(Ordering::Equal)
        }
        (Literal::String(a), Literal::String(b)) => a == b,
        (Literal::Bool(a), Literal::Bool(b)) => a == b,
        (Literal::Null, Literal::Null) => true,
        _ => false,
    }
}

fn less_than(left: &FilterValue, right: &FilterValue) -> bool {
    match (left, right) {
        (FilterValue::Literal(Literal::String(a)), FilterValue::Literal(Literal::String(b))) => a < b,
        (FilterValue::Literal(a), FilterValue::Literal(b)) => compare_numbers(a, b) == Some(Ordering::Less),
        _ => false,
    }
}

/// Orders two numeric literals. Mixed integer and float operands are
/// compared exactly through `Decimal` when both fit, and as `f64` otherwise.
fn compare_numbers(a: &Literal, b: &Literal) -> Option<Ordering> {
    match (a, b) {
        (Literal::Integer(a), Literal::Integer(b)) => Some(a.cmp(b)),
        (Literal::Float(a), Literal::Float(b)) => a.partial_cmp(b),
        (Literal::Integer(a), Literal::Float(b)) => {
            if let Some(ad) = Decimal::from_i64(*a)
                && let Some(bd) = Decimal::from_f64(*b)
            {
                return Some(ad.cmp(&bd));
            }
            (*a as f64).partial_cmp(b)
        }
        (Literal::Float(_), Literal::Integer(_)) => compare_numbers(b, a).map(Ordering::reverse),
        _ => None,
    }
}

// ========================================
// Index normalization
// ========================================

fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let i = if index < 0 { len + index } else { index };
    (0..len).contains(&i).then_some(i as usize)
}

/// Indices selected by `slice` over a sequence of `len` elements, in
/// selection order.
fn slice_indices(slice: &Slice, len: usize) -> Vec<usize> {
    let len = len as i64;
    let step = slice.step.unwrap_or(1);
    let normalize = |i: i64| if i >= 0 { i } else { len + i };
    let mut indices = Vec::new();

    if step > 0 {
        let lower = normalize(slice.start.unwrap_or(0)).clamp(0, len);
        let upper = normalize(slice.end.unwrap_or(len)).clamp(0, len);
        let mut i = lower;
        while i < upper {
            indices.push(i as usize);
            i += step;
        }
    } else if step < 0 {
        let upper = normalize(slice.start.unwrap_or(len - 1)).clamp(-1, len - 1);
        let lower = match slice.end {
            Some(end) => normalize(end).clamp(-1, len - 1),
            None => -1,
        };
        let mut i = upper;
        while lower < i {
            indices.push(i as usize);
            i += step;
        }
    }

    indices
}
