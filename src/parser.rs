use std::str::FromStr;

use log::trace;
use thiserror::Error;

use crate::{
    ast::{
        BasicExpr, ChildSegment, Comparable, ComparisonExpr, ComparisonOp, FunctionArgument,
        FunctionExpr, Literal, LogicalAndExpr, LogicalOrExpr, Query, QueryRoot, Segment, Selector,
        Slice, Test, TestExpr, Token, TokenInfo,
    },
    config::Config,
    functions::{self, ArgumentType, ExpressionType},
    lexer::{Lexer, render_error},
};

/// Largest integer an index or slice bound may hold, `2^53 - 1`.
const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Errors that can occur while parsing a query.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The query contained no tokens at all
    #[error("empty query")]
    Empty,

    /// A token did not fit the grammar. `rendered` holds the message followed
    /// by the offending source line and a caret marker.
    #[error("{rendered}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
        rendered: String,
    },
}

type PResult<T> = Result<(T, usize), ParseError>;

/// Recursive-descent parser over a token list.
///
/// Every parse function takes the cursor position it starts at and returns
/// the position just past what it consumed, so trying an alternative is a
/// matter of calling another function with the same position.
pub struct Parser<'a> {
    input: &'a str,
    tokens: Vec<TokenInfo>,
}

/// Parses a query in standards mode.
///
/// # Examples
///
/// ```
/// let query = jsonpath_overlay::parse("$.store.book[?@.price < 10].title").unwrap();
/// assert_eq!(query.to_string(), "$.store.book[?@.price < 10].title");
/// ```
pub fn parse(input: &str) -> Result<Query, ParseError> {
    parse_with_config(input, Config::default())
}

pub fn parse_with_config(input: &str, config: Config) -> Result<Query, ParseError> {
    let tokens = Lexer::new(input, config).tokenize();
    Parser::new(input, tokens).parse()
}

impl FromStr for Query {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str, tokens: Vec<TokenInfo>) -> Self {
        Parser { input, tokens }
    }

    pub fn parse(&self) -> Result<Query, ParseError> {
        if self.tokens.is_empty() {
            return Err(ParseError::Empty);
        }
        if let Some(pos) = self.tokens.iter().position(|t| t.token == Token::Illegal) {
            return Err(self.error_at(pos, "unexpected token"));
        }
        if !self.check(0, Token::Root) {
            return Err(self.error_at(0, "query must start with '$'"));
        }

        let (segments, pos) = self.parse_segments(1)?;
        if pos < self.tokens.len() {
            return Err(self.error_at(pos, "unexpected token after query"));
        }

        Ok(Query {
            root: QueryRoot::Root,
            segments,
        })
    }

    // ========================================
    // Cursor helpers
    // ========================================

    fn token(&self, pos: usize) -> Option<Token> {
        self.tokens.get(pos).map(|t| t.token)
    }

    fn check(&self, pos: usize, token: Token) -> bool {
        self.token(pos) == Some(token)
    }

    fn expect(&self, pos: usize, token: Token) -> Result<usize, ParseError> {
        if self.check(pos, token) {
            Ok(pos + 1)
        } else {
            Err(self.error_at(pos, &format!("expected '{token}'")))
        }
    }

    fn error_at(&self, pos: usize, message: &str) -> ParseError {
        let target = match self.tokens.get(pos) {
            Some(info) => info.clone(),
            None => {
                // past the end: point just after the last token
                let (line, column) = self
                    .tokens
                    .last()
                    .map(|last| (last.line, last.end_column()))
                    .unwrap_or((1, 0));
                TokenInfo {
                    token: Token::Illegal,
                    line,
                    column,
                    len: 1,
                    literal: String::new(),
                }
            }
        };
        let message = if pos >= self.tokens.len() {
            format!("{message}, found end of input")
        } else {
            message.to_string()
        };

        ParseError::Syntax {
            line: target.line,
            column: target.column,
            rendered: render_error(self.input, &target, &message),
            message,
        }
    }

    // ========================================
    // Segments
    // ========================================

    fn parse_segments(&self, mut pos: usize) -> PResult<Vec<Segment>> {
        let mut segments = Vec::new();

        loop {
            match self.token(pos) {
                Some(Token::Child) => {
                    let (segment, next) = self.parse_dot_segment(pos + 1)?;
                    segments.push(Segment::Child(segment));
                    pos = next;
                }
                Some(Token::Recursive) => {
                    let (segment, next) = if self.check(pos + 1, Token::BracketLeft) {
                        self.parse_bracketed(pos + 1)?
                    } else {
                        self.parse_dot_segment(pos + 1)?
                    };
                    segments.push(Segment::Descendant(segment));
                    pos = next;
                }
                Some(Token::BracketLeft) => {
                    let (segment, next) = self.parse_bracketed(pos)?;
                    segments.push(Segment::Child(segment));
                    pos = next;
                }
                Some(Token::PropertyName) => {
                    segments.push(Segment::PropertyName);
                    pos += 1;
                    if matches!(
                        self.token(pos),
                        Some(Token::Child | Token::Recursive | Token::BracketLeft | Token::PropertyName)
                    ) {
                        return Err(self.error_at(pos, "'~' must be the last segment"));
                    }
                    break;
                }
                _ => break,
            }
        }

        Ok((segments, pos))
    }

    /// `*` or a member name following `.` or `..`
    fn parse_dot_segment(&self, pos: usize) -> PResult<ChildSegment> {
        match self.tokens.get(pos) {
            Some(info) if info.token == Token::Wildcard => Ok((ChildSegment::DotWildcard, pos + 1)),
            Some(info) if info.token.is_member_name() => {
                Ok((ChildSegment::DotName(info.literal.clone()), pos + 1))
            }
            _ => Err(self.error_at(pos, "expected member name or '*'")),
        }
    }

    fn parse_bracketed(&self, pos: usize) -> PResult<ChildSegment> {
        let mut pos = self.expect(pos, Token::BracketLeft)?;
        let mut selectors = Vec::new();

        loop {
            let (selector, next) = self.parse_selector(pos)?;
            selectors.push(selector);
            pos = next;

            match self.token(pos) {
                Some(Token::Comma) => pos += 1,
                Some(Token::BracketRight) => return Ok((ChildSegment::LongHand(selectors), pos + 1)),
                _ => return Err(self.error_at(pos, "expected ',' or ']'")),
            }
        }
    }

    // ========================================
    // Selectors
    // ========================================

    fn parse_selector(&self, pos: usize) -> PResult<Selector> {
        match self.token(pos) {
            Some(Token::StringLiteral) => Ok((Selector::Name(self.tokens[pos].literal.clone()), pos + 1)),
            Some(Token::Wildcard) => Ok((Selector::Wildcard, pos + 1)),
            Some(Token::Integer) if self.check(pos + 1, Token::ArraySlice) => self.parse_slice(pos),
            Some(Token::Integer) => Ok((Selector::Index(self.parse_index(pos)?), pos + 1)),
            Some(Token::ArraySlice) => self.parse_slice(pos),
            Some(Token::Filter) => {
                let (expr, next) = self.parse_logical_or(pos + 1)?;
                Ok((Selector::Filter(expr), next))
            }
            _ => Err(self.error_at(pos, "expected selector")),
        }
    }

    fn parse_index(&self, pos: usize) -> Result<i64, ParseError> {
        let literal = &self.tokens[pos].literal;
        if literal == "-0" {
            return Err(self.error_at(pos, "negative zero is not a valid index"));
        }
        match literal.parse::<i64>() {
            Ok(n) if (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&n) => Ok(n),
            _ => Err(self.error_at(pos, "index out of range")),
        }
    }

    /// `[start] ":" [end] [":" [step]]`
    fn parse_slice(&self, mut pos: usize) -> PResult<Selector> {
        let (start, next) = self.parse_slice_bound(pos)?;
        pos = self.expect(next, Token::ArraySlice)?;
        let (end, next) = self.parse_slice_bound(pos)?;
        pos = next;

        let mut step = None;
        if self.check(pos, Token::ArraySlice) {
            let (value, next) = self.parse_slice_bound(pos + 1)?;
            step = value;
            pos = next;
        }

        Ok((Selector::Slice(Slice { start, end, step }), pos))
    }

    fn parse_slice_bound(&self, pos: usize) -> PResult<Option<i64>> {
        match self.token(pos) {
            Some(Token::Integer) => Ok((Some(self.parse_index(pos)?), pos + 1)),
            Some(Token::ArraySlice | Token::Comma | Token::BracketRight) => Ok((None, pos)),
            _ => Err(self.error_at(pos, "slice bounds must be integers")),
        }
    }

    // ========================================
    // Filter expressions
    // ========================================

    fn parse_logical_or(&self, pos: usize) -> PResult<LogicalOrExpr> {
        let (first, mut pos) = self.parse_logical_and(pos)?;
        let mut operands = vec![first];

        while self.check(pos, Token::Or) {
            let (next, after) = self.parse_logical_and(pos + 1)?;
            operands.push(next);
            pos = after;
        }

        Ok((LogicalOrExpr(operands), pos))
    }

    fn parse_logical_and(&self, pos: usize) -> PResult<LogicalAndExpr> {
        let (first, mut pos) = self.parse_basic(pos)?;
        let mut operands = vec![first];

        while self.check(pos, Token::And) {
            let (next, after) = self.parse_basic(pos + 1)?;
            operands.push(next);
            pos = after;
        }

        Ok((LogicalAndExpr(operands), pos))
    }

    fn parse_basic(&self, pos: usize) -> PResult<BasicExpr> {
        // paren-expr = [logical-not-op] "(" logical-expr ")"
        let (not, inner) = if self.check(pos, Token::Not) {
            (true, pos + 1)
        } else {
            (false, pos)
        };
        if self.check(inner, Token::ParenLeft) {
            let (expr, next) = self.parse_logical_or(inner + 1)?;
            let next = self.expect(next, Token::ParenRight)?;
            return Ok((BasicExpr::Paren { not, expr }, next));
        }

        let mut comparable_err = None;
        if !not {
            match self.parse_comparable(pos) {
                Ok((left, next)) => {
                    if let Some(op) = self.comparison_op(next)? {
                        let (right, after) = self.parse_comparable(next + 1)?;
                        let comparison = ComparisonExpr { left, op, right };
                        return Ok((BasicExpr::Comparison(comparison), after));
                    }
                    trace!("no comparison operator at token {next}, trying test expression");
                }
                Err(err) => {
                    trace!("not a comparison at token {pos}: {err:?}");
                    comparable_err = Some(err);
                }
            }
        }

        let (test, next) = self.parse_test(inner)?;
        // `@.* == 1` parses as a test followed by an operator
        if let Some(err) = comparable_err
            && self.comparison_op(next)?.is_some()
        {
            return Err(err);
        }
        Ok((BasicExpr::Test(TestExpr { not, test }), next))
    }

    fn comparison_op(&self, pos: usize) -> Result<Option<ComparisonOp>, ParseError> {
        Ok(Some(match self.token(pos) {
            Some(Token::Eq) => ComparisonOp::Equal,
            Some(Token::Ne) => ComparisonOp::NotEqual,
            Some(Token::Lt) => ComparisonOp::LessThan,
            Some(Token::Le) => ComparisonOp::LessEqual,
            Some(Token::Gt) => ComparisonOp::GreaterThan,
            Some(Token::Ge) => ComparisonOp::GreaterEqual,
            Some(Token::Matches) => {
                return Err(self.error_at(pos, "'=~' is not supported, use match() or search()"));
            }
            _ => return Ok(None),
        }))
    }

    fn parse_test(&self, pos: usize) -> PResult<Test> {
        match self.token(pos) {
            Some(Token::FunctionName) => {
                let (function, next) = self.parse_function(pos)?;
                Ok((Test::Function(function), next))
            }
            Some(Token::Root | Token::Current) => {
                let (query, next) = self.parse_filter_query(pos)?;
                Ok((Test::FilterQuery(query), next))
            }
            _ => Err(self.error_at(pos, "expected filter expression")),
        }
    }

    fn parse_comparable(&self, pos: usize) -> PResult<Comparable> {
        match self.token(pos) {
            Some(
                Token::StringLiteral
                | Token::Integer
                | Token::Float
                | Token::True
                | Token::False
                | Token::Null,
            ) => {
                let (literal, next) = self.parse_literal(pos)?;
                Ok((Comparable::Literal(literal), next))
            }
            Some(Token::FunctionName) => {
                let (function, next) = self.parse_function(pos)?;
                if function.function.result_type() != ExpressionType::Value {
                    return Err(self.error_at(
                        pos,
                        &format!("function {}() does not return a value", function.name()),
                    ));
                }
                Ok((Comparable::Function(function), next))
            }
            Some(Token::Root | Token::Current) => {
                let (query, next) = self.parse_filter_query(pos)?;
                if !query.is_singular() {
                    return Err(self.error_at(pos, "comparisons require a singular query"));
                }
                Ok((Comparable::SingularQuery(query), next))
            }
            _ => Err(self.error_at(pos, "expected literal, function or singular query")),
        }
    }

    fn parse_literal(&self, pos: usize) -> PResult<Literal> {
        let Some(info) = self.tokens.get(pos) else {
            return Err(self.error_at(pos, "expected literal"));
        };

        let literal = match info.token {
            Token::StringLiteral => Literal::String(info.literal.clone()),
            Token::True => Literal::Bool(true),
            Token::False => Literal::Bool(false),
            Token::Null => Literal::Null,
            Token::Integer => match info.literal.parse::<i64>() {
                Ok(n) => Literal::Integer(n),
                Err(_) => Literal::Float(self.parse_float(pos)?),
            },
            Token::Float => Literal::Float(self.parse_float(pos)?),
            _ => return Err(self.error_at(pos, "expected literal")),
        };

        Ok((literal, pos + 1))
    }

    fn parse_float(&self, pos: usize) -> Result<f64, ParseError> {
        match self.tokens[pos].literal.parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(f),
            Ok(_) => Err(self.error_at(pos, "number out of range")),
            Err(_) => Err(self.error_at(pos, "invalid number")),
        }
    }

    /// `@` or `$` followed by segments
    fn parse_filter_query(&self, pos: usize) -> PResult<Query> {
        let root = match self.token(pos) {
            Some(Token::Root) => QueryRoot::Root,
            Some(Token::Current) => QueryRoot::Current,
            _ => return Err(self.error_at(pos, "expected '$' or '@'")),
        };
        let (segments, next) = self.parse_segments(pos + 1)?;
        Ok((Query { root, segments }, next))
    }

    // ========================================
    // Function calls
    // ========================================

    fn parse_function(&self, pos: usize) -> PResult<FunctionExpr> {
        let name = &self.tokens[pos].literal;
        let function = functions::lookup(name)
            .ok_or_else(|| self.error_at(pos, &format!("unknown function '{name}'")))?;

        let mut next = self.expect(pos + 1, Token::ParenLeft)?;
        let mut args = Vec::new();

        if !self.check(next, Token::ParenRight) {
            loop {
                let (arg, after) = self.parse_function_argument(next)?;
                args.push(arg);
                next = after;
                match self.token(next) {
                    Some(Token::Comma) => next += 1,
                    Some(Token::ParenRight) => break,
                    _ => return Err(self.error_at(next, "expected ',' or ')'")),
                }
            }
        }

        let types: Vec<ArgumentType> = args.iter().map(argument_type).collect();
        function
            .validate(&types)
            .map_err(|e| self.error_at(pos, &e.to_string()))?;

        Ok((FunctionExpr { function, args }, next + 1))
    }

    /// Alternatives are tried in order: literal, function, logical
    /// expression, filter query. An alternative only counts when the
    /// argument ends right after it.
    fn parse_function_argument(&self, pos: usize) -> PResult<FunctionArgument> {
        let ends_argument = |next: usize| matches!(self.token(next), Some(Token::Comma | Token::ParenRight));

        if let Ok((literal, next)) = self.parse_literal(pos)
            && ends_argument(next)
        {
            return Ok((FunctionArgument::Literal(literal), next));
        }

        if self.check(pos, Token::FunctionName) {
            match self.parse_function(pos) {
                Ok((function, next)) if ends_argument(next) => {
                    return Ok((FunctionArgument::Function(function), next));
                }
                Ok(_) => trace!("function argument at token {pos} continues, trying logical expression"),
                Err(err) => trace!("function argument at token {pos} failed: {err:?}"),
            }
        }

        let logical_err = match self.parse_logical_or(pos) {
            Ok((expr, next)) if ends_argument(next) => {
                return Ok((collapse_filter_query(expr), next));
            }
            Ok((_, next)) => self.error_at(next, "expected ',' or ')'"),
            Err(err) => err,
        };

        match self.parse_filter_query(pos) {
            Ok((query, next)) if ends_argument(next) => Ok((FunctionArgument::FilterQuery(query), next)),
            _ => Err(logical_err),
        }
    }
}

/// A logical expression that is nothing but a bare filter query is the
/// filter query itself.
fn collapse_filter_query(expr: LogicalOrExpr) -> FunctionArgument {
    if let [LogicalAndExpr(basics)] = expr.0.as_slice()
        && let [BasicExpr::Test(TestExpr { not: false, test: Test::FilterQuery(query) })] = basics.as_slice()
    {
        return FunctionArgument::FilterQuery(query.clone());
    }
    FunctionArgument::Logical(expr)
}

fn argument_type(arg: &FunctionArgument) -> ArgumentType {
    match arg {
        FunctionArgument::Literal(_) => ArgumentType::Literal,
        FunctionArgument::FilterQuery(query) if query.is_singular() => ArgumentType::SingularQuery,
        FunctionArgument::FilterQuery(_) => ArgumentType::Nodes,
        FunctionArgument::Logical(_) => ArgumentType::Logical,
        FunctionArgument::Function(function) => ArgumentType::from_result(function.function.result_type()),
    }
}
