//! Canonical text form of parsed queries.
//!
//! Every `Display` impl here prints the production that parses back into the
//! same node, so `parse(&query.to_string())` always yields an equal query.

use std::fmt::{self, Display, Formatter, Write};

use crate::ast::{
    BasicExpr, ChildSegment, Comparable, ComparisonExpr, ComparisonOp, FunctionArgument,
    FunctionExpr, Literal, LogicalAndExpr, LogicalOrExpr, Query, QueryRoot, Segment, Selector,
    Slice, Test, TestExpr,
};

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self.root {
            QueryRoot::Root => "$",
            QueryRoot::Current => "@",
        })?;
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Child(ChildSegment::DotWildcard) => f.write_str(".*"),
            Segment::Child(ChildSegment::DotName(name)) => write!(f, ".{name}"),
            Segment::Child(long_hand) => write!(f, "{long_hand}"),
            Segment::Descendant(ChildSegment::DotWildcard) => f.write_str("..*"),
            Segment::Descendant(ChildSegment::DotName(name)) => write!(f, "..{name}"),
            Segment::Descendant(long_hand) => write!(f, "..{long_hand}"),
            Segment::PropertyName => f.write_str("~"),
        }
    }
}

impl Display for ChildSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ChildSegment::DotWildcard => f.write_str("*"),
            ChildSegment::DotName(name) => f.write_str(name),
            ChildSegment::LongHand(selectors) => {
                f.write_char('[')?;
                write_joined(f, selectors, ", ")?;
                f.write_char(']')
            }
        }
    }
}

impl Display for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Name(name) => write_quoted(f, name),
            Selector::Wildcard => f.write_char('*'),
            Selector::Index(i) => write!(f, "{i}"),
            Selector::Slice(slice) => write!(f, "{slice}"),
            Selector::Filter(expr) => write!(f, "?{expr}"),
        }
    }
}

impl Display for Slice {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(start) = self.start {
            write!(f, "{start}")?;
        }
        f.write_char(':')?;
        if let Some(end) = self.end {
            write!(f, "{end}")?;
        }
        if let Some(step) = self.step {
            write!(f, ":{step}")?;
        }
        Ok(())
    }
}

impl Display for LogicalOrExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.0, " || ")
    }
}

impl Display for LogicalAndExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.0, " && ")
    }
}

impl Display for BasicExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BasicExpr::Paren { not, expr } => {
                if *not {
                    f.write_char('!')?;
                }
                write!(f, "({expr})")
            }
            BasicExpr::Comparison(comparison) => write!(f, "{comparison}"),
            BasicExpr::Test(test) => write!(f, "{test}"),
        }
    }
}

impl Display for ComparisonExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right)
    }
}

impl Display for ComparisonOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Display for Comparable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Comparable::Literal(literal) => write!(f, "{literal}"),
            Comparable::SingularQuery(query) => write!(f, "{query}"),
            Comparable::Function(function) => write!(f, "{function}"),
        }
    }
}

impl Display for TestExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.not {
            f.write_char('!')?;
        }
        match &self.test {
            Test::FilterQuery(query) => write!(f, "{query}"),
            Test::Function(function) => write!(f, "{function}"),
        }
    }
}

impl Display for FunctionExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name())?;
        write_joined(f, &self.args, ", ")?;
        f.write_char(')')
    }
}

impl Display for FunctionArgument {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FunctionArgument::Literal(literal) => write!(f, "{literal}"),
            FunctionArgument::FilterQuery(query) => write!(f, "{query}"),
            FunctionArgument::Logical(expr) => write!(f, "{expr}"),
            FunctionArgument::Function(function) => write!(f, "{function}"),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(n) => write!(f, "{n}"),
            // Debug keeps the fraction: 1.0 rather than 1
            Literal::Float(n) => write!(f, "{n:?}"),
            Literal::String(s) => write_quoted(f, s),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Null => f.write_str("null"),
        }
    }
}

fn write_joined<T: Display>(f: &mut Formatter<'_>, items: &[T], separator: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Writes `s` as a single-quoted string literal.
fn write_quoted(f: &mut Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('\'')?;
    for ch in s.chars() {
        match ch {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            '\u{0008}' => f.write_str("\\b")?,
            '\u{000C}' => f.write_str("\\f")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if (c as u32) < 0x20 => write!(f, "\\u{:04x}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('\'')
}
