use crate::ast::LogicalOrExpr;

/// Which node a query starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryRoot {
    /// `$`, the document root
    Root,
    /// `@`, the node under test inside a filter
    Current,
}

/// A parsed JSONPath query: a root identifier followed by segments.
///
/// Once parsed a query is immutable and can be evaluated any number of times,
/// from any number of threads.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub root: QueryRoot,
    pub segments: Vec<Segment>,
}

/// One step of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Selects children of each input node
    ///
    /// # Examples
    /// ```text
    /// .store
    /// .*
    /// ['a', 'b']
    /// ```
    Child(ChildSegment),

    /// Applies the inner segment to each input node and all of its
    /// descendants
    ///
    /// # Examples
    /// ```text
    /// ..author
    /// ..*
    /// ..[0]
    /// ```
    Descendant(ChildSegment),

    /// Property-name extension: replaces each input node by the key it is
    /// stored under. Always the last segment of a query.
    PropertyName,
}

/// The three spellings of a child segment.
#[derive(Debug, Clone, PartialEq)]
pub enum ChildSegment {
    /// `.*`
    DotWildcard,
    /// `.name`
    DotName(String),
    /// `[selector, ...]`
    LongHand(Vec<Selector>),
}

/// A selector inside a bracketed selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// `'name'`
    Name(String),
    /// `*`
    Wildcard,
    /// `3`, `-1`
    Index(i64),
    /// `start:end:step`
    Slice(Slice),
    /// `?<logical-expr>`
    Filter(LogicalOrExpr),
}

/// Array slice bounds. Absent fields take their defaults at evaluation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slice {
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub step: Option<i64>,
}

impl Query {
    /// The query `$`.
    pub fn root() -> Self {
        Query {
            root: QueryRoot::Root,
            segments: vec![],
        }
    }

    /// The query `@`.
    pub fn current() -> Self {
        Query {
            root: QueryRoot::Current,
            segments: vec![],
        }
    }

    /// Appends a child segment selecting the member `name`.
    ///
    /// Uses the `.name` shorthand when `name` is a valid member-name
    /// shorthand, and the bracketed `['name']` form otherwise.
    pub fn child(mut self, name: &str) -> Self {
        let segment = if is_member_name_shorthand(name) {
            ChildSegment::DotName(name.to_string())
        } else {
            ChildSegment::LongHand(vec![Selector::Name(name.to_string())])
        };
        self.segments.push(Segment::Child(segment));
        self
    }

    /// Appends a child segment selecting array element `index`.
    pub fn index(mut self, index: i64) -> Self {
        self.segments
            .push(Segment::Child(ChildSegment::LongHand(vec![Selector::Index(index)])));
        self
    }

    /// A singular query selects at most one node: every segment is a child
    /// segment holding a single name or index selector.
    pub fn is_singular(&self) -> bool {
        self.segments.iter().all(|segment| match segment {
            Segment::Child(ChildSegment::DotName(_)) | Segment::PropertyName => true,
            Segment::Child(ChildSegment::LongHand(selectors)) => {
                matches!(selectors.as_slice(), [Selector::Name(_)] | [Selector::Index(_)])
            }
            _ => false,
        })
    }
}

/// `name-first *name-char` from the RFC grammar, where name-first is ALPHA,
/// `_` or any non-ASCII character.
pub fn is_member_name_shorthand(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if is_name_first(c) => chars.all(is_name_char),
        _ => false,
    }
}

pub(crate) fn is_name_first(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

pub(crate) fn is_name_char(c: char) -> bool {
    is_name_first(c) || c.is_ascii_digit()
}
