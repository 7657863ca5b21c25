//! # JSONPath Abstract Syntax Tree
//!
//! This module defines the syntax tree for RFC 9535 JSONPath queries, plus the
//! non-standard property-name extension (`~`).
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[query]** - Queries, segments, selectors and slices
//! - **[expressions]** - Filter expressions, comparables, literals and
//!   function calls
//! - **[operators]** - Comparison operators
//!
//! Every grammar category is a closed enum, matched exhaustively by the
//! evaluator and the printer.
//!
//! ## Quick Start
//!
//! ```text
//! $.store.book[?(@.price < 10)].title
//! ```
//!
//! parses to a [`Query`] rooted at `$` with four segments:
//!
//! ```text
//! Child(DotName("store"))
//! Child(DotName("book"))
//! Child(LongHand([Filter(...)]))
//! Child(DotName("title"))
//! ```
//!
//! ## Segments
//!
//! - `.name`, `.*`, `[selectors]` select children of each input node
//! - `..name`, `..*`, `..[selectors]` select among the input node and all of
//!   its descendants
//! - `~` (extension) replaces each node by the key it is stored under
//!
//! ## Selectors
//!
//! ```text
//! $['name']          // name
//! $[*]               // wildcard
//! $[-1]              // index, negative counts from the end
//! $[1:10:2]          // slice
//! $[?@.isbn]         // filter
//! ```
pub mod expressions;
pub mod operators;
pub mod query;
pub mod tokens;

pub use expressions::{
    BasicExpr, Comparable, ComparisonExpr, FunctionArgument, FunctionExpr, Literal,
    LogicalAndExpr, LogicalOrExpr, Test, TestExpr,
};
pub use operators::ComparisonOp;
pub use query::{ChildSegment, Query, QueryRoot, Segment, Selector, Slice};
pub use tokens::{Token, TokenInfo};
