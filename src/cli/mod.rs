//! CLI support for jsonpath-overlay
//!
//! Provides programmatic access to the `jpo` commands so they can be
//! embedded in other tools and tested without spawning a process.

mod overlay;
mod query;

pub use overlay::{ApplyOptions, CompareOptions, execute_apply, execute_compare};
pub use query::{QueryOptions, QueryResult, execute_query};

use std::io;

use thiserror::Error;

use crate::{EvalError, OverlayError, ParseError, TreeError};

/// Errors that can occur during CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    #[error("Invalid document: {0}")]
    Tree(#[from] TreeError),

    #[error("Overlay error: {0}")]
    Overlay(#[from] OverlayError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No input provided. Use --input or pipe a document to stdin.")]
    NoInput,
}
