pub mod ast;
pub mod config;
pub mod convert;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod output;
pub mod overlay;
pub mod parser;
pub mod printer;
pub mod tree;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{Query, Token, TokenInfo};
pub use config::Config;
pub use evaluator::{EvalError, FilterValue};
pub use functions::{FunctionDefinition, FunctionError, register};
pub use lexer::Lexer;
pub use output::{to_json, to_json_pretty, to_yaml};
pub use overlay::{Action, Overlay, OverlayError, compare};
pub use parser::{ParseError, Parser, parse, parse_with_config};
pub use tree::{Document, Node, NodeId, Scalar, ScalarTag, TreeError};

/// Splits a query into positioned tokens. Never fails; unrecognized input
/// shows up as [`Token::Illegal`].
pub fn tokenize(input: &str, config: Config) -> Vec<TokenInfo> {
    Lexer::new(input, config).tokenize()
}
