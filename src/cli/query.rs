//! Run a JSONPath query against a JSON or YAML document

use super::CliError;
use crate::{
    Config, Document, parse_with_config,
    output::{NodePrinter, OutputFormat},
};

/// Options for the query command
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// The JSONPath query to run
    pub query: String,
    /// Document text, JSON or YAML
    pub input: Option<String>,
    /// How to render the resulting nodelist
    pub format: OutputFormat,
    /// Accept the `~` property-name extension
    pub property_names: bool,
    /// Only validate syntax, don't execute
    pub syntax_only: bool,
}

/// Result of a query operation
#[derive(Debug, PartialEq)]
pub enum QueryResult {
    /// Syntax validation passed
    SyntaxValid,
    /// The rendered nodelist
    Success(String),
}

/// Execute a query operation
pub fn execute_query(options: &QueryOptions) -> Result<QueryResult, CliError> {
    let config = if options.property_names {
        Config::default().with_property_name_extension()
    } else {
        Config::default()
    };
    let query = parse_with_config(&options.query, config)?;

    if options.syntax_only {
        return Ok(QueryResult::SyntaxValid);
    }

    let text = options.input.as_ref().ok_or(CliError::NoInput)?;
    let doc = Document::from_yaml_str(text)?;
    let nodes = query.evaluate(&doc)?;

    let rendered = NodePrinter::new(options.format).print(&doc, &nodes)?;
    Ok(QueryResult::Success(rendered))
}
