//! Serialization of query results.
//!
//! A nodelist is rendered as a single array: JSON (compact or pretty, with
//! 2-space indentation) or a YAML sequence. Mapping keys keep document order.
//!
//! # Examples
//!
//! ```
//! use jsonpath_overlay::{parse, tree::Document};
//! use jsonpath_overlay::output::{to_json, to_yaml};
//!
//! let doc = Document::from_yaml_str("{a: 1, b: [x, y]}").unwrap();
//! let nodes = parse("$.*").unwrap().evaluate(&doc).unwrap();
//!
//! assert_eq!(to_json(&doc, &nodes).unwrap(), r#"[1,["x","y"]]"#);
//! assert_eq!(to_yaml(&doc, &nodes).unwrap(), "- 1\n- - x\n  - y\n");
//! ```

use crate::{
    convert,
    tree::{Document, NodeId, TreeError},
};

/// Output encoding for a nodelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    JsonPretty,
    Yaml,
}

pub struct NodePrinter {
    format: OutputFormat,
}

impl NodePrinter {
    pub fn new(format: OutputFormat) -> Self {
        NodePrinter { format }
    }

    pub fn print(&self, doc: &Document, nodes: &[NodeId]) -> Result<String, TreeError> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string(&self.json_array(doc, nodes)?)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(&self.json_array(doc, nodes)?)?),
            OutputFormat::Yaml => {
                let items = nodes.iter().map(|id| convert::to_yaml_value(doc, *id)).collect();
                Ok(serde_yaml::to_string(&serde_yaml::Value::Sequence(items))?)
            }
        }
    }

    fn json_array(&self, doc: &Document, nodes: &[NodeId]) -> Result<serde_json::Value, TreeError> {
        let items = nodes
            .iter()
            .map(|id| convert::to_json_value(doc, *id))
            .collect::<Result<_, _>>()?;
        Ok(serde_json::Value::Array(items))
    }
}

/// Render a nodelist as compact JSON
pub fn to_json(doc: &Document, nodes: &[NodeId]) -> Result<String, TreeError> {
    NodePrinter::new(OutputFormat::Json).print(doc, nodes)
}

/// Render a nodelist as pretty-printed JSON
pub fn to_json_pretty(doc: &Document, nodes: &[NodeId]) -> Result<String, TreeError> {
    NodePrinter::new(OutputFormat::JsonPretty).print(doc, nodes)
}

/// Render a nodelist as a YAML sequence
pub fn to_yaml(doc: &Document, nodes: &[NodeId]) -> Result<String, TreeError> {
    NodePrinter::new(OutputFormat::Yaml).print(doc, nodes)
}
