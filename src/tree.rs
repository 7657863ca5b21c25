use thiserror::Error;

use crate::convert;

/// Stable identity of a node inside a [`Document`].
///
/// Ids are arena slots: they stay valid for the lifetime of the document, even
/// after the node has been detached from its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Type tag of a scalar node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarTag {
    Str,
    Int,
    Float,
    Bool,
    Null,
}

/// A leaf value: a type tag plus its literal text.
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    pub tag: ScalarTag,
    pub value: String,
}

impl Scalar {
    pub fn str(value: impl Into<String>) -> Self {
        Scalar {
            tag: ScalarTag::Str,
            value: value.into(),
        }
    }

    pub fn int(value: i64) -> Self {
        Scalar {
            tag: ScalarTag::Int,
            value: value.to_string(),
        }
    }

    pub fn float(value: f64) -> Self {
        Scalar {
            tag: ScalarTag::Float,
            value: format!("{value:?}"),
        }
    }

    pub fn bool(value: bool) -> Self {
        Scalar {
            tag: ScalarTag::Bool,
            value: value.to_string(),
        }
    }

    pub fn null() -> Self {
        Scalar {
            tag: ScalarTag::Null,
            value: "null".to_string(),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.tag, ScalarTag::Int | ScalarTag::Float)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.tag {
            ScalarTag::Int => self.value.parse().ok(),
            _ => None,
        }
    }

    /// Numeric value of an int or float scalar, including the YAML spellings
    /// of infinity and NaN.
    pub fn as_f64(&self) -> Option<f64> {
        if !self.is_numeric() {
            return None;
        }
        match self.value.as_str() {
            ".inf" | ".Inf" | ".INF" | "+.inf" => Some(f64::INFINITY),
            "-.inf" | "-.Inf" | "-.INF" => Some(f64::NEG_INFINITY),
            ".nan" | ".NaN" | ".NAN" => Some(f64::NAN),
            text => text.parse().ok(),
        }
    }

    /// Equality that treats `1` and `1.0` as the same value.
    pub fn same_value(&self, other: &Scalar) -> bool {
        if self.is_numeric() && other.is_numeric() {
            if let (Some(a), Some(b)) = (self.as_i64(), other.as_i64()) {
                return a == b;
            }
            return match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => self.value == other.value,
            };
        }
        self.tag == other.tag && self.value == other.value
    }
}

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Top-level wrapper; holds zero or one content node
    Document(Vec<NodeId>),
    /// Alternating key and value ids: `[k0, v0, k1, v1, ...]`
    Mapping(Vec<NodeId>),
    Sequence(Vec<NodeId>),
    Scalar(Scalar),
    /// Reference to another node of the same document
    Alias(NodeId),
}

impl Node {
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Document(_) => "document",
            Node::Mapping(_) => "mapping",
            Node::Sequence(_) => "sequence",
            Node::Scalar(_) => "scalar",
            Node::Alias(_) => "alias",
        }
    }

    /// Ids directly owned by this node, keys included.
    pub fn children(&self) -> &[NodeId] {
        match self {
            Node::Document(content) | Node::Mapping(content) | Node::Sequence(content) => content,
            Node::Scalar(_) | Node::Alias(_) => &[],
        }
    }
}

/// Errors raised while reading or writing document text.
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot use a {0} as a JSON object key")]
    NonScalarKey(&'static str),
}

/// An arena-backed document tree.
///
/// Every node lives in one vector and is addressed by [`NodeId`]. The root is
/// always a [`Node::Document`] wrapper.
///
/// # Examples
///
/// ```
/// use jsonpath_overlay::tree::{Document, Scalar};
///
/// let mut doc = Document::new();
/// let key = doc.scalar(Scalar::str("a"));
/// let value = doc.scalar(Scalar::int(1));
/// let map = doc.mapping(vec![(key, value)]);
/// doc.set_root(map);
///
/// assert_eq!(doc.content_root(), Some(map));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document with no content.
    pub fn new() -> Self {
        Document {
            nodes: vec![Node::Document(Vec::new())],
            root: NodeId(0),
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, TreeError> {
        if text.trim().is_empty() {
            return Ok(Document::new());
        }
        let value: serde_yaml::Value = serde_yaml::from_str(text)?;
        Ok(convert::document_from_yaml(&value))
    }

    /// JSON is a subset of YAML, so JSON text goes through the YAML reader.
    pub fn from_json_str(text: &str) -> Result<Self, TreeError> {
        Self::from_yaml_str(text)
    }

    pub fn to_yaml_string(&self) -> Result<String, TreeError> {
        let value = match self.content_root() {
            Some(id) => convert::to_yaml_value(self, id),
            None => serde_yaml::Value::Null,
        };
        Ok(serde_yaml::to_string(&value)?)
    }

    pub fn to_json_string(&self) -> Result<String, TreeError> {
        let value = self.to_json_value()?;
        Ok(serde_json::to_string(&value)?)
    }

    pub fn to_json_string_pretty(&self) -> Result<String, TreeError> {
        let value = self.to_json_value()?;
        Ok(serde_json::to_string_pretty(&value)?)
    }

    fn to_json_value(&self) -> Result<serde_json::Value, TreeError> {
        match self.content_root() {
            Some(id) => convert::to_json_value(self, id),
            None => Ok(serde_json::Value::Null),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The single content node of the root document wrapper, if any.
    pub fn content_root(&self) -> Option<NodeId> {
        match self.get(self.root) {
            Node::Document(content) => content.first().copied(),
            _ => Some(self.root),
        }
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content_root().is_none()
    }

    pub fn add(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn scalar(&mut self, scalar: Scalar) -> NodeId {
        self.add(Node::Scalar(scalar))
    }

    pub fn mapping(&mut self, pairs: Vec<(NodeId, NodeId)>) -> NodeId {
        let content = pairs.into_iter().flat_map(|(k, v)| [k, v]).collect();
        self.add(Node::Mapping(content))
    }

    pub fn sequence(&mut self, items: Vec<NodeId>) -> NodeId {
        self.add(Node::Sequence(items))
    }

    pub fn alias(&mut self, target: NodeId) -> NodeId {
        self.add(Node::Alias(target))
    }

    /// Makes `id` the content of the root document wrapper.
    pub fn set_root(&mut self, id: NodeId) {
        let root = self.root;
        self.nodes[root.0] = Node::Document(vec![id]);
    }

    /// Follows aliases until a non-alias node is reached. Alias cycles stop
    /// at the last alias visited.
    pub fn resolve(&self, mut id: NodeId) -> NodeId {
        for _ in 0..self.nodes.len() {
            match self.get(id) {
                Node::Alias(target) => id = *target,
                _ => return id,
            }
        }
        id
    }

    pub fn scalar_at(&self, id: NodeId) -> Option<&Scalar> {
        match self.get(self.resolve(id)) {
            Node::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Key/value pairs of a mapping, empty for any other node.
    pub fn mapping_pairs(&self, id: NodeId) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        let content: &[NodeId] = match self.get(self.resolve(id)) {
            Node::Mapping(content) => content,
            _ => &[],
        };
        content.chunks_exact(2).map(|pair| (pair[0], pair[1]))
    }

    /// Elements of a sequence, empty for any other node.
    pub fn sequence_items(&self, id: NodeId) -> &[NodeId] {
        match self.get(self.resolve(id)) {
            Node::Sequence(items) => items,
            _ => &[],
        }
    }

    /// Looks up a mapping value by key text.
    pub fn mapping_get(&self, id: NodeId, key: &str) -> Option<NodeId> {
        self.mapping_pairs(id)
            .find(|(k, _)| self.scalar_at(*k).is_some_and(|s| s.value == key))
            .map(|(_, v)| v)
    }

    /// Deep-copies the subtree at `id` of `other` into this arena. Aliases are
    /// expanded into copies of their targets.
    pub fn import(&mut self, other: &Document, id: NodeId) -> NodeId {
        let node = match other.get(other.resolve(id)) {
            Node::Scalar(scalar) => Node::Scalar(scalar.clone()),
            Node::Document(content) => {
                Node::Document(content.iter().map(|c| self.import(other, *c)).collect())
            }
            Node::Mapping(content) => {
                Node::Mapping(content.iter().map(|c| self.import(other, *c)).collect())
            }
            Node::Sequence(items) => {
                Node::Sequence(items.iter().map(|c| self.import(other, *c)).collect())
            }
            Node::Alias(_) => Node::Scalar(Scalar::null()),
        };
        self.add(node)
    }

    /// Deep equality between `a` in this document and `b` in `other`.
    /// Mapping key order is ignored and numbers compare by value.
    pub fn structural_eq(&self, a: NodeId, other: &Document, b: NodeId) -> bool {
        match (self.get(self.resolve(a)), other.get(other.resolve(b))) {
            (Node::Scalar(x), Node::Scalar(y)) => x.same_value(y),
            (Node::Document(x), Node::Document(y)) | (Node::Sequence(x), Node::Sequence(y)) => {
                x.len() == y.len()
                    && x.iter().zip(y).all(|(i, j)| self.structural_eq(*i, other, *j))
            }
            (Node::Mapping(x), Node::Mapping(y)) => {
                x.len() == y.len()
                    && self.mapping_pairs(a).all(|(key, value)| {
                        other.mapping_pairs(b).any(|(okey, ovalue)| {
                            self.structural_eq(key, other, okey)
                                && self.structural_eq(value, other, ovalue)
                        })
                    })
            }
            _ => false,
        }
    }
}
