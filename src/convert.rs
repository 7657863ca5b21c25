//! serde value <-> document tree conversion utilities

use crate::tree::{Document, Node, NodeId, Scalar, ScalarTag, TreeError};

/// Convert a serde_yaml::Value into a new document
pub fn document_from_yaml(value: &serde_yaml::Value) -> Document {
    let mut doc = Document::new();
    let root = insert_yaml(&mut doc, value);
    doc.set_root(root);
    doc
}

/// Convert a serde_json::Value into a new document
pub fn document_from_json(value: &serde_json::Value) -> Document {
    let mut doc = Document::new();
    let root = insert_json(&mut doc, value);
    doc.set_root(root);
    doc
}

/// Add a serde_yaml::Value to `doc` as a detached subtree
pub fn insert_yaml(doc: &mut Document, value: &serde_yaml::Value) -> NodeId {
    use serde_yaml::Value;

    match value {
        Value::Null => doc.scalar(Scalar::null()),
        Value::Bool(b) => doc.scalar(Scalar::bool(*b)),
        Value::Number(n) => {
            let tag = if n.is_i64() || n.is_u64() {
                ScalarTag::Int
            } else {
                ScalarTag::Float
            };
            doc.scalar(Scalar {
                tag,
                value: n.to_string(),
            })
        }
        Value::String(s) => doc.scalar(Scalar::str(s.as_str())),
        Value::Sequence(items) => {
            let ids = items.iter().map(|item| insert_yaml(doc, item)).collect();
            doc.sequence(ids)
        }
        Value::Mapping(map) => {
            let pairs = map
                .iter()
                .map(|(k, v)| (insert_yaml(doc, k), insert_yaml(doc, v)))
                .collect();
            doc.mapping(pairs)
        }
        Value::Tagged(tagged) => insert_yaml(doc, &tagged.value),
    }
}

/// Add a serde_json::Value to `doc` as a detached subtree
pub fn insert_json(doc: &mut Document, value: &serde_json::Value) -> NodeId {
    use serde_json::Value;

    match value {
        Value::Null => doc.scalar(Scalar::null()),
        Value::Bool(b) => doc.scalar(Scalar::bool(*b)),
        Value::Number(n) => {
            let tag = if n.is_i64() || n.is_u64() {
                ScalarTag::Int
            } else {
                ScalarTag::Float
            };
            doc.scalar(Scalar {
                tag,
                value: n.to_string(),
            })
        }
        Value::String(s) => doc.scalar(Scalar::str(s.as_str())),
        Value::Array(items) => {
            let ids = items.iter().map(|item| insert_json(doc, item)).collect();
            doc.sequence(ids)
        }
        Value::Object(map) => {
            let pairs = map
                .iter()
                .map(|(k, v)| {
                    let key = doc.scalar(Scalar::str(k.as_str()));
                    (key, insert_json(doc, v))
                })
                .collect();
            doc.mapping(pairs)
        }
    }
}

/// Convert the subtree at `id` into a serde_yaml::Value
pub fn to_yaml_value(doc: &Document, id: NodeId) -> serde_yaml::Value {
    use serde_yaml::Value;

    match doc.get(doc.resolve(id)) {
        Node::Scalar(scalar) => match scalar.tag {
            ScalarTag::Null => Value::Null,
            ScalarTag::Bool => Value::Bool(scalar.value == "true"),
            ScalarTag::Int => match (scalar.value.parse::<i64>(), scalar.value.parse::<u64>()) {
                (Ok(i), _) => Value::Number(i.into()),
                (_, Ok(u)) => Value::Number(u.into()),
                _ => float_or_string(scalar),
            },
            ScalarTag::Float => float_or_string(scalar),
            ScalarTag::Str => Value::String(scalar.value.clone()),
        },
        Node::Sequence(items) => {
            Value::Sequence(items.iter().map(|item| to_yaml_value(doc, *item)).collect())
        }
        Node::Mapping(_) => {
            let mut map = serde_yaml::Mapping::new();
            for (k, v) in doc.mapping_pairs(id) {
                map.insert(to_yaml_value(doc, k), to_yaml_value(doc, v));
            }
            Value::Mapping(map)
        }
        Node::Document(content) => match content.first() {
            Some(inner) => to_yaml_value(doc, *inner),
            None => Value::Null,
        },
        Node::Alias(_) => Value::Null,
    }
}

fn float_or_string(scalar: &Scalar) -> serde_yaml::Value {
    match scalar.as_f64() {
        Some(f) => serde_yaml::Value::Number(f.into()),
        None => serde_yaml::Value::String(scalar.value.clone()),
    }
}

/// Convert the subtree at `id` into a serde_json::Value
///
/// Non-finite floats become `null`; mapping keys must be scalars.
pub fn to_json_value(doc: &Document, id: NodeId) -> Result<serde_json::Value, TreeError> {
    use serde_json::Value;

    Ok(match doc.get(doc.resolve(id)) {
        Node::Scalar(scalar) => match scalar.tag {
            ScalarTag::Null => Value::Null,
            ScalarTag::Bool => Value::Bool(scalar.value == "true"),
            ScalarTag::Int => match (scalar.value.parse::<i64>(), scalar.value.parse::<u64>()) {
                (Ok(i), _) => Value::Number(i.into()),
                (_, Ok(u)) => Value::Number(u.into()),
                _ => json_float(scalar),
            },
            ScalarTag::Float => json_float(scalar),
            ScalarTag::Str => Value::String(scalar.value.clone()),
        },
        Node::Sequence(items) => Value::Array(
            items
                .iter()
                .map(|item| to_json_value(doc, *item))
                .collect::<Result<_, _>>()?,
        ),
        Node::Mapping(_) => {
            let mut map = serde_json::Map::new();
            for (k, v) in doc.mapping_pairs(id) {
                let key = match doc.get(doc.resolve(k)) {
                    Node::Scalar(scalar) => scalar.value.clone(),
                    other => return Err(TreeError::NonScalarKey(other.kind())),
                };
                map.insert(key, to_json_value(doc, v)?);
            }
            Value::Object(map)
        }
        Node::Document(content) => match content.first() {
            Some(inner) => to_json_value(doc, *inner)?,
            None => Value::Null,
        },
        Node::Alias(_) => Value::Null,
    })
}

fn json_float(scalar: &Scalar) -> serde_json::Value {
    scalar
        .as_f64()
        .and_then(serde_json::Number::from_f64)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}
