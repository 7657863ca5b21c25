use std::collections::HashMap;

use log::debug;

use crate::{
    config::Config,
    convert,
    overlay::{Action, Overlay, OverlayError},
    parser::parse_with_config,
    tree::{Document, Node, NodeId},
};

impl Overlay {
    /// Applies every action in order, mutating `doc` in place.
    ///
    /// Targets are evaluated against the document as left by the previous
    /// actions. The first failing action aborts; earlier actions stay
    /// applied.
    pub fn apply_to(&self, doc: &mut Document) -> Result<(), OverlayError> {
        for action in &self.actions {
            action.apply_to(doc)?;
        }
        Ok(())
    }
}

impl Action {
    pub fn apply_to(&self, doc: &mut Document) -> Result<(), OverlayError> {
        if self.target.is_empty() || (!self.remove && self.update.is_none()) {
            return Ok(());
        }

        let config = Config::default().with_property_name_extension();
        let query = parse_with_config(&self.target, config).map_err(|source| OverlayError::InvalidTarget {
            target: self.target.clone(),
            source,
        })?;
        let nodes = query.evaluate(doc).map_err(|source| OverlayError::Eval {
            target: self.target.clone(),
            source,
        })?;

        if self.remove {
            debug!("removing {} node(s) at {}", nodes.len(), self.target);
            let index = ParentIndex::build(doc);
            for node in nodes {
                remove_node(doc, &index, node);
            }
        } else if let Some(update) = &self.update {
            debug!("updating {} node(s) at {}", nodes.len(), self.target);
            let fragment = convert::document_from_yaml(update);
            if let Some(source) = fragment.content_root() {
                for node in nodes {
                    merge_node(doc, node, &fragment, source);
                }
            }
        }

        Ok(())
    }
}

/// Child-to-parent map over the whole tree, keys included.
struct ParentIndex(HashMap<NodeId, NodeId>);

impl ParentIndex {
    fn build(doc: &Document) -> Self {
        let mut parents = HashMap::new();
        let mut stack = vec![doc.root()];
        while let Some(id) = stack.pop() {
            for child in doc.get(id).children() {
                parents.insert(*child, id);
                stack.push(*child);
            }
        }
        ParentIndex(parents)
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.0.get(&id).copied()
    }
}

/// Detaches `node` from its parent. A mapping value takes its key with it
/// and a key takes its value.
fn remove_node(doc: &mut Document, index: &ParentIndex, node: NodeId) {
    let Some(parent) = index.parent(node) else {
        return;
    };

    match doc.get_mut(parent) {
        Node::Mapping(content) => {
            if let Some(i) = content.iter().position(|c| *c == node) {
                let key = i - i % 2;
                content.drain(key..key + 2);
            }
        }
        Node::Sequence(items) => {
            if let Some(i) = items.iter().position(|c| *c == node) {
                items.remove(i);
            }
        }
        _ => {}
    }
}

/// Deep-merges the fragment subtree at `source` into `target`.
///
/// Scalars are replaced, mappings merge key by key, sequences are appended
/// to, and a kind mismatch replaces the target outright.
fn merge_node(doc: &mut Document, target: NodeId, fragment: &Document, source: NodeId) {
    let target = doc.resolve(target);
    let source = fragment.resolve(source);

    match (doc.get(target), fragment.get(source)) {
        (Node::Scalar(_), Node::Scalar(scalar)) => {
            *doc.get_mut(target) = Node::Scalar(scalar.clone());
        }
        (Node::Mapping(_), Node::Mapping(_)) => {
            let pairs: Vec<_> = fragment.mapping_pairs(source).collect();
            for (key, value) in pairs {
                let existing = fragment
                    .scalar_at(key)
                    .and_then(|k| doc.mapping_get(target, &k.value));
                match existing {
                    Some(existing) => merge_node(doc, existing, fragment, value),
                    None => {
                        let key = doc.import(fragment, key);
                        let value = doc.import(fragment, value);
                        if let Node::Mapping(content) = doc.get_mut(target) {
                            content.extend([key, value]);
                        }
                    }
                }
            }
        }
        (Node::Sequence(_), Node::Sequence(items)) => {
            let copies: Vec<_> = items.iter().map(|item| doc.import(fragment, *item)).collect();
            if let Node::Sequence(content) = doc.get_mut(target) {
                content.extend(copies);
            }
        }
        _ => {
            let copy = doc.import(fragment, source);
            let node = doc.get(copy).clone();
            *doc.get_mut(target) = node;
        }
    }
}
