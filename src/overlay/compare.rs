use log::debug;

use crate::{
    convert,
    overlay::{
        Action, Overlay, OverlayError,
        path::{self, PathSegment},
    },
    tree::{Document, Node, NodeId},
};

/// Computes an overlay that turns `original` into `target`.
///
/// The two trees are walked side by side, pairing mapping members by key and
/// sequence elements by position. Keys and trailing elements missing from
/// `target` become removals; everything else that differs becomes an update,
/// coalesced at the shallowest path that still reproduces `target`.
///
/// # Examples
///
/// ```
/// use jsonpath_overlay::{overlay::compare, tree::Document};
///
/// let original = Document::from_yaml_str("{a: 1}").unwrap();
/// let target = Document::from_yaml_str("{a: 2}").unwrap();
/// let overlay = compare("bump", &original, &target).unwrap();
///
/// assert_eq!(overlay.actions.len(), 1);
/// assert_eq!(overlay.actions[0].target, "$.a");
/// ```
pub fn compare(title: &str, original: &Document, target: &Document) -> Result<Overlay, OverlayError> {
    let (Some(a), Some(b)) = (original.content_root(), target.content_root()) else {
        return Err(OverlayError::EmptyDocument);
    };

    let mut walker = Walker {
        original,
        target,
        actions: Vec::new(),
    };
    if let Some(change) = walker.walk(&[], a, b) {
        walker.flush(&[], change);
    }

    let mut overlay = Overlay::new(title);
    overlay.actions = walker.actions;
    Ok(overlay)
}

/// A pending difference at some path, not yet turned into an action.
enum Change {
    /// Replace with the target node
    Replace(NodeId),
    /// Append these target sequence elements
    Append(Vec<NodeId>),
    /// Merge member changes into a mapping
    Merge(Vec<Entry>),
}

struct Entry {
    key: String,
    /// Key node in `target`, so the fragment keeps the key's scalar type
    key_node: NodeId,
    change: Change,
    /// Whether the key already exists in the original mapping
    existing: bool,
}

struct Walker<'a> {
    original: &'a Document,
    target: &'a Document,
    actions: Vec<Action>,
}

impl Walker<'_> {
    fn walk(&mut self, at: &[PathSegment], a: NodeId, b: NodeId) -> Option<Change> {
        let (original, target) = (self.original, self.target);
        let a = original.resolve(a);
        let b = target.resolve(b);

        match (original.get(a), target.get(b)) {
            (Node::Scalar(x), Node::Scalar(y)) => (!x.same_value(y)).then_some(Change::Replace(b)),
            (Node::Mapping(_), Node::Mapping(_)) => self.walk_mapping(at, a, b),
            (Node::Sequence(x), Node::Sequence(y)) => self.walk_sequence(at, x, y),
            _ => Some(Change::Replace(b)),
        }
    }

    fn walk_mapping(&mut self, at: &[PathSegment], a: NodeId, b: NodeId) -> Option<Change> {
        let original = self.original;
        let target = self.target;
        let key_text = |doc: &Document, key: NodeId| doc.scalar_at(key).map(|s| s.value.clone());

        for (key, _) in original.mapping_pairs(a) {
            if let Some(name) = key_text(original, key)
                && target.mapping_get(b, &name).is_none()
            {
                self.emit(Action::remove(path::to_target(&path::join(at, PathSegment::Field(name)))));
            }
        }

        let mut entries = Vec::new();
        for (key, value) in target.mapping_pairs(b) {
            let Some(name) = key_text(target, key) else {
                continue;
            };
            match original.mapping_get(a, &name) {
                Some(before) => {
                    let child = path::join(at, PathSegment::Field(name.clone()));
                    if let Some(change) = self.walk(&child, before, value) {
                        entries.push(Entry {
                            key: name,
                            key_node: key,
                            change,
                            existing: true,
                        });
                    }
                }
                None => entries.push(Entry {
                    key: name,
                    key_node: key,
                    change: Change::Replace(value),
                    existing: false,
                }),
            }
        }

        (!entries.is_empty()).then_some(Change::Merge(entries))
    }

    /// Element differences are emitted right away at their index. Surplus
    /// original elements are removed from the back; surplus target elements
    /// are returned as an append.
    fn walk_sequence(&mut self, at: &[PathSegment], a: &[NodeId], b: &[NodeId]) -> Option<Change> {
        for (i, (before, after)) in a.iter().zip(b).enumerate() {
            let child = path::join(at, PathSegment::Index(i));
            if let Some(change) = self.walk(&child, *before, *after) {
                self.flush(&child, change);
            }
        }

        for i in (b.len()..a.len()).rev() {
            self.emit(Action::remove(path::to_target(&path::join(at, PathSegment::Index(i)))));
        }

        (b.len() > a.len()).then(|| Change::Append(b[a.len()..].to_vec()))
    }

    /// Turns a pending change into an action. A merge touching a single
    /// existing key is pushed down to that key.
    fn flush(&mut self, at: &[PathSegment], change: Change) {
        match change {
            Change::Merge(mut entries) if entries.len() == 1 && entries[0].existing => {
                let Entry { key, change, .. } = entries.remove(0);
                self.flush(&path::join(at, PathSegment::Field(key)), change);
            }
            change => {
                let fragment = self.fragment(&change);
                self.emit(Action::update(path::to_target(at), fragment));
            }
        }
    }

    fn fragment(&self, change: &Change) -> serde_yaml::Value {
        match change {
            Change::Replace(id) => convert::to_yaml_value(self.target, *id),
            Change::Append(items) => serde_yaml::Value::Sequence(
                items
                    .iter()
                    .map(|id| convert::to_yaml_value(self.target, *id))
                    .collect(),
            ),
            Change::Merge(entries) => {
                let mut map = serde_yaml::Mapping::new();
                for entry in entries {
                    map.insert(
                        convert::to_yaml_value(self.target, entry.key_node),
                        self.fragment(&entry.change),
                    );
                }
                serde_yaml::Value::Mapping(map)
            }
        }
    }

    fn emit(&mut self, action: Action) {
        debug!(
            "compare: {} {}",
            if action.remove { "remove" } else { "update" },
            action.target
        );
        self.actions.push(action);
    }
}
