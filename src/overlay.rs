//! Overlay documents: ordered lists of targeted updates and removals.
//!
//! An overlay is read from YAML or JSON, applied to a document with
//! [`Overlay::apply_to`], and produced from two documents with [`compare`].
//!
//! ```yaml
//! overlay: 1.0.0
//! info:
//!   title: Drop internal paths
//!   version: 0.0.1
//! actions:
//!   - target: $.paths['/internal']
//!     remove: true
//!   - target: $.info
//!     update:
//!       x-owner: platform
//! ```

pub mod apply;
pub mod compare;
pub mod path;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::{
    evaluator::EvalError,
    parser::ParseError,
    tree::{Document, TreeError},
};

pub use compare::compare;

/// Overlay specification version written by [`Overlay::new`].
pub const OVERLAY_VERSION: &str = "1.0.0";

/// Errors raised while reading, applying or computing overlays.
#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("malformed overlay: {0}")]
    Malformed(#[from] serde_yaml::Error),

    #[error("invalid target '{target}': {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: ParseError,
    },

    #[error("failed to evaluate target '{target}': {source}")]
    Eval {
        target: String,
        #[source]
        source: EvalError,
    },

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("cannot compare an empty document")]
    EmptyDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    #[serde(rename = "overlay", deserialize_with = "deserialize_text")]
    pub version: String,
    pub info: Info,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    #[serde(deserialize_with = "deserialize_text")]
    pub version: String,
}

/// One targeted change.
///
/// `remove: true` wins over `update`. An action without `update` and
/// without `remove` does nothing; `update: null` is a real update.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub update: Option<serde_yaml::Value>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub remove: bool,
}

/// Maps a present key to `Some`, even when its value is `null`.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<serde_yaml::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_yaml::Value::deserialize(deserializer).map(Some)
}

/// Accepts scalars of any type as text, so `version: 1.0` reads as "1.0".
fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!("expected a version string, found {other:?}"))),
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Action {
    pub fn update(target: impl Into<String>, update: serde_yaml::Value) -> Self {
        Action {
            target: target.into(),
            update: Some(update),
            ..Action::default()
        }
    }

    pub fn remove(target: impl Into<String>) -> Self {
        Action {
            target: target.into(),
            remove: true,
            ..Action::default()
        }
    }
}

impl Overlay {
    /// An overlay with no actions.
    pub fn new(title: impl Into<String>) -> Self {
        Overlay {
            version: OVERLAY_VERSION.to_string(),
            info: Info {
                title: title.into(),
                version: "0.0.0".to_string(),
            },
            extends: None,
            actions: Vec::new(),
        }
    }

    /// Parses an overlay from YAML or JSON text.
    pub fn from_yaml_str(text: &str) -> Result<Self, OverlayError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn to_yaml_string(&self) -> Result<String, OverlayError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json_string_pretty(&self) -> Result<String, OverlayError> {
        serde_json::to_string_pretty(self).map_err(|e| OverlayError::Tree(TreeError::Json(e)))
    }

    /// Merges freshly computed actions into this overlay.
    ///
    /// A single new action aimed at the same target as the last existing
    /// action replaces it; otherwise the new actions are appended.
    pub fn extend_with(&mut self, other: Overlay) {
        if let [only] = other.actions.as_slice()
            && let Some(last) = self.actions.last_mut()
            && last.target == only.target
        {
            *last = only.clone();
            return;
        }
        self.actions.extend(other.actions);
    }
}

/// Applies `existing` to a copy of `original`, diffs the result against
/// `target`, and folds the difference back into `existing`.
pub fn calculate(original: &Document, target: &Document, existing: &Overlay) -> Result<Overlay, OverlayError> {
    let mut patched = original.clone();
    existing.apply_to(&mut patched)?;

    let fresh = compare(&existing.info.title, &patched, target)?;
    let mut merged = existing.clone();
    merged.extend_with(fresh);
    Ok(merged)
}

/// Applies overlay text to document text.
///
/// The result is pretty-printed JSON when the document looks like JSON, and
/// YAML otherwise.
pub fn apply_overlay(document: &str, overlay: &str) -> Result<String, OverlayError> {
    let mut doc = Document::from_yaml_str(document)?;
    let overlay = Overlay::from_yaml_str(overlay)?;
    overlay.apply_to(&mut doc)?;

    if looks_like_json(document) {
        Ok(doc.to_json_string_pretty()?)
    } else {
        Ok(doc.to_yaml_string()?)
    }
}

/// Computes the overlay turning `original` into `target`, on top of an
/// `existing` overlay (which may be empty text).
pub fn calculate_overlay(original: &str, target: &str, existing: &str) -> Result<String, OverlayError> {
    let original_doc = Document::from_yaml_str(original)?;
    let target_doc = Document::from_yaml_str(target)?;
    let existing = if existing.trim().is_empty() {
        Overlay::new("example overlay")
    } else {
        Overlay::from_yaml_str(existing)?
    };

    let overlay = calculate(&original_doc, &target_doc, &existing)?;
    if looks_like_json(original) {
        overlay.to_json_string_pretty()
    } else {
        overlay.to_yaml_string()
    }
}

pub(crate) fn looks_like_json(text: &str) -> bool {
    matches!(text.trim_start().chars().next(), Some('{' | '['))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_update_is_present() {
        let overlay = Overlay::from_yaml_str(
            "overlay: 1.0.0\ninfo: {title: t, version: v}\nactions:\n  - target: $.a\n    update: null\n  - target: $.b\n",
        )
        .unwrap();
        assert_eq!(overlay.actions[0].update, Some(serde_yaml::Value::Null));
        assert_eq!(overlay.actions[1].update, None);
    }

    #[test]
    fn test_extend_with_replaces_matching_last_action() {
        let mut existing = Overlay::new("t");
        existing.actions.push(Action::update("$.a", serde_yaml::Value::from(1)));

        let mut fresh = Overlay::new("t");
        fresh.actions.push(Action::update("$.a", serde_yaml::Value::from(2)));
        existing.extend_with(fresh);

        assert_eq!(existing.actions.len(), 1);
        assert_eq!(existing.actions[0].update, Some(serde_yaml::Value::from(2)));
    }

    #[test]
    fn test_extend_with_appends_otherwise() {
        let mut existing = Overlay::new("t");
        existing.actions.push(Action::update("$.a", serde_yaml::Value::from(1)));

        let mut fresh = Overlay::new("t");
        fresh.actions.push(Action::remove("$.b"));
        existing.extend_with(fresh);

        assert_eq!(existing.actions.len(), 2);
    }

    #[test]
    fn test_looks_like_json() {
        assert!(looks_like_json("  {\"a\": 1}"));
        assert!(!looks_like_json("a: 1"));
    }
}
