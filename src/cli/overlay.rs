//! Apply and compute overlays from files

use std::{fs, path::PathBuf};

use super::CliError;
use crate::{
    Document,
    overlay::{self, Overlay, looks_like_json},
};

/// Options for the apply command
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Document text, JSON or YAML
    pub input: Option<String>,
    /// Overlay file to apply
    pub overlay: PathBuf,
}

/// Options for the compare command
#[derive(Debug, Clone, Default)]
pub struct CompareOptions {
    pub original: PathBuf,
    pub target: PathBuf,
    /// Overlay to build on; its actions are applied to the original first
    pub existing: Option<PathBuf>,
    /// Title for a new overlay; ignored when extending an existing one
    pub title: Option<String>,
}

/// Apply an overlay file to a document, returning the patched document
pub fn execute_apply(options: &ApplyOptions) -> Result<String, CliError> {
    let text = options.input.as_ref().ok_or(CliError::NoInput)?;
    let overlay_text = fs::read_to_string(&options.overlay)?;
    Ok(overlay::apply_overlay(text, &overlay_text)?)
}

/// Compute the overlay turning the original file into the target file
pub fn execute_compare(options: &CompareOptions) -> Result<String, CliError> {
    let original_text = fs::read_to_string(&options.original)?;
    let original = Document::from_yaml_str(&original_text)?;
    let target = Document::from_yaml_str(&fs::read_to_string(&options.target)?)?;

    let existing = match &options.existing {
        Some(path) => Overlay::from_yaml_str(&fs::read_to_string(path)?)?,
        None => Overlay::new(options.title.as_deref().unwrap_or("example overlay")),
    };

    let result = overlay::calculate(&original, &target, &existing)?;
    if looks_like_json(&original_text) {
        Ok(result.to_json_string_pretty()?)
    } else {
        Ok(result.to_yaml_string()?)
    }
}
