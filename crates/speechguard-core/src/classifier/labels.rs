//! Label set loading
//!
//! YOLO classification exports store their class names in the ONNX metadata
//! under `names`, formatted as a Python dict literal:
//! `{0: 'human', 1: 'nonhuman'}`. A plain text file with one label per line
//! can be supplied instead and takes precedence.

use std::collections::HashSet;
use std::path::Path;

use super::error::{ClassifierError, Result};

/// Metadata key holding the class names
pub const NAMES_METADATA_KEY: &str = "names";

/// Read a labels file (one label per line, blank lines ignored)
pub fn load_labels_file(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| ClassifierError::model_load(path, format!("cannot read labels file: {}", e)))?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Parse a `{index: 'name', ...}` dict literal into labels ordered by index
///
/// Indices must cover `0..n` exactly once.
pub fn parse_names(raw: &str) -> std::result::Result<Vec<String>, String> {
    let body = raw
        .trim()
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .ok_or_else(|| format!("names metadata is not a dict literal: {:?}", raw))?;

    let mut entries: Vec<(usize, String)> = Vec::new();
    for entry in split_top_level(body) {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (index, name) = entry
            .split_once(':')
            .ok_or_else(|| format!("malformed names entry: {:?}", entry))?;
        let index: usize = index
            .trim()
            .trim_matches(|c| c == '\'' || c == '"')
            .parse()
            .map_err(|_| format!("non-numeric class index in {:?}", entry))?;
        entries.push((index, unquote(name.trim())));
    }

    entries.sort_by_key(|(index, _)| *index);
    for (expected, (index, _)) in entries.iter().enumerate() {
        if *index != expected {
            return Err(format!("class indices are not contiguous: missing {}", expected));
        }
    }

    Ok(entries.into_iter().map(|(_, name)| name).collect())
}

/// Check that labels are non-empty, unique and match the model's output width
pub fn validate_labels(labels: &[String], output_width: Option<usize>) -> Result<()> {
    if labels.is_empty() {
        return Err(ClassifierError::ModelSchema("model declares no labels".to_string()));
    }

    let mut seen = HashSet::with_capacity(labels.len());
    if let Some(dup) = labels.iter().find(|label| !seen.insert(label.as_str())) {
        return Err(ClassifierError::ModelSchema(format!("duplicate label {:?}", dup)));
    }

    if let Some(width) = output_width {
        if width != labels.len() {
            return Err(ClassifierError::ModelSchema(format!(
                "{} labels but model outputs {} probabilities",
                labels.len(),
                width
            )));
        }
    }

    Ok(())
}

/// Split on commas that are not inside quotes
fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in body.char_indices() {
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, ',') => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}

fn unquote(s: &str) -> String {
    for q in ['\'', '"'] {
        if let Some(inner) = s.strip_prefix(q).and_then(|r| r.strip_suffix(q)) {
            return inner.to_string();
        }
    }
    s.to_string()
}
