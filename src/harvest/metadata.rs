//! Description metadata decoding.
//!
//! Pictogram components keep a small JSON record in their description field,
//! e.g. `{"color": true, "scalable": false, "keywords": "arrow, back"}`.
//! Missing or malformed records degrade to [`Description::default`].

use crate::harvest::traits::{Description, Diagnostics, Keywords};

/// Decodes a component description, recording a warning when it is absent
/// or cannot be decoded.
pub fn parse_description(
    content: Option<&str>,
    id: &str,
    path_display: &str,
    diagnostics: &mut Diagnostics,
) -> Description {
    let content = match content {
        Some(c) if !c.is_empty() => c,
        _ => {
            diagnostics.warn(format!("No data for {id} in {path_display}"));
            return Description::default();
        }
    };

    match serde_json::from_str::<Description>(content) {
        Ok(description) => description,
        Err(e) => {
            tracing::debug!(id, error = %e, "Description is not a metadata record");
            diagnostics.warn(format!("Failed to parse {id} in {path_display}\n{content}"));
            Description::default()
        }
    }
}

/// Flattens description keywords into a list.
///
/// Strings are split on runs of commas and spaces; lists pass through.
pub fn normalize_keywords(keywords: Option<&Keywords>) -> Vec<String> {
    match keywords {
        None => Vec::new(),
        Some(Keywords::Text(text)) => text
            .split([',', ' '])
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Keywords::List(list)) => list.clone(),
    }
}
