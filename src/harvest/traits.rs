//! Core types for the pictogram harvest.
//!
//! This module defines the data shared by every stage of the pipeline:
//! - The design document tree via [`DocumentNode`] and [`DocumentFile`]
//! - Per-icon records via [`Candidate`]
//! - Parsed description metadata via [`Description`]
//! - Non-fatal diagnostics via [`Diagnostics`]

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{error, warn};

use crate::harvest::metadata::{normalize_keywords, parse_description};
use crate::harvest::naming::resolve_file_name;

/// File extension of every downloaded pictogram.
pub const SVG_EXTENSION: &str = ".svg";

// ============================================================================
// Document Tree
// ============================================================================

/// Node type tags reported by the document service.
///
/// Only [`NodeKind::Component`] nodes become pictograms; every other kind is
/// a container that is traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Document,
    Canvas,
    Frame,
    Group,
    Section,
    ComponentSet,
    Component,
    Instance,
    #[serde(other)]
    Other,
}

/// A node of the design document tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentNode {
    /// Node identifier, unique within the file
    pub id: String,

    /// Display name (variant components encode `key=value` pairs here)
    pub name: String,

    /// Node type tag
    #[serde(rename = "type")]
    pub kind: NodeKind,

    /// Child nodes in document order
    #[serde(default)]
    pub children: Vec<DocumentNode>,
}

impl DocumentNode {
    /// Returns `true` for nodes excluded from traversal along with their subtree.
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('_')
    }

    pub fn is_component(&self) -> bool {
        self.kind == NodeKind::Component
    }
}

/// Descriptive metadata the document service keeps per component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentMetadata {
    #[serde(default)]
    pub key: String,

    #[serde(default)]
    pub name: String,

    /// Free-text description; pictograms store a JSON record here
    #[serde(default)]
    pub description: String,
}

/// Component id → component metadata side table.
pub type ComponentIndex = HashMap<String, ComponentMetadata>;

/// A fetched design document: the node tree plus its component side table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFile {
    pub document: DocumentNode,

    #[serde(default)]
    pub components: ComponentIndex,
}

/// Render URLs returned for one batch, in response order.
///
/// A `None` value means the service could not render that node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageUrls {
    #[serde(default)]
    pub err: Option<String>,

    #[serde(default)]
    pub images: IndexMap<String, Option<String>>,
}

// ============================================================================
// Description Metadata
// ============================================================================

/// Keywords as written in a description: one separated string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Keywords {
    Text(String),
    List(Vec<String>),
}

/// Structured metadata decoded from a component description.
///
/// Every field is optional; an undecodable description yields the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    /// Colored pictograms keep their own palette
    #[serde(default)]
    pub color: Option<bool>,

    #[serde(default)]
    pub scalable: Option<bool>,

    #[serde(default)]
    pub keywords: Option<Keywords>,
}

impl Description {
    pub fn is_color(&self) -> bool {
        self.color.unwrap_or(false)
    }
}

// ============================================================================
// Candidate
// ============================================================================

/// One pictogram before, during and after asset resolution.
///
/// All derived fields are computed once by [`Candidate::build`]; the only
/// later mutation is attaching the render URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Source node identifier
    pub id: String,

    /// Raw component name
    pub raw_name: String,

    /// Names from the top-level page down to the component itself
    pub path: Vec<String>,

    /// Resolved output file name, including the extension
    pub file_name: String,

    pub description: Description,

    /// Description keywords followed by every name on the path
    pub keywords: Vec<String>,

    /// Short-lived download URL, once resolved
    pub url: Option<String>,
}

impl Candidate {
    /// Builds a candidate from the node path ending at a component.
    ///
    /// `path` must be non-empty; its last node is the component. Description
    /// problems are recorded in `diagnostics` and never fail the build.
    pub fn build(
        path: &[&DocumentNode],
        components: &ComponentIndex,
        diagnostics: &mut Diagnostics,
    ) -> Option<Self> {
        let (component, ancestors) = path.split_last()?;
        let names: Vec<String> = path.iter().map(|n| n.name.clone()).collect();
        let path_display = names.join(" => ");

        let parent_name = ancestors.last().map(|n| n.name.as_str());
        let file_name = resolve_file_name(&component.name, parent_name);

        let description = parse_description(
            components.get(&component.id).map(|c| c.description.as_str()),
            &component.id,
            &path_display,
            diagnostics,
        );

        let mut keywords = normalize_keywords(description.keywords.as_ref());
        keywords.extend(names.iter().cloned());

        Some(Self {
            id: component.id.clone(),
            raw_name: component.name.clone(),
            path: names,
            file_name,
            description,
            keywords,
            url: None,
        })
    }

    /// A candidate is downloadable once both file name and URL are known.
    pub fn is_valid(&self) -> bool {
        !self.file_name.is_empty() && self.url.is_some()
    }

    /// File name without the `.svg` extension.
    pub fn stem(&self) -> &str {
        self.file_name
            .strip_suffix(SVG_EXTENSION)
            .unwrap_or(&self.file_name)
    }

    pub fn path_display(&self) -> String {
        self.path.join(" => ")
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Diagnostic severity. Both levels fail the run at the end; neither stops it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warn => f.write_str("warn"),
            Severity::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.severity, self.message)
    }
}

/// Ordered accumulator of non-fatal problems found during a run.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.entries.push(Diagnostic {
            severity: Severity::Warn,
            message,
        });
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("{}", message);
        self.entries.push(Diagnostic {
            severity: Severity::Error,
            message,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, name: &str, kind: NodeKind) -> DocumentNode {
        DocumentNode {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            children: vec![],
        }
    }

    #[test]
    fn test_candidate_build_collects_keywords_in_order() {
        let page = node("0:1", "Pictograms", NodeKind::Canvas);
        let set = node("1:1", "Navigation/Arrow", NodeKind::ComponentSet);
        let leaf = node("1:2", "direction=left, value=2", NodeKind::Component);

        let mut components = ComponentIndex::new();
        components.insert(
            "1:2".to_string(),
            ComponentMetadata {
                description: r#"{"color":true,"keywords":"move, back"}"#.to_string(),
                ..Default::default()
            },
        );

        let mut diagnostics = Diagnostics::new();
        let candidate = Candidate::build(&[&page, &set, &leaf], &components, &mut diagnostics)
            .expect("non-empty path");

        assert!(diagnostics.is_empty());
        assert_eq!(candidate.id, "1:2");
        assert_eq!(candidate.file_name, "arrow-2-left.svg");
        assert_eq!(candidate.stem(), "arrow-2-left");
        assert!(candidate.description.is_color());
        assert_eq!(
            candidate.keywords,
            vec![
                "move",
                "back",
                "Pictograms",
                "Navigation/Arrow",
                "direction=left, value=2"
            ]
        );
        assert_eq!(
            candidate.path_display(),
            "Pictograms => Navigation/Arrow => direction=left, value=2"
        );
        assert!(!candidate.is_valid());
    }

    #[test]
    fn test_candidate_build_empty_path() {
        let mut diagnostics = Diagnostics::new();
        assert!(Candidate::build(&[], &ComponentIndex::new(), &mut diagnostics).is_none());
    }

    #[test]
    fn test_candidate_valid_once_url_attached() {
        let leaf = node("2:1", "Home", NodeKind::Component);
        let mut diagnostics = Diagnostics::new();
        let mut candidate =
            Candidate::build(&[&leaf], &ComponentIndex::new(), &mut diagnostics).unwrap();

        // Missing description is a warning
        assert_eq!(diagnostics.count(Severity::Warn), 1);
        assert!(!candidate.is_valid());

        candidate.url = Some("https://cdn.example.com/home.svg".to_string());
        assert!(candidate.is_valid());
    }

    #[test]
    fn test_node_kind_deserialization() {
        let json = r#"{"id":"1","name":"x","type":"COMPONENT_SET","children":[
            {"id":"2","name":"y","type":"COMPONENT"},
            {"id":"3","name":"z","type":"VECTOR"}
        ]}"#;
        let node: DocumentNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.kind, NodeKind::ComponentSet);
        assert_eq!(node.children[0].kind, NodeKind::Component);
        assert_eq!(node.children[1].kind, NodeKind::Other);
        assert!(node.children[1].children.is_empty());
    }

    #[test]
    fn test_diagnostics_display_and_count() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn("first");
        diagnostics.error("second");

        let lines: Vec<String> = diagnostics.iter().map(|d| d.to_string()).collect();
        assert_eq!(lines, vec!["warn first", "error second"]);
        assert_eq!(diagnostics.count(Severity::Error), 1);
        assert_eq!(diagnostics.len(), 2);
    }
}
