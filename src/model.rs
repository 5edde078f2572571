use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::harvest::traits::Candidate;

/// File name of the manifest inside the output directory.
pub const MANIFEST_FILE_NAME: &str = "index.json";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Missing \"version\" in {0}")]
    MissingVersion(String),
}

/// Index of every released pictogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    #[serde(alias = "picto")]
    pub pictograms: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// File name without extension
    pub name: String,
    #[serde(default)]
    pub color: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scalable: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<&Candidate> for ManifestEntry {
    fn from(candidate: &Candidate) -> Self {
        Self {
            name: candidate.stem().to_string(),
            color: candidate.description.is_color(),
            scalable: candidate.description.scalable,
            tags: candidate.keywords.clone(),
        }
    }
}

impl Manifest {
    /// Builds the manifest from every valid candidate, in order.
    pub fn from_candidates(version: impl Into<String>, candidates: &[Candidate]) -> Self {
        Self {
            version: version.into(),
            pictograms: candidates
                .iter()
                .filter(|c| c.is_valid())
                .map(ManifestEntry::from)
                .collect(),
        }
    }

    pub fn read(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ManifestError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    /// Writes the manifest as pretty-printed JSON, replacing any previous file.
    pub fn write(&self, path: &Path) -> Result<(), ManifestError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ManifestError::Json {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Reads the `version` field of a `package.json`.
pub fn read_package_version(path: &Path) -> Result<String, ManifestError> {
    #[derive(Deserialize)]
    struct PackageJson {
        version: Option<String>,
    }

    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let package: PackageJson =
        serde_json::from_str(&content).map_err(|source| ManifestError::Json {
            path: path.display().to_string(),
            source,
        })?;
    package
        .version
        .ok_or_else(|| ManifestError::MissingVersion(path.display().to_string()))
}
