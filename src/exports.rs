//! Export module generation.
//!
//! Turns a pictogram manifest into three JavaScript entry points that map a
//! PascalCase identifier to each pictogram name:
//! - `index.cjs` (CommonJS object)
//! - `index.mjs` (ES module constants)
//! - `index.d.ts` (type declarations)
//!
//! Output depends only on the manifest, so regenerating from an unchanged
//! manifest is byte-identical.

use indexmap::IndexMap;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::info;

use crate::model::{Manifest, ManifestError};

pub const CJS_FILE_NAME: &str = "index.cjs";
pub const MJS_FILE_NAME: &str = "index.mjs";
pub const DTS_FILE_NAME: &str = "index.d.ts";

static HYPHEN_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*-\s*[A-Za-z0-9_]").expect("hyphen pattern is valid"));

/// Converts a pictogram name such as `arrow-2-left` into `Arrow2Left`.
pub fn pascal_case(name: &str) -> String {
    let joined = HYPHEN_WORD.replace_all(name, |caps: &Captures<'_>| {
        caps[0]
            .chars()
            .last()
            .map(|c| c.to_ascii_uppercase().to_string())
            .unwrap_or_default()
    });

    let mut chars = joined.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() || first == '_' => {
            std::iter::once(first.to_ascii_uppercase()).chain(chars).collect()
        }
        _ => joined.into_owned(),
    }
}

/// Identifier → pictogram name, in manifest order.
///
/// A colliding identifier keeps its first position and takes the later name.
pub fn identifier_map(manifest: &Manifest) -> IndexMap<String, String> {
    let mut map = IndexMap::with_capacity(manifest.pictograms.len());
    for entry in &manifest.pictograms {
        map.insert(pascal_case(&entry.name), entry.name.clone());
    }
    map
}

/// Rendered text of the three export files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifacts {
    pub cjs: String,
    pub mjs: String,
    pub dts: String,
}

impl ExportArtifacts {
    pub fn render(manifest: &Manifest) -> Self {
        let map = identifier_map(manifest);
        let version = &manifest.version;

        let cjs_values = join_lines(map.iter().map(|(id, name)| format!("  {id}: '{name}',")));
        let mjs_values = join_lines(
            map.iter()
                .map(|(id, name)| format!("export const {id} = '{name}';")),
        );
        let dts_values = join_lines(map.keys().map(|id| format!("export const {id}: string;")));

        Self {
            cjs: format!("module.exports = {{\n  VERSION: '{version}',\n{cjs_values}\n}};\n"),
            mjs: format!("export const VERSION = '{version}';\n{mjs_values}\n"),
            dts: format!("export const VERSION: string;\n{dts_values}\n"),
        }
    }

    /// Writes the three files into `dir` and returns their paths.
    pub fn write(&self, dir: &Path) -> Result<[PathBuf; 3], ManifestError> {
        let files = [
            (dir.join(CJS_FILE_NAME), &self.cjs),
            (dir.join(MJS_FILE_NAME), &self.mjs),
            (dir.join(DTS_FILE_NAME), &self.dts),
        ];
        for (path, content) in &files {
            std::fs::write(path, content).map_err(|source| ManifestError::Io {
                path: path.display().to_string(),
                source,
            })?;
        }
        let [(cjs, _), (mjs, _), (dts, _)] = files;
        Ok([cjs, mjs, dts])
    }
}

/// Reads the manifest at `manifest_path` and writes the export files into
/// `output_dir`.
pub fn generate_exports(
    manifest_path: &Path,
    output_dir: &Path,
) -> Result<[PathBuf; 3], ManifestError> {
    let manifest = Manifest::read(manifest_path)?;
    let paths = ExportArtifacts::render(&manifest).write(output_dir)?;
    info!(
        pictograms = manifest.pictograms.len(),
        version = %manifest.version,
        dir = %output_dir.display(),
        "Generated export modules"
    );
    Ok(paths)
}

fn join_lines(lines: impl Iterator<Item = String>) -> String {
    lines.collect::<Vec<_>>().join("\n")
}
