//! Run configuration.
//!
//! The CLI fills these structs from flags and environment variables; library
//! callers can build them directly.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::figma::DEFAULT_FIGMA_API;
use crate::harvest::batch::DEFAULT_BATCH_SIZE;
use crate::model::MANIFEST_FILE_NAME;
use crate::report::DEFAULT_GITHUB_API;

pub const ENV_FIGMA_FILE_ID: &str = "FIGMA_FILE_ID";
pub const ENV_FIGMA_TOKEN: &str = "FIGMA_TOKEN";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_GITHUB_REPOSITORY: &str = "GITHUB_REPOSITORY";

pub const DEFAULT_OUTPUT_DIR: &str = "pictograms";
pub const DEFAULT_PACKAGE_JSON: &str = "package.json";
pub const DEFAULT_CODE_OWNERS: &str = ".github/CODEOWNERS";

/// Configuration of an extraction run.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Design document file identifier
    pub file_id: String,

    /// Design document access token
    pub figma_token: String,

    pub figma_api: String,

    /// Node ids per render URL request
    pub batch_size: usize,

    /// Directory receiving pictograms and the manifest
    pub output_dir: PathBuf,

    /// `package.json` providing the manifest version
    pub package_json: PathBuf,

    /// Per-request timeout; `None` waits indefinitely
    pub request_timeout: Option<Duration>,

    /// Failure reporting, if enabled
    pub report: Option<ReportConfig>,
}

impl ExtractConfig {
    pub fn new(file_id: impl Into<String>, figma_token: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            figma_token: figma_token.into(),
            figma_api: DEFAULT_FIGMA_API.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            package_json: PathBuf::from(DEFAULT_PACKAGE_JSON),
            request_timeout: None,
            report: None,
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(MANIFEST_FILE_NAME)
    }
}

/// Where and as whom failure issues are filed.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub github_token: String,

    /// `owner/repo`
    pub repository: String,

    pub github_api: String,

    pub code_owners: PathBuf,
}

impl ReportConfig {
    pub fn new(github_token: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            github_token: github_token.into(),
            repository: repository.into(),
            github_api: DEFAULT_GITHUB_API.to_string(),
            code_owners: PathBuf::from(DEFAULT_CODE_OWNERS),
        }
    }
}

/// Configuration of an export generation run.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub manifest: PathBuf,

    /// Defaults to the manifest's directory
    pub output_dir: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            manifest: Path::new(DEFAULT_OUTPUT_DIR).join(MANIFEST_FILE_NAME),
            output_dir: None,
        }
    }
}

impl ExportConfig {
    pub fn output_dir(&self) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.clone(),
            None => self
                .manifest
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        }
    }
}
