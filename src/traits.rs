use crate::harvest::traits::{DocumentFile, ImageUrls};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Failed to decode response: {0}")]
    Decode(String),
    #[error("Service reported an error: {0}")]
    Api(String),
}

/// Raw response of an asset download.
#[derive(Debug, Clone)]
pub struct FetchedAsset {
    pub status: u16,
    pub body: String,
}

impl FetchedAsset {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The design document service (file tree and render URLs).
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetches the document tree together with its component side table.
    async fn file(&self) -> Result<DocumentFile, SourceError>;

    /// Requests short-lived SVG render URLs for the given node ids.
    ///
    /// A non-success status or a service-reported `err` is returned as `Err`.
    async fn image_urls(&self, ids: &[String]) -> Result<ImageUrls, SourceError>;
}

/// Fetches raw asset content. Non-success statuses are returned, not raised.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedAsset, SourceError>;
}

/// A new issue to file in the tracker.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub assignees: Vec<String>,
}

#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Files the issue and returns its URL when the tracker reports one.
    async fn create_issue(&self, issue: &NewIssue) -> Result<Option<String>, SourceError>;
}
