//! HTTP clients for the design document service and asset hosts.

use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::harvest::traits::{DocumentFile, ImageUrls};
use crate::traits::{AssetFetcher, DocumentSource, FetchedAsset, SourceError};

pub const DEFAULT_FIGMA_API: &str = "https://api.figma.com";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Builds the shared HTTP client. Without `timeout` requests never time out.
pub fn build_http_client(timeout: Option<Duration>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder().user_agent(USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// Figma REST API client bound to one file.
#[derive(Debug, Clone)]
pub struct FigmaClient {
    http: Client,
    base_url: String,
    file_id: String,
    token: String,
}

impl FigmaClient {
    pub fn new(http: Client, file_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http,
            base_url: DEFAULT_FIGMA_API.to_string(),
            file_id: file_id.into(),
            token: token.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl DocumentSource for FigmaClient {
    #[instrument(skip(self), fields(file = %self.file_id))]
    async fn file(&self) -> Result<DocumentFile, SourceError> {
        let response = self
            .http
            .get(format!("{}/v1/files/{}", self.base_url, self.file_id))
            .header("X-Figma-Token", &self.token)
            .send()
            .await?;

        let body = success_body(response).await?;
        serde_json::from_str(&body).map_err(|e| SourceError::Decode(e.to_string()))
    }

    #[instrument(skip(self, ids), fields(file = %self.file_id, ids = ids.len()))]
    async fn image_urls(&self, ids: &[String]) -> Result<ImageUrls, SourceError> {
        let response = self
            .http
            .get(format!("{}/v1/images/{}", self.base_url, self.file_id))
            .header("X-Figma-Token", &self.token)
            .query(&[("ids", ids.join(",").as_str()), ("format", "svg")])
            .send()
            .await?;

        let body = success_body(response).await?;
        let urls: ImageUrls =
            serde_json::from_str(&body).map_err(|e| SourceError::Decode(e.to_string()))?;

        match urls.err {
            Some(err) => Err(SourceError::Api(err)),
            None => {
                debug!(images = urls.images.len(), "Render URLs received");
                Ok(urls)
            }
        }
    }
}

/// Plain GET fetcher for rendered assets.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedAsset, SourceError> {
        let response = self.http.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(FetchedAsset { status, body })
    }
}

/// Returns the body of a successful response, or the status as an error.
pub(crate) async fn success_body(response: Response) -> Result<String, SourceError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        Ok(body)
    } else {
        let reason = status.canonical_reason().unwrap_or("Unknown");
        Err(SourceError::Status {
            status: status.as_u16(),
            message: if body.is_empty() {
                reason.to_string()
            } else {
                format!("{reason}: {body}")
            },
        })
    }
}
