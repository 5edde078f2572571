//! Failure reporting to the issue tracker.
//!
//! When a run fails, one issue is filed, assigned to the repository's global
//! code owners, with the error and every accumulated diagnostic in the body.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{info, instrument};

use crate::figma::success_body;
use crate::harvest::traits::Diagnostics;
use crate::traits::{IssueTracker, NewIssue, SourceError};

pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";

pub const FAILURE_ISSUE_TITLE: &str = "Icon Release Failure";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to read code owners from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Missing global code owners in CODEOWNERS file")]
    MissingCodeOwners,
    #[error("Invalid repository slug '{0}', expected 'owner/repo'")]
    InvalidRepository(String),
    #[error("Failed to create issue: {0}")]
    Tracker(#[from] SourceError),
}

/// Returns the owners on the first `*` line of a CODEOWNERS file.
///
/// # Errors
///
/// Returns [`ReportError::MissingCodeOwners`] when there is no such line or
/// it lists nobody.
pub fn parse_code_owners(content: &str) -> Result<Vec<String>, ReportError> {
    let owners: Vec<String> = content
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with('*'))
        .map(|line| {
            line[1..]
                .split([' ', '@'])
                .filter(|owner| !owner.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if owners.is_empty() {
        Err(ReportError::MissingCodeOwners)
    } else {
        Ok(owners)
    }
}

pub fn read_code_owners(path: &Path) -> Result<Vec<String>, ReportError> {
    let content = std::fs::read_to_string(path).map_err(|source| ReportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_code_owners(&content)
}

/// Composes the failure issue for `error` and the run's diagnostics.
pub fn failure_issue(
    error: &dyn std::fmt::Display,
    diagnostics: &Diagnostics,
    assignees: Vec<String>,
) -> NewIssue {
    let details: Vec<String> = diagnostics.iter().map(ToString::to_string).collect();
    NewIssue {
        title: FAILURE_ISSUE_TITLE.to_string(),
        body: format!(
            "Icon extraction failed due to: {error}\n\n{}",
            details.join("\n")
        ),
        assignees,
    }
}

/// GitHub issues client for one repository.
#[derive(Debug, Clone)]
pub struct GitHubIssues {
    http: Client,
    base_url: String,
    owner: String,
    repo: String,
    token: String,
}

impl GitHubIssues {
    /// Creates a client for `slug` (`owner/repo`).
    pub fn new(http: Client, slug: &str, token: impl Into<String>) -> Result<Self, ReportError> {
        let (owner, repo) = slug
            .split_once('/')
            .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty())
            .ok_or_else(|| ReportError::InvalidRepository(slug.to_string()))?;

        Ok(Self {
            http,
            base_url: DEFAULT_GITHUB_API.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            token: token.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Deserialize)]
struct CreatedIssue {
    html_url: Option<String>,
}

#[async_trait]
impl IssueTracker for GitHubIssues {
    #[instrument(skip_all, fields(repo = %format!("{}/{}", self.owner, self.repo)))]
    async fn create_issue(&self, issue: &NewIssue) -> Result<Option<String>, SourceError> {
        let response = self
            .http
            .post(format!(
                "{}/repos/{}/{}/issues",
                self.base_url, self.owner, self.repo
            ))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(issue)
            .send()
            .await?;

        let body = success_body(response).await?;
        let created: CreatedIssue =
            serde_json::from_str(&body).map_err(|e| SourceError::Decode(e.to_string()))?;
        info!(url = created.html_url.as_deref().unwrap_or("-"), "Filed failure issue");
        Ok(created.html_url)
    }
}

/// Files the failure issue for a run that ended with `error`.
pub async fn report_failure(
    tracker: &dyn IssueTracker,
    code_owners: &Path,
    error: &dyn std::fmt::Display,
    diagnostics: &Diagnostics,
) -> Result<Option<String>, ReportError> {
    let assignees = read_code_owners(code_owners)?;
    let issue = failure_issue(error, diagnostics, assignees);
    Ok(tracker.create_issue(&issue).await?)
}
