//! Client for the repository-hosting API
//!
//! The `RepositoryHost` trait abstracts the remote API surface the
//! analytics engine consumes; `GitHubClient` is the production
//! implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use repolens_core::{
    ContributorStat, ErrorContext, IssueRecord, RepoInfo, RepolensError, RepolensResult,
};

pub mod github;

pub use github::GitHubClient;

/// Page size used when walking paginated listings
pub const PAGE_SIZE: u64 = 100;

/// A commit as listed by the hosting API, before aggregation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCommit {
    pub sha: String,
    /// Author login; absent when the commit is not linked to an account
    pub author: Option<String>,
    pub date: DateTime<Utc>,
    pub message: String,
}

/// Issue listing filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
        }
    }
}

/// Configuration for the hosting API client
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Access token for authentication
    pub access_token: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl HostConfig {
    /// Create a new configuration for GitHub
    pub fn github(access_token: String) -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            access_token,
            timeout_seconds: 30,
            user_agent: "repolens/0.1".to_string(),
        }
    }

    /// Override the API base URL (GitHub Enterprise, test servers)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }
}

/// Operations the analytics engine needs from the hosting API
///
/// Totals are best-effort: `None` means the provider could not tell us how
/// many items the listing holds, and callers must sample defensively.
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Fetch repository metadata
    async fn fetch_repository(&self, repo_name: &str) -> RepolensResult<RepoInfo>;

    /// Fetch contributors in provider order (contribution count descending)
    async fn fetch_contributors(
        &self,
        repo_name: &str,
        limit: usize,
    ) -> RepolensResult<Vec<ContributorStat>>;

    /// Best-effort total number of commits in a date window
    async fn count_commits(
        &self,
        repo_name: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> RepolensResult<Option<u64>>;

    /// Fetch one page of commits in a date window (1-based page index)
    async fn fetch_commit_page(
        &self,
        repo_name: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        page: u64,
    ) -> RepolensResult<Vec<RawCommit>>;

    /// Best-effort total number of issues in a state
    async fn count_issues(
        &self,
        repo_name: &str,
        state: IssueState,
    ) -> RepolensResult<Option<u64>>;

    /// Fetch one page of issues in a state (1-based page index)
    async fn fetch_issue_page(
        &self,
        repo_name: &str,
        state: IssueState,
        page: u64,
    ) -> RepolensResult<Vec<IssueRecord>>;

    /// Fetch per-language byte counts
    async fn fetch_languages(&self, repo_name: &str) -> RepolensResult<BTreeMap<String, u64>>;

    /// Verify the configured credentials, returning the authenticated login
    async fn verify_credentials(&self) -> RepolensResult<String>;
}

/// Build the HTTP client shared by all requests
pub(crate) fn create_http_client(config: &HostConfig) -> RepolensResult<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();

    let user_agent =
        reqwest::header::HeaderValue::from_str(&config.user_agent).map_err(|e| {
            RepolensError::Config {
                message: format!("Invalid user agent: {e}"),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?;
    headers.insert(reqwest::header::USER_AGENT, user_agent);

    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .default_headers(headers)
        .build()
        .map_err(|e| RepolensError::Config {
            message: format!("Failed to create HTTP client: {e}"),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })
}
