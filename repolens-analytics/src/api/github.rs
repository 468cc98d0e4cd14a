//! GitHub API client implementation

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use repolens_core::{
    ContributorStat, ErrorContext, IssueRecord, RepoInfo, RepolensError, RepolensResult,
};

use super::{
    create_http_client, HostConfig, IssueState, RawCommit, RepositoryHost, PAGE_SIZE,
};

/// GitHub API client
pub struct GitHubClient {
    client: reqwest::Client,
    config: HostConfig,
}

/// GitHub repository response
#[derive(Debug, Deserialize)]
struct GitHubRepository {
    name: String,
    full_name: String,
    owner: GitHubAccount,
    description: Option<String>,
    html_url: String,
    stargazers_count: u64,
    forks_count: u64,
    watchers_count: u64,
    open_issues_count: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    language: Option<String>,
}

/// GitHub account reference
#[derive(Debug, Deserialize)]
struct GitHubAccount {
    login: String,
}

/// GitHub contributor list item
#[derive(Debug, Deserialize)]
struct GitHubContributor {
    login: String,
    id: u64,
    contributions: u64,
    html_url: String,
    avatar_url: String,
}

/// GitHub commit list item
#[derive(Debug, Deserialize)]
struct GitHubCommitItem {
    sha: String,
    author: Option<GitHubAccount>,
    commit: GitHubCommitDetail,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitDetail {
    author: GitHubCommitAuthor,
    message: String,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitAuthor {
    date: DateTime<Utc>,
}

/// GitHub issue list item
#[derive(Debug, Deserialize)]
struct GitHubIssueItem {
    number: u64,
    title: String,
    state: String,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
    user: Option<GitHubAccount>,
}

/// GitHub authenticated-user response
#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
}

impl GitHubClient {
    /// Create a new GitHub API client
    pub fn new(config: HostConfig) -> RepolensResult<Self> {
        let client = create_http_client(&config)?;

        info!("Created GitHub API client for {}", config.base_url);

        Ok(Self { client, config })
    }

    /// Create authorization headers
    fn auth_headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();

        if !self.config.access_token.is_empty() {
            if let Ok(auth_value) = reqwest::header::HeaderValue::from_str(&format!(
                "token {}",
                self.config.access_token
            )) {
                headers.insert(reqwest::header::AUTHORIZATION, auth_value);
            }
        }

        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github.v3+json"),
        );

        headers
    }

    /// Make a GET request, classifying upstream failure conditions
    async fn get_request(&self, endpoint: &str) -> RepolensResult<reqwest::Response> {
        let url = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );

        debug!("Making GitHub API request to: {}", url);

        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers())
            .send()
            .await
            .map_err(|e| RepolensError::Upstream {
                message: format!("Failed to make request to GitHub API: {e}"),
                source: Some(Box::new(e)),
                context: ErrorContext::new("github_client").with_operation("get_request"),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if self.is_rate_limited(&response) {
            return Err(self.rate_limit_error(&response));
        }

        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
            return Err(RepolensError::NotFound {
                resource: endpoint.to_string(),
                context: ErrorContext::new("github_client")
                    .with_operation("get_request")
                    .with_suggestion("Check the repository name and access permissions"),
            });
        }

        let body = response.text().await.unwrap_or_default();
        Err(RepolensError::Upstream {
            message: format!(
                "HTTP {} error for {}: {}",
                status.as_u16(),
                url,
                if body.is_empty() {
                    status.canonical_reason().unwrap_or("Unknown error")
                } else {
                    &body
                }
            ),
            source: None,
            context: ErrorContext::new("github_client")
                .with_operation("get_request")
                .with_suggestion(match status.as_u16() {
                    401 => "Check your access token",
                    403 => "Check repository permissions",
                    _ => "Check network connectivity and API status",
                }),
        })
    }

    /// GitHub reports quota exhaustion as 403/429 with a zeroed remaining header
    fn is_rate_limited(&self, response: &reqwest::Response) -> bool {
        let status = response.status();
        if status != reqwest::StatusCode::FORBIDDEN
            && status != reqwest::StatusCode::TOO_MANY_REQUESTS
        {
            return false;
        }

        response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == "0")
            .unwrap_or(status == reqwest::StatusCode::TOO_MANY_REQUESTS)
    }

    fn rate_limit_error(&self, response: &reqwest::Response) -> RepolensError {
        let reset_epoch = response
            .headers()
            .get("x-ratelimit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0);

        let wait_seconds = (reset_epoch - Utc::now().timestamp()).max(0);
        let wait_minutes = ((wait_seconds as f64 / 60.0) * 10.0).round() / 10.0;

        RepolensError::RateLimit {
            message: format!(
                "GitHub API rate limit exceeded. Please try again in {wait_minutes:.1} minutes."
            ),
            wait_minutes,
            context: ErrorContext::new("github_client")
                .with_operation("get_request")
                .with_suggestion("Wait for the quota to reset or use a different token"),
        }
    }

    /// Best-effort total count for a paginated listing
    ///
    /// Requests a single item and reads the `rel="last"` page number from
    /// the Link header; with one item per page that number is the total.
    /// A listing short enough to have no Link header is counted directly.
    async fn probe_total(&self, endpoint: &str) -> RepolensResult<Option<u64>> {
        let sep = if endpoint.contains('?') { '&' } else { '?' };
        let response = self
            .get_request(&format!("{endpoint}{sep}per_page=1"))
            .await?;

        if let Some(link) = response
            .headers()
            .get(reqwest::header::LINK)
            .and_then(|v| v.to_str().ok())
        {
            return Ok(last_page_from_link(link));
        }

        let items: Vec<serde_json::Value> =
            response.json().await.map_err(|e| RepolensError::Upstream {
                message: format!("Failed to parse listing: {e}"),
                source: Some(Box::new(e)),
                context: ErrorContext::new("github_client").with_operation("probe_total"),
            })?;

        Ok(Some(items.len() as u64))
    }

    /// Fetch a page of a listing, parsing items one by one
    ///
    /// A malformed item is dropped from the page instead of failing the
    /// whole listing.
    async fn fetch_page_items<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        operation: &str,
    ) -> RepolensResult<Vec<T>> {
        let response = self.get_request(endpoint).await?;

        let raw_items: Vec<serde_json::Value> =
            response.json().await.map_err(|e| RepolensError::Upstream {
                message: format!("Failed to parse listing page: {e}"),
                source: Some(Box::new(e)),
                context: ErrorContext::new("github_client").with_operation(operation),
            })?;

        let total = raw_items.len();
        let items: Vec<T> = raw_items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();

        if items.len() < total {
            warn!(
                operation,
                dropped = total - items.len(),
                "Skipped malformed items in listing page"
            );
        }

        Ok(items)
    }
}

/// Extract the `rel="last"` page number from a Link header
fn last_page_from_link(link: &str) -> Option<u64> {
    let segment = link.split(',').find(|s| s.contains("rel=\"last\""))?;
    let url = segment.split('<').nth(1)?.split('>').next()?;

    for (idx, _) in url.match_indices("page=") {
        // Skip per_page=; a page parameter follows '?' or '&'.
        match url.as_bytes().get(idx.wrapping_sub(1)) {
            Some(b'?') | Some(b'&') => {}
            _ => continue,
        }

        let digits: String = url[idx + "page=".len()..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if let Ok(page) = digits.parse() {
            return Some(page);
        }
    }

    None
}

#[async_trait]
impl RepositoryHost for GitHubClient {
    async fn fetch_repository(&self, repo_name: &str) -> RepolensResult<RepoInfo> {
        info!("Fetching GitHub repository metadata for {}", repo_name);

        let response = self.get_request(&format!("repos/{repo_name}")).await?;

        let repo: GitHubRepository =
            response.json().await.map_err(|e| RepolensError::Upstream {
                message: format!("Failed to parse repository metadata: {e}"),
                source: Some(Box::new(e)),
                context: ErrorContext::new("github_client").with_operation("fetch_repository"),
            })?;

        Ok(RepoInfo {
            name: repo.name,
            full_name: repo.full_name,
            owner: repo.owner.login,
            description: repo.description,
            url: repo.html_url,
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            watchers: repo.watchers_count,
            open_issues: repo.open_issues_count,
            created_at: repo.created_at,
            updated_at: repo.updated_at,
            language: repo.language,
        })
    }

    async fn fetch_contributors(
        &self,
        repo_name: &str,
        limit: usize,
    ) -> RepolensResult<Vec<ContributorStat>> {
        debug!("Fetching GitHub contributors for {}", repo_name);

        let endpoint = format!("repos/{repo_name}/contributors?per_page={limit}");
        let contributors: Vec<GitHubContributor> =
            self.fetch_page_items(&endpoint, "fetch_contributors").await?;

        Ok(contributors
            .into_iter()
            .take(limit)
            .map(|c| ContributorStat {
                login: c.login,
                id: c.id,
                contributions: c.contributions,
                url: c.html_url,
                avatar_url: c.avatar_url,
            })
            .collect())
    }

    async fn count_commits(
        &self,
        repo_name: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> RepolensResult<Option<u64>> {
        let endpoint = format!(
            "repos/{repo_name}/commits?since={}&until={}",
            since.to_rfc3339_opts(SecondsFormat::Secs, true),
            until.to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        self.probe_total(&endpoint).await
    }

    async fn fetch_commit_page(
        &self,
        repo_name: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        page: u64,
    ) -> RepolensResult<Vec<RawCommit>> {
        let endpoint = format!(
            "repos/{repo_name}/commits?since={}&until={}&per_page={PAGE_SIZE}&page={page}",
            since.to_rfc3339_opts(SecondsFormat::Secs, true),
            until.to_rfc3339_opts(SecondsFormat::Secs, true),
        );

        let items: Vec<GitHubCommitItem> =
            self.fetch_page_items(&endpoint, "fetch_commit_page").await?;

        Ok(items
            .into_iter()
            .map(|item| RawCommit {
                sha: item.sha,
                author: item.author.map(|a| a.login),
                date: item.commit.author.date,
                message: item.commit.message,
            })
            .collect())
    }

    async fn count_issues(
        &self,
        repo_name: &str,
        state: IssueState,
    ) -> RepolensResult<Option<u64>> {
        let endpoint = format!("repos/{repo_name}/issues?state={}", state.as_str());
        self.probe_total(&endpoint).await
    }

    async fn fetch_issue_page(
        &self,
        repo_name: &str,
        state: IssueState,
        page: u64,
    ) -> RepolensResult<Vec<IssueRecord>> {
        let endpoint = format!(
            "repos/{repo_name}/issues?state={}&per_page={PAGE_SIZE}&page={page}",
            state.as_str()
        );

        let items: Vec<GitHubIssueItem> =
            self.fetch_page_items(&endpoint, "fetch_issue_page").await?;

        Ok(items
            .into_iter()
            .map(|item| {
                // Open issues report their last update, closed ones their
                // closing time.
                let (updated_at, closed_at) = match state {
                    IssueState::Open => (item.updated_at, None),
                    IssueState::Closed => (None, item.closed_at),
                };
                IssueRecord {
                    number: item.number,
                    title: item.title,
                    state: item.state,
                    created_at: item.created_at,
                    updated_at,
                    closed_at,
                    user: item
                        .user
                        .map(|u| u.login)
                        .unwrap_or_else(|| "Unknown".to_string()),
                }
            })
            .collect())
    }

    async fn fetch_languages(&self, repo_name: &str) -> RepolensResult<BTreeMap<String, u64>> {
        debug!("Fetching GitHub language breakdown for {}", repo_name);

        let response = self
            .get_request(&format!("repos/{repo_name}/languages"))
            .await?;

        response.json().await.map_err(|e| RepolensError::Upstream {
            message: format!("Failed to parse language breakdown: {e}"),
            source: Some(Box::new(e)),
            context: ErrorContext::new("github_client").with_operation("fetch_languages"),
        })
    }

    async fn verify_credentials(&self) -> RepolensResult<String> {
        let response = self.get_request("user").await?;

        let user: GitHubUser = response.json().await.map_err(|e| RepolensError::Upstream {
            message: format!("Failed to parse authenticated user: {e}"),
            source: Some(Box::new(e)),
            context: ErrorContext::new("github_client").with_operation("verify_credentials"),
        })?;

        Ok(user.login)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_page_from_link() {
        let link = "<https://api.github.com/repos/acme/widgets/commits?per_page=1&page=2>; \
                    rel=\"next\", \
                    <https://api.github.com/repos/acme/widgets/commits?per_page=1&page=842>; \
                    rel=\"last\"";
        assert_eq!(last_page_from_link(link), Some(842));
    }

    #[test]
    fn test_last_page_from_link_ignores_per_page() {
        let link = "<https://api.github.com/x?page=3&per_page=1>; rel=\"last\"";
        assert_eq!(last_page_from_link(link), Some(3));
    }

    #[test]
    fn test_last_page_from_link_without_last_rel() {
        let link = "<https://api.github.com/x?per_page=1&page=2>; rel=\"prev\"";
        assert_eq!(last_page_from_link(link), None);
    }

    #[test]
    fn test_commit_item_parsing_tolerates_missing_author() {
        let raw = serde_json::json!({
            "sha": "abc123",
            "author": null,
            "commit": {
                "author": { "date": "2024-03-09T12:00:00Z" },
                "message": "fix: avoid double free"
            }
        });

        let item: GitHubCommitItem = serde_json::from_value(raw).unwrap();
        assert!(item.author.is_none());
        assert_eq!(item.commit.message, "fix: avoid double free");
    }

    #[test]
    fn test_client_creation() {
        let config = HostConfig::github("test_token".to_string());
        assert!(GitHubClient::new(config).is_ok());
    }
}
