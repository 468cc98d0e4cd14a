//! Application state
//!
//! Owns the insight service and, through it, the cache store and GitHub
//! client. The cache is constructed once here and injected; nothing holds
//! it as ambient global state.

use std::sync::Arc;

use tracing::info;

use repolens_analytics::{
    build_cache, GitHubClient, HostConfig, RepoAnalyzer, RepositoryHost, RepositoryInsights,
};
use repolens_core::{AppConfig, ErrorContext, RepolensError, RepolensResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub insights: Arc<RepositoryInsights>,
}

impl AppState {
    /// Build the full production state: cache tier, GitHub client, and
    /// analytics stack
    ///
    /// Verifies the configured token against the API; an invalid credential
    /// is a fatal configuration error.
    pub async fn new(config: &AppConfig) -> RepolensResult<Self> {
        let cache = build_cache(&config.cache).await;

        let host_config = HostConfig::github(config.github_token.clone())
            .with_base_url(&config.github_api_url);
        let client = GitHubClient::new(host_config)?;

        let login = client.verify_credentials().await.map_err(|e| {
            RepolensError::Config {
                message: format!(
                    "Invalid GitHub token. Please check your token and its permissions: {e}"
                ),
                source: Some(Box::new(e)),
                context: ErrorContext::new("app_state")
                    .with_operation("verify_credentials")
                    .with_suggestion("Regenerate the token or check its scopes"),
            }
        })?;
        info!(login, "Authenticated to GitHub");

        let analyzer = RepoAnalyzer::new(
            Arc::new(client) as Arc<dyn RepositoryHost>,
            cache,
            config.cache.ttl_minutes,
        );

        Ok(Self {
            insights: Arc::new(RepositoryInsights::new(analyzer)),
        })
    }

    /// Build state around an existing insight service
    pub fn with_insights(insights: Arc<RepositoryInsights>) -> Self {
        Self { insights }
    }
}
