//! Configuration management
//!
//! All runtime configuration comes from environment variables, loaded once
//! at startup. A missing GitHub token is fatal.

use crate::error::{ErrorContext, RepolensError, RepolensResult};
use serde::{Deserialize, Serialize};

/// Environment variable holding the GitHub API token (required)
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";

/// Environment variable overriding the GitHub API base URL
pub const ENV_GITHUB_API_URL: &str = "GITHUB_API_URL";

/// Environment variable enabling the Redis cache tier
pub const ENV_USE_REDIS: &str = "USE_REDIS";

/// Environment variable holding the Redis connection URL
pub const ENV_REDIS_URL: &str = "REDIS_URL";

/// Environment variable overriding the default cache TTL in minutes
pub const ENV_CACHE_TTL_MINUTES: &str = "REPOLENS_CACHE_TTL_MINUTES";

const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_REDIS_URL: &str = "redis://localhost:6379/0";
const DEFAULT_TTL_MINUTES: u64 = 60;

/// Cache tier selection and expiry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Whether to prefer the Redis tier over the in-process map
    pub use_redis: bool,
    /// Redis connection URL
    pub redis_url: String,
    /// Default TTL applied to cached analytics records
    pub ttl_minutes: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            use_redis: false,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            ttl_minutes: DEFAULT_TTL_MINUTES,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// GitHub API token
    pub github_token: String,
    /// GitHub API base URL
    pub github_api_url: String,
    /// Cache configuration
    pub cache: CacheSettings,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Fails immediately when the GitHub token is absent or empty.
    pub fn from_env() -> RepolensResult<Self> {
        let github_token = std::env::var(ENV_GITHUB_TOKEN).unwrap_or_default();
        if github_token.is_empty() {
            return Err(RepolensError::Config {
                message: format!("GitHub token is required. Please set {ENV_GITHUB_TOKEN}."),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("from_env")
                    .with_suggestion("Set GITHUB_TOKEN in the environment or a .env file"),
            });
        }

        let github_api_url =
            std::env::var(ENV_GITHUB_API_URL).unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let use_redis = std::env::var(ENV_USE_REDIS)
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "t"))
            .unwrap_or(false);

        let redis_url =
            std::env::var(ENV_REDIS_URL).unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string());

        let ttl_minutes = std::env::var(ENV_CACHE_TTL_MINUTES)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TTL_MINUTES);

        Ok(Self {
            github_token,
            github_api_url,
            cache: CacheSettings {
                use_redis,
                redis_url,
                ttl_minutes,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment access is process-global, so the from_env paths share one
    // test to keep them from racing each other.
    #[test]
    fn test_from_env() {
        std::env::remove_var(ENV_GITHUB_TOKEN);
        let err = AppConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("GitHub token is required"));

        std::env::set_var(ENV_GITHUB_TOKEN, "ghp_test");
        std::env::set_var(ENV_USE_REDIS, "1");
        std::env::set_var(ENV_CACHE_TTL_MINUTES, "15");

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.github_token, "ghp_test");
        assert_eq!(config.github_api_url, DEFAULT_API_URL);
        assert!(config.cache.use_redis);
        assert_eq!(config.cache.ttl_minutes, 15);

        std::env::remove_var(ENV_GITHUB_TOKEN);
        std::env::remove_var(ENV_USE_REDIS);
        std::env::remove_var(ENV_CACHE_TTL_MINUTES);
    }

    #[test]
    fn test_cache_settings_defaults() {
        let settings = CacheSettings::default();
        assert!(!settings.use_redis);
        assert_eq!(settings.ttl_minutes, 60);
        assert_eq!(settings.redis_url, DEFAULT_REDIS_URL);
    }
}
