//! Cache store for analytics records
//!
//! Two interchangeable backends behind one contract: a process-local map
//! and a Redis-backed tier. Backend failures never reach the caller; they
//! degrade to cache-miss behavior.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use repolens_core::CacheSettings;

pub mod memory;
pub mod redis;

pub use memory::MemoryCache;
pub use redis::RedisCache;

/// Key-value store with per-entry TTL
///
/// Implementations must be safe for concurrent get/set from multiple tasks.
/// None of the methods surface backend errors; an unavailable backend reads
/// as a miss and writes as a no-op.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a value, treating expired entries as absent
    async fn get(&self, key: &str) -> Option<Value>;

    /// Store a value with a TTL in minutes
    async fn set(&self, key: &str, value: Value, ttl_minutes: u64);

    /// Delete a value
    async fn delete(&self, key: &str);
}

/// Build a deterministic cache key for an operation on a repository
///
/// Parameters are sorted by name before hashing, so the key is independent
/// of the order the caller lists them in.
pub fn cache_key(operation: &str, repo_name: &str, params: &[(&str, String)]) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let mut parts = vec![operation.to_string(), repo_name.to_string()];
    parts.extend(sorted.iter().map(|(name, value)| format!("{name}={value}")));

    let mut hasher = Sha256::new();
    hasher.update(parts.join("_"));
    format!("{:x}", hasher.finalize())
}

/// Select the cache tier once at startup
///
/// Prefers Redis when configured; a failed connection logs and falls back
/// to the in-process map so the service keeps running without the backing
/// store.
pub async fn build_cache(settings: &CacheSettings) -> Arc<dyn CacheStore> {
    if settings.use_redis {
        match RedisCache::connect(&settings.redis_url).await {
            Ok(cache) => {
                info!(url = %settings.redis_url, "Connected to Redis cache");
                return Arc::new(cache);
            }
            Err(e) => {
                warn!(error = %e, "Failed to connect to Redis, falling back to in-memory cache");
            }
        }
    }

    Arc::new(MemoryCache::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_deterministic() {
        let a = cache_key("get_commit_activity", "acme/widgets", &[("days", "30".to_string())]);
        let b = cache_key("get_commit_activity", "acme/widgets", &[("days", "30".to_string())]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_cache_key_ignores_parameter_order() {
        let a = cache_key(
            "get_issues_analysis",
            "acme/widgets",
            &[("a", "1".to_string()), ("b", "2".to_string())],
        );
        let b = cache_key(
            "get_issues_analysis",
            "acme/widgets",
            &[("b", "2".to_string()), ("a", "1".to_string())],
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_cache_key_varies_with_inputs() {
        let base = cache_key("get_repository", "acme/widgets", &[]);
        assert_ne!(base, cache_key("get_languages", "acme/widgets", &[]));
        assert_ne!(base, cache_key("get_repository", "acme/gadgets", &[]));
        assert_ne!(
            base,
            cache_key("get_repository", "acme/widgets", &[("days", "7".to_string())])
        );
    }

    #[tokio::test]
    async fn test_build_cache_defaults_to_memory() {
        let settings = CacheSettings::default();
        let cache = build_cache(&settings).await;

        cache
            .set("k", serde_json::json!({"v": 1}), 1)
            .await;
        assert!(cache.get("k").await.is_some());
    }
}
