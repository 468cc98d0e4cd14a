//! In-process cache backend

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::CacheStore;

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    stored_at: Instant,
    ttl: Duration,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() >= self.ttl
    }
}

/// Process-local cache: a map from key to value with lazy TTL expiry
///
/// Expired entries are dropped when a read finds them; there is no
/// background sweep.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (stored, possibly expired) entries
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.write().unwrap();

        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                debug!(key, "cache entry expired");
                None
            }
            Some(entry) => {
                debug!(key, "cache hit");
                Some(entry.value.clone())
            }
            None => {
                debug!(key, "cache miss");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: Value, ttl_minutes: u64) {
        let entry = Entry {
            value,
            stored_at: Instant::now(),
            ttl: Duration::from_secs(ttl_minutes * 60),
        };
        self.entries.write().unwrap().insert(key.to_string(), entry);
    }

    async fn delete(&self, key: &str) {
        self.entries.write().unwrap().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_then_get_within_ttl() {
        let cache = MemoryCache::new();
        cache.set("k", json!({"stars": 7}), 1).await;

        let value = cache.get("k").await.unwrap();
        assert_eq!(value["stars"], 7);
    }

    #[tokio::test]
    async fn test_zero_ttl_entry_is_absent() {
        let cache = MemoryCache::new();
        cache.set("k", json!(1), 0).await;

        assert!(cache.get("k").await.is_none());
        // The expired entry was dropped on the way out.
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_entry() {
        let cache = MemoryCache::new();
        cache.set("k", json!(1), 1).await;
        cache.delete("k").await;

        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_set_overwrites_existing_entry() {
        let cache = MemoryCache::new();
        cache.set("k", json!(1), 1).await;
        cache.set("k", json!(2), 1).await;

        assert_eq!(cache.get("k").await.unwrap(), json!(2));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let cache = MemoryCache::new();
        assert!(cache.get("absent").await.is_none());
    }
}
