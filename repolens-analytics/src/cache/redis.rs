//! Redis cache backend
//!
//! Same contract as the in-process map, backed by a Redis server with
//! native TTL (SETEX, server-side expiry). Per-call failures are logged
//! and read as misses; they never reach the caller.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;
use tracing::{debug, warn};

use super::CacheStore;

/// Redis-backed cache tier
#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    /// Connect to a Redis server and verify the connection
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;

        let mut conn = manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        Ok(Self { manager })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let mut conn = self.manager.clone();

        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!(key, "cache hit");
                    Some(value)
                }
                Err(e) => {
                    warn!(key, error = %e, "Discarding unparseable Redis cache entry");
                    None
                }
            },
            Ok(None) => {
                debug!(key, "cache miss");
                None
            }
            Err(e) => {
                warn!(key, error = %e, "Redis get error");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: Value, ttl_minutes: u64) {
        let payload = value.to_string();
        // SETEX rejects a zero expiry.
        let seconds = (ttl_minutes * 60).max(1);
        let mut conn = self.manager.clone();

        if let Err(e) = conn.set_ex::<_, _, ()>(key, payload, seconds).await {
            warn!(key, error = %e, "Redis set error");
        }
    }

    async fn delete(&self, key: &str) {
        let mut conn = self.manager.clone();

        if let Err(e) = conn.del::<_, ()>(key).await {
            warn!(key, error = %e, "Redis delete error");
        }
    }
}
