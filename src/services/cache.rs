use anyhow::Result;
use moka::future::Cache;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Two-level cache: a process-local moka layer in front of an optional shared redis.
///
/// Redis is never required. When it is unreachable at startup the service keeps
/// working from memory and `/health` reports `redis: false`.
pub struct CacheService {
    redis: Option<redis::aio::ConnectionManager>,
    memory: Arc<Cache<String, String>>,
    ttl: Duration,
}

impl CacheService {
    pub async fn new(redis_url: &str, ttl: Duration) -> Result<Self> {
        let redis = match redis::Client::open(redis_url) {
            Ok(client) => match client.get_connection_manager().await {
                Ok(conn) => {
                    tracing::info!("Redis connected successfully");
                    Some(conn)
                }
                Err(e) => {
                    tracing::warn!("Redis connection failed: {}, using memory cache only", e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Redis client creation failed: {}, using memory cache only", e);
                None
            }
        };

        Ok(Self::build(redis, ttl))
    }

    pub fn in_memory(ttl: Duration) -> Self {
        Self::build(None, ttl)
    }

    fn build(redis: Option<redis::aio::ConnectionManager>, ttl: Duration) -> Self {
        let memory = Arc::new(
            Cache::builder()
                .max_capacity(10_000)
                .time_to_live(ttl)
                .build(),
        );
        Self { redis, memory, ttl }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        if let Some(cached) = self.memory.get(key).await {
            if let Ok(value) = serde_json::from_str(&cached) {
                tracing::debug!("Memory cache hit for key: {}", key);
                return Ok(Some(value));
            }
        }

        if let Some(mut redis) = self.redis.clone() {
            match redis.get::<_, Option<String>>(key).await {
                Ok(Some(cached)) => {
                    if let Ok(value) = serde_json::from_str(&cached) {
                        self.memory.insert(key.to_string(), cached).await;
                        tracing::debug!("Redis cache hit for key: {}", key);
                        return Ok(Some(value));
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Redis get error: {}", e),
            }
        }

        tracing::debug!("Cache miss for key: {}", key);
        Ok(None)
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let serialized = serde_json::to_string(value)?;
        self.memory.insert(key.to_string(), serialized.clone()).await;

        if let Some(mut redis) = self.redis.clone() {
            if let Err(e) = redis.set_ex::<_, _, ()>(key, serialized, self.ttl.as_secs()).await {
                tracing::warn!("Redis set error: {}", e);
            } else {
                tracing::debug!("Cached key: {} with TTL: {}s", key, self.ttl.as_secs());
            }
        }

        Ok(())
    }

    pub async fn ping(&self) -> bool {
        match self.redis.clone() {
            Some(mut redis) => redis::cmd("PING")
                .query_async::<_, String>(&mut redis)
                .await
                .is_ok(),
            None => false,
        }
    }
}
