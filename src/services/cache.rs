use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Two-tier cache: moka in process (L1) and, when configured, Redis (L2)
///
/// Without Redis the manager runs L1-only. Redis failures are logged and
/// treated as misses so a flaky cache never fails a request.
pub struct CacheManager {
    redis: Option<Arc<tokio::sync::Mutex<ConnectionManager>>>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
}

impl CacheManager {
    /// In-process cache only
    pub fn local(l1_size: u64, ttl_secs: u64) -> Self {
        Self {
            redis: None,
            l1_cache: moka::future::CacheBuilder::new(l1_size)
                .time_to_live(Duration::from_secs(ttl_secs))
                .build(),
            ttl_secs,
        }
    }

    /// Connect the Redis tier as well
    pub async fn with_redis(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        let mut cache = Self::local(l1_size, ttl_secs);
        cache.redis = Some(Arc::new(tokio::sync::Mutex::new(redis)));
        Ok(cache)
    }

    /// Build from settings, falling back to L1-only if Redis is unreachable
    pub async fn from_settings(redis_url: Option<&str>, l1_size: u64, ttl_secs: u64) -> Self {
        match redis_url {
            Some(url) => match Self::with_redis(url, l1_size, ttl_secs).await {
                Ok(cache) => cache,
                Err(e) => {
                    tracing::warn!("Failed to connect to Redis ({}), running with in-process cache only", e);
                    Self::local(l1_size, ttl_secs)
                }
            },
            None => Self::local(l1_size, ttl_secs),
        }
    }

    pub fn has_redis(&self) -> bool {
        self.redis.is_some()
    }

    /// Get a value (L1 first, then L2); `None` on a miss
    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        if let Some(bytes) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return serde_json::from_slice(&bytes).ok();
        }

        let redis = self.redis.as_ref()?;
        let value: Result<Option<String>, _> = {
            let mut conn = redis.lock().await;
            redis::cmd("GET").arg(key).query_async(&mut *conn).await
        };

        match value {
            Ok(Some(json)) => {
                tracing::trace!("L2 cache hit: {}", key);
                self.l1_cache.insert(key.to_string(), json.as_bytes().to_vec()).await;
                serde_json::from_str(&json).ok()
            }
            Ok(None) => {
                tracing::trace!("Cache miss: {}", key);
                None
            }
            Err(e) => {
                tracing::warn!("Redis GET failed for {}: {}", key, e);
                None
            }
        }
    }

    /// Set a value in both tiers
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;
        self.l1_cache.insert(key.to_string(), json.as_bytes().to_vec()).await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let _: () = redis::cmd("SETEX")
                .arg(key)
                .arg(self.ttl_secs)
                .arg(json)
                .query_async(&mut *conn)
                .await?;
        }

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Delete a value from both tiers
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.l1_cache.invalidate(key).await;
        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let _: () = redis::cmd("DEL").arg(key).query_async(&mut *conn).await?;
        }
        Ok(())
    }

    /// Best-effort delete; failures are only logged
    pub async fn forget(&self, key: &str) {
        if let Err(e) = self.delete(key).await {
            tracing::warn!("Failed to invalidate cache key {}: {}", key, e);
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            l1_size: self.l1_cache.entry_count(),
            redis_enabled: self.has_redis(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub l1_size: u64,
    pub redis_enabled: bool,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Resolved session -> user
    pub fn session(sid: &str) -> String {
        format!("session:{}", sid)
    }

    /// A user's own profile
    pub fn profile(user_id: &str) -> String {
        format!("profile:{}", user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_set_get_delete() {
        let cache = CacheManager::local(100, 60);
        assert!(!cache.has_redis());

        cache.set("k", &"value".to_string()).await.unwrap();
        assert_eq!(cache.get::<String>("k").await.as_deref(), Some("value"));

        cache.delete("k").await.unwrap();
        assert!(cache.get::<String>("k").await.is_none());
    }

    #[tokio::test]
    async fn test_type_mismatch_is_a_miss() {
        let cache = CacheManager::local(100, 60);
        cache.set("n", &42u32).await.unwrap();
        assert!(cache.get::<Vec<String>>("n").await.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_redis_falls_back_to_local() {
        let cache = CacheManager::from_settings(Some("redis://127.0.0.1:1"), 100, 60).await;
        assert!(!cache.has_redis());
    }

    #[tokio::test]
    #[ignore = "Requires Redis"]
    async fn test_redis_set_get() {
        let cache = CacheManager::with_redis("redis://127.0.0.1:6379", 1000, 60)
            .await
            .expect("Failed to create cache");
        cache.set("test_key", &"test_value").await.unwrap();
        let result: Option<String> = cache.get("test_key").await;
        assert_eq!(result.as_deref(), Some("test_value"));
        cache.delete("test_key").await.unwrap();
    }

    #[test]
    fn test_cache_key_builder() {
        assert_eq!(CacheKey::session("abc"), "session:abc");
        assert_eq!(CacheKey::profile("user123"), "profile:user123");
    }
}
