//! Redis cache implementation with a key namespace and connection manager.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use posty_core::ports::{Cache, CacheError};

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Whether to fallback to in-memory cache if Redis is unavailable
    pub fallback_to_memory: bool,
    /// Prefix for every key written by this cache.
    pub namespace: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            fallback_to_memory: true,
            namespace: "posty:".to_string(),
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("REDIS_URL").unwrap_or(defaults.url),
            connect_timeout: std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            fallback_to_memory: std::env::var("REDIS_FALLBACK_TO_MEMORY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.fallback_to_memory),
            namespace: std::env::var("REDIS_NAMESPACE").unwrap_or(defaults.namespace),
        }
    }
}

/// Redis-backed cache implementation.
///
/// Uses connection manager for automatic reconnection. Keys are stored
/// under `config.namespace` so `clear` never touches foreign data.
pub struct RedisCache {
    conn: ConnectionManager,
    namespace: String,
}

impl RedisCache {
    pub async fn new(config: RedisConfig) -> Result<Self, CacheError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| CacheError::Connection(e.to_string()))?;

        // Bound the connect so an unreachable Redis cannot stall startup
        let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Connection("Connection timed out".to_string()))?
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, namespace = %config.namespace, "Connected to Redis cache");

        Ok(Self {
            conn,
            namespace: config.namespace,
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(self.key(key)).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Redis GET failed");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let key = self.key(key);

        match ttl {
            Some(duration) => {
                conn.set_ex::<_, _, ()>(key, value, duration.as_secs().max(1))
                    .await
                    .map_err(|e| CacheError::Operation(e.to_string()))?;
            }
            None => {
                conn.set::<_, _, ()>(key, value)
                    .await
                    .map_err(|e| CacheError::Operation(e.to_string()))?;
            }
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.key(key))
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> bool {
        let mut conn = self.conn.clone();
        conn.exists::<_, bool>(self.key(key)).await.unwrap_or(false)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", self.namespace);

        let keys: Vec<String> = conn
            .keys::<_, Vec<String>>(pattern)
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))?;

        if keys.is_empty() {
            return Ok(());
        }

        conn.del::<_, ()>(keys)
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        Ok(())
    }
}
