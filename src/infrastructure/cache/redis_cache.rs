//! Redis-backed remote cache implementation.

use super::service::{CacheError, CacheResult, RemoteCache};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

/// Namespace applied to every key written by this service.
pub const KEY_PREFIX: &str = "urlshort:";

/// Builds the Redis key for a logical cache key, e.g. `urlshort:url:abc`.
pub fn full_key(prefix: &str, key: &str) -> String {
    format!("{prefix}{key}")
}

/// Opens a Redis connection manager and validates it with a PING.
///
/// # Errors
///
/// Returns [`CacheError::Connection`] if the URL is invalid, the connection
/// cannot be established, or the PING fails.
pub async fn connect_manager(redis_url: &str) -> CacheResult<ConnectionManager> {
    let client = Client::open(redis_url)
        .map_err(|e| CacheError::Connection(format!("Failed to create Redis client: {}", e)))?;

    let manager = ConnectionManager::new(client)
        .await
        .map_err(|e| CacheError::Connection(format!("Failed to connect to Redis: {}", e)))?;

    let mut test_conn = manager.clone();
    test_conn
        .ping::<()>()
        .await
        .map_err(|e| CacheError::Connection(format!("Redis PING failed: {}", e)))?;

    Ok(manager)
}

/// Redis remote cache.
///
/// Uses a shared `ConnectionManager` for connection reuse. Every operation is
/// bounded by `op_timeout`; a timeout is reported as [`CacheError::Timeout`].
/// Unlike a fail-open cache, errors are returned so the caller can tell a
/// transport failure apart from a miss.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: Duration,
    op_timeout: Duration,
    key_prefix: String,
}

impl RedisCache {
    /// Connects to Redis and configures the default TTL and operation timeout.
    ///
    /// # Errors
    ///
    /// See [`connect_manager`].
    pub async fn connect(
        redis_url: &str,
        default_ttl: Duration,
        op_timeout: Duration,
    ) -> CacheResult<Self> {
        info!("Connecting to Redis at {}", redis_url);
        let manager = connect_manager(redis_url).await?;
        info!("✓ Connected to Redis");

        Ok(Self::from_manager(manager, default_ttl, op_timeout))
    }

    /// Wraps an existing connection manager.
    pub fn from_manager(
        manager: ConnectionManager,
        default_ttl: Duration,
        op_timeout: Duration,
    ) -> Self {
        Self {
            client: manager,
            default_ttl,
            op_timeout,
            key_prefix: KEY_PREFIX.to_string(),
        }
    }

    fn build_key(&self, key: &str) -> String {
        full_key(&self.key_prefix, key)
    }

    async fn bounded<T, F>(&self, op: F) -> CacheResult<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match timeout(self.op_timeout, op).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CacheError::Operation(e.to_string())),
            Err(_) => Err(CacheError::Timeout(self.op_timeout)),
        }
    }
}

#[async_trait]
impl RemoteCache for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<String> {
        let full_key = self.build_key(key);
        let mut conn = self.client.clone();

        match self.bounded(conn.get::<_, Option<String>>(&full_key)).await? {
            Some(value) => {
                debug!("Redis HIT: {}", full_key);
                Ok(value)
            }
            None => {
                debug!("Redis MISS: {}", full_key);
                Err(CacheError::Miss)
            }
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        let full_key = self.build_key(key);
        let mut conn = self.client.clone();
        let ttl = ttl.unwrap_or(self.default_ttl);
        // PSETEX rejects a zero expiry
        let ttl_ms = (ttl.as_millis() as u64).max(1);

        self.bounded(conn.pset_ex::<_, _, ()>(&full_key, value, ttl_ms))
            .await?;

        debug!("Redis SET: {} (TTL: {}ms)", full_key, ttl_ms);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let full_key = self.build_key(key);
        let mut conn = self.client.clone();

        let deleted = self.bounded(conn.del::<_, i32>(&full_key)).await?;
        if deleted > 0 {
            debug!("Redis DEL: {}", full_key);
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let full_key = self.build_key(key);
        let mut conn = self.client.clone();

        self.bounded(conn.exists::<_, bool>(&full_key)).await
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        self.bounded(conn.ping::<()>()).await.is_ok()
    }
}
