//! No-op remote cache for deployments without Redis.

use super::service::{CacheError, CacheResult, RemoteCache};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// A remote cache that stores nothing.
///
/// Every read is a miss and every write succeeds immediately, so the service
/// runs on its local LRU and the store alone.
///
/// # Use Cases
///
/// - Development environments without Redis
/// - Fallback when the Redis connection fails at startup
pub struct NullCache;

impl NullCache {
    /// Creates a new NullCache instance.
    pub fn new() -> Self {
        debug!("Using NullCache (remote caching disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteCache for NullCache {
    async fn get(&self, _key: &str) -> CacheResult<String> {
        Err(CacheError::Miss)
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Option<Duration>) -> CacheResult<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn exists(&self, _key: &str) -> CacheResult<bool> {
        Ok(false)
    }

    async fn health_check(&self) -> bool {
        true
    }
}
