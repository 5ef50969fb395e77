//! Remote cache trait, error types and JSON value codec.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during remote cache operations.
///
/// [`CacheError::Miss`] is the only variant that means "the key is not
/// there"; every other variant is a transport or decoding failure and must
/// not be mistaken for a miss.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache miss")]
    Miss,

    #[error("cache connection error: {0}")]
    Connection(String),

    #[error("cache operation error: {0}")]
    Operation(String),

    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid cached value: {0}")]
    Codec(#[from] serde_json::Error),
}

impl CacheError {
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss)
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// A shared key-value cache with per-entry TTL.
///
/// Keys passed in are logical; implementations apply their own namespace
/// prefix. Values are opaque strings (see [`get_json`] / [`set_json`] for the
/// JSON encoding used by the service).
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache
/// - [`crate::infrastructure::cache::NullCache`] - Always misses, for disabled caching
#[async_trait]
pub trait RemoteCache: Send + Sync {
    /// Fetches the raw value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Miss`] if the key does not exist, any other
    /// variant on transport failure.
    async fn get(&self, key: &str) -> CacheResult<String>;

    /// Stores `value` under `key`.
    ///
    /// `ttl = None` applies the implementation's default TTL.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()>;

    /// Removes `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Returns true if `key` exists.
    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Checks if the cache backend is reachable.
    ///
    /// Used by the health endpoint to report cache status.
    async fn health_check(&self) -> bool;
}

/// Fetches `key` and decodes it from JSON.
///
/// A value that fails to decode is reported as [`CacheError::Codec`], not as a miss.
pub async fn get_json<T: DeserializeOwned>(cache: &dyn RemoteCache, key: &str) -> CacheResult<T> {
    let raw = cache.get(key).await?;
    Ok(serde_json::from_str(&raw)?)
}

/// Encodes `value` as JSON and stores it under `key` with `ttl`.
pub async fn set_json<T: Serialize + ?Sized>(
    cache: &dyn RemoteCache,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> CacheResult<()> {
    let raw = serde_json::to_string(value)?;
    cache.set(key, raw, ttl).await
}
