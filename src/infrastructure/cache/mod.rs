//! Caching layers for fast redirect lookups.
//!
//! - [`LruCache`] - in-process L1, bounded and recency ordered
//! - [`RemoteCache`] - shared L2 contract, with [`RedisCache`] for production
//!   and [`NullCache`] when Redis is disabled
//! - [`CacheEntry`] - the value both layers hold (record or tombstone)

mod entry;
pub mod lru;
mod null_cache;
mod redis_cache;
mod service;

pub use entry::{CacheEntry, URL_KEY_PREFIX, url_key};
pub use lru::LruCache;
pub use null_cache::NullCache;
pub use redis_cache::{KEY_PREFIX, RedisCache, connect_manager, full_key};
pub use service::{CacheError, CacheResult, RemoteCache, get_json, set_json};
