//! Values held by both cache layers.

use crate::domain::entities::UrlRecord;
use serde::{Deserialize, Serialize};

/// Namespace for URL entries inside the remote cache.
///
/// The Redis adapter adds its own `urlshort:` prefix, so the effective key is
/// `urlshort:url:<code>`.
pub const URL_KEY_PREFIX: &str = "url:";

/// Builds the logical remote-cache key for a short code.
pub fn url_key(short_code: &str) -> String {
    format!("{URL_KEY_PREFIX}{short_code}")
}

/// A cached lookup result.
///
/// `Tombstone` records that a code is known not to exist, so repeated reads of
/// unknown codes do not reach the store. On the wire this is
/// `{"kind":"hit","record":{...}}` or `{"kind":"tombstone"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CacheEntry {
    Hit { record: UrlRecord },
    Tombstone,
}

impl CacheEntry {
    pub fn hit(record: UrlRecord) -> Self {
        Self::Hit { record }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, Self::Tombstone)
    }
}
