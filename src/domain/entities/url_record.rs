//! URL record entity representing a short code to long URL mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored short URL.
///
/// Records are never mutated in place; they are created once and removed
/// either explicitly or, from a reader's point of view, by expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UrlRecord {
    pub id: i64,
    pub short_code: String,
    pub long_url: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl UrlRecord {
    /// Creates a new UrlRecord instance.
    pub fn new(
        id: i64,
        short_code: String,
        long_url: String,
        created_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            short_code,
            long_url,
            created_at,
            expires_at,
        }
    }

    /// Returns true if the record is live at `now`: no expiry, or expiry in the future.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|e| e > now)
    }

    /// Returns true if the record has passed its expiry time at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_live_at(now)
    }
}

/// Input data for storing a new record. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUrlRecord {
    pub short_code: String,
    pub long_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewUrlRecord {
    /// A record created now with no expiry.
    pub fn now(short_code: impl Into<String>, long_url: impl Into<String>) -> Self {
        Self {
            short_code: short_code.into(),
            long_url: long_url.into(),
            created_at: Utc::now(),
            expires_at: None,
        }
    }

    /// Attaches the identity assigned by the store.
    pub fn into_record(self, id: i64) -> UrlRecord {
        UrlRecord::new(
            id,
            self.short_code,
            self.long_url,
            self.created_at,
            self.expires_at,
        )
    }
}
