//! Repository trait for URL record storage.

use crate::domain::entities::{NewUrlRecord, UrlRecord};
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by URL stores.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The unique index on `short_code` rejected the insert.
    #[error("short code '{code}' already exists")]
    Duplicate { code: String },

    /// A delete matched no rows.
    #[error("no record found for short code '{code}'")]
    NotFound { code: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RepositoryError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

/// Repository interface for short URL records.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUrlRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_url.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// Inserts a record and returns it with the store-assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Duplicate`] if the short code already exists.
    /// Returns [`RepositoryError::Database`] on any other failure.
    async fn save(&self, record: NewUrlRecord) -> Result<UrlRecord, RepositoryError>;

    /// Finds a live record (no expiry, or expiry in the future) by short code.
    ///
    /// Liveness is decided by the store's clock in the same query.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] on database errors.
    async fn find_by_short_code(&self, code: &str) -> Result<Option<UrlRecord>, RepositoryError>;

    /// Returns true if any record uses `code`, expired or not.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] on database errors.
    async fn exists_by_short_code(&self, code: &str) -> Result<bool, RepositoryError>;

    /// Deletes the record with `code`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no row was affected.
    /// Returns [`RepositoryError::Database`] on database errors.
    async fn delete_by_short_code(&self, code: &str) -> Result<(), RepositoryError>;

    /// Checks that the store answers queries.
    async fn health_check(&self) -> bool;
}
