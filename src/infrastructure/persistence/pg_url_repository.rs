//! PostgreSQL implementation of the URL repository.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewUrlRecord, UrlRecord};
use crate::domain::repositories::{RepositoryError, UrlRepository};
use crate::utils::db_error::is_duplicate_key;

/// PostgreSQL repository for the `urls` table.
///
/// Uses SQLx prepared statements with bound parameters.
pub struct PgUrlRepository {
    pool: Arc<PgPool>,
}

impl PgUrlRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UrlRepository for PgUrlRepository {
    async fn save(&self, record: NewUrlRecord) -> Result<UrlRecord, RepositoryError> {
        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO urls (short_code, long_url, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&record.short_code)
        .bind(&record.long_url)
        .bind(record.created_at)
        .bind(record.expires_at)
        .fetch_one(self.pool.as_ref())
        .await;

        match inserted {
            Ok(id) => Ok(record.into_record(id)),
            Err(e) if is_duplicate_key(&e) => Err(RepositoryError::Duplicate {
                code: record.short_code,
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_short_code(&self, code: &str) -> Result<Option<UrlRecord>, RepositoryError> {
        let record = sqlx::query_as::<_, UrlRecord>(
            r#"
            SELECT id, short_code, long_url, created_at, expires_at
            FROM urls
            WHERE short_code = $1
              AND (expires_at IS NULL OR expires_at > NOW())
            "#,
        )
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(record)
    }

    async fn exists_by_short_code(&self, code: &str) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM urls WHERE short_code = $1)",
        )
        .bind(code)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(exists)
    }

    async fn delete_by_short_code(&self, code: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM urls WHERE short_code = $1")
            .bind(code)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                code: code.to_string(),
            });
        }

        Ok(())
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .is_ok()
    }
}
