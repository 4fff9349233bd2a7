//! Share link repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use stashbox_core::error::AppError;
use stashbox_core::result::AppResult;
use stashbox_entity::share::{CreateShareLink, ShareLink};

use crate::error::{SHARE_TOKEN_CONSTRAINT, db_error, violates};
use crate::store::ShareStore;

/// Postgres share link repository.
#[derive(Debug, Clone)]
pub struct ShareRepository {
    pool: PgPool,
}

impl ShareRepository {
    /// Create a new share link repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShareStore for ShareRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ShareLink>> {
        sqlx::query_as::<_, ShareLink>("SELECT * FROM shared_links WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find share link", e))
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<ShareLink>> {
        sqlx::query_as::<_, ShareLink>("SELECT * FROM shared_links WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find share link by token", e))
    }

    async fn create(&self, data: &CreateShareLink) -> AppResult<ShareLink> {
        sqlx::query_as::<_, ShareLink>(
            "INSERT INTO shared_links (file_id, token, expires_at, password_hash, max_downloads) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(data.file_id)
        .bind(&data.token)
        .bind(data.expires_at)
        .bind(&data.password_hash)
        .bind(data.max_downloads)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, SHARE_TOKEN_CONSTRAINT) {
                AppError::conflict("Share token already in use")
            } else {
                db_error("Failed to create share link", e)
            }
        })
    }

    async fn list_for_file(&self, file_id: Uuid) -> AppResult<Vec<ShareLink>> {
        sqlx::query_as::<_, ShareLink>(
            "SELECT * FROM shared_links WHERE file_id = $1 ORDER BY created_at DESC",
        )
        .bind(file_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list share links", e))
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> AppResult<Vec<ShareLink>> {
        sqlx::query_as::<_, ShareLink>(
            "SELECT s.* FROM shared_links s \
             INNER JOIN files f ON f.id = s.file_id \
             WHERE f.owner_id = $1 ORDER BY s.created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list share links", e))
    }

    async fn try_consume(&self, token: &str) -> AppResult<Option<i32>> {
        sqlx::query_scalar::<_, i32>(
            "UPDATE shared_links SET download_count = download_count + 1 \
             WHERE token = $1 AND is_active AND expires_at > NOW() \
               AND (max_downloads IS NULL OR download_count < max_downloads) \
             RETURNING download_count",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to consume share link", e))
    }

    async fn deactivate(&self, id: Uuid) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE shared_links SET is_active = FALSE WHERE id = $1 AND is_active")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("Failed to revoke share link", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM shared_links WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete expired share links", e))?;
        Ok(result.rows_affected())
    }
}
