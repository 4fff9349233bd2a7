//! File repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use stashbox_core::result::AppResult;
use stashbox_entity::file::{CreateFile, File};

use crate::error::db_error;
use crate::store::FileStore;

/// Postgres file metadata repository.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileStore for FileRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find file", e))
    }

    async fn list_in_folder(
        &self,
        owner_id: Uuid,
        folder_id: Option<Uuid>,
    ) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE owner_id = $1 AND folder_id IS NOT DISTINCT FROM $2 \
             ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list files", e))
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list files", e))
    }

    async fn create(&self, data: &CreateFile) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "INSERT INTO files \
             (owner_id, folder_id, file_name, size_bytes, mime_type, storage_backend, \
              storage_key, storage_url, is_public) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(data.owner_id)
        .bind(data.folder_id)
        .bind(&data.file_name)
        .bind(data.size_bytes)
        .bind(&data.mime_type)
        .bind(data.location.backend())
        .bind(data.location.key())
        .bind(&data.storage_url)
        .bind(data.is_public)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create file", e))
    }

    async fn rename(&self, id: Uuid, file_name: &str) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET file_name = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(file_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to rename file", e))
    }

    async fn set_public(&self, id: Uuid, is_public: bool) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET is_public = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(is_public)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update file visibility", e))
    }

    async fn set_folder(&self, id: Uuid, folder_id: Option<Uuid>) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET folder_id = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(folder_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to move file", e))
    }

    async fn delete(&self, id: Uuid) -> AppResult<Option<File>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        sqlx::query("DELETE FROM shared_links WHERE file_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to delete share links", e))?;

        let deleted = sqlx::query_as::<_, File>("DELETE FROM files WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to delete file", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit file delete", e))?;
        Ok(deleted)
    }

    async fn usage(&self, owner_id: Uuid) -> AppResult<(i64, i64)> {
        sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), COALESCE(SUM(size_bytes), 0)::BIGINT FROM files WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to compute storage usage", e))
    }
}
