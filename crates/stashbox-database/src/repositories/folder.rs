//! Folder repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use stashbox_core::error::AppError;
use stashbox_core::result::AppResult;
use stashbox_entity::folder::{CreateFolder, Folder, ReparentSummary};

use crate::error::{FOLDER_NAME_CONSTRAINT, db_error, reparent_conflict, violates};
use crate::store::FolderStore;

/// Postgres folder repository.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: PgPool,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn name_conflict(e: sqlx::Error, context: &str) -> AppError {
    if violates(&e, FOLDER_NAME_CONSTRAINT) {
        AppError::conflict("A folder with this name already exists here")
    } else {
        db_error(context, e)
    }
}

#[async_trait]
impl FolderStore for FolderRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find folder", e))
    }

    async fn find_by_name(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders \
             WHERE owner_id = $1 AND parent_id IS NOT DISTINCT FROM $2 AND LOWER(name) = LOWER($3)",
        )
        .bind(owner_id)
        .bind(parent_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find folder by name", e))
    }

    async fn list_children(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE owner_id = $1 AND parent_id IS NOT DISTINCT FROM $2 \
             ORDER BY name ASC",
        )
        .bind(owner_id)
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list child folders", e))
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE owner_id = $1 ORDER BY name ASC")
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list folders", e))
    }

    async fn create(&self, data: &CreateFolder) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (owner_id, parent_id, name) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(data.owner_id)
        .bind(data.parent_id)
        .bind(&data.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| name_conflict(e, "Failed to create folder"))
    }

    async fn rename(&self, id: Uuid, name: &str) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "UPDATE folders SET name = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| name_conflict(e, "Failed to rename folder"))
    }

    async fn set_parent(&self, id: Uuid, parent_id: Option<Uuid>) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "UPDATE folders SET parent_id = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(parent_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| name_conflict(e, "Failed to move folder"))
    }

    async fn delete_and_reparent(&self, id: Uuid) -> AppResult<Option<ReparentSummary>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM folders WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to lock folder", e))?;
        if exists.is_none() {
            return Ok(None);
        }

        let clash = sqlx::query_scalar::<_, String>(
            "SELECT c.name FROM folders c \
             JOIN folders p ON p.id = c.parent_id \
             JOIN folders r ON r.owner_id = p.owner_id AND r.parent_id IS NULL \
                 AND lower(r.name) = lower(c.name) AND r.id <> p.id \
             WHERE c.parent_id = $1 \
             ORDER BY c.name LIMIT 1",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to check child folder names", e))?;
        if let Some(child) = clash {
            return Err(reparent_conflict(&child));
        }

        let files = sqlx::query(
            "UPDATE files SET folder_id = NULL, updated_at = NOW() WHERE folder_id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to reparent files", e))?;

        let folders = sqlx::query(
            "UPDATE folders SET updated_at = NOW() WHERE parent_id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to touch child folders", e))?;

        // ON DELETE SET NULL moves the child folders to root once the parent
        // row is gone, so a child may take its parent's root-level name.
        sqlx::query("DELETE FROM folders WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| name_conflict(e, "Failed to delete folder"))?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit folder delete", e))?;

        Ok(Some(ReparentSummary {
            folder_id: id,
            files_reparented: files.rows_affected(),
            folders_reparented: folders.rows_affected(),
        }))
    }
}
