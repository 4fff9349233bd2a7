//! File CRUD operations, always scoped to the owner.

use std::sync::Arc;

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use stashbox_auth::OwnershipGuard;
use stashbox_core::config::CatalogConfig;
use stashbox_core::error::AppError;
use stashbox_core::result::AppResult;
use stashbox_database::store::{FileStore, Stores};
use stashbox_entity::analytics::{FileActionType, UserActionType};
use stashbox_entity::file::File;

use super::cleanup::StorageReclaimer;
use crate::analytics::AnalyticsRecorder;
use crate::context::RequestContext;
use crate::naming::clean_name;

/// Manages file metadata and deletion.
#[derive(Clone)]
pub struct FileService {
    files: Arc<dyn FileStore>,
    guard: OwnershipGuard,
    reclaimer: StorageReclaimer,
    recorder: AnalyticsRecorder,
    config: CatalogConfig,
}

impl std::fmt::Debug for FileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileService").finish()
    }
}

fn vanished(file_id: Uuid) -> AppError {
    AppError::not_found(format!("File {file_id} not found"))
}

impl FileService {
    /// Creates a new file service.
    pub fn new(
        stores: &Stores,
        guard: OwnershipGuard,
        reclaimer: StorageReclaimer,
        recorder: AnalyticsRecorder,
        config: CatalogConfig,
    ) -> Self {
        Self {
            files: stores.files.clone(),
            guard,
            reclaimer,
            recorder,
            config,
        }
    }

    /// Gets an owned file by ID.
    pub async fn get(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<File> {
        self.guard.owned_file(file_id, ctx.user_id).await
    }

    /// Files directly inside `folder_id` (the root when `None`).
    pub async fn list(&self, ctx: &RequestContext, folder_id: Option<Uuid>) -> AppResult<Vec<File>> {
        self.guard.owned_parent(folder_id, ctx.user_id).await?;
        self.files.list_in_folder(ctx.user_id, folder_id).await
    }

    /// Every file the caller owns.
    pub async fn list_all(&self, ctx: &RequestContext) -> AppResult<Vec<File>> {
        self.files.list_by_owner(ctx.user_id).await
    }

    /// Renames an owned file. The stored object keeps its key.
    pub async fn rename(&self, ctx: &RequestContext, file_id: Uuid, new_name: &str) -> AppResult<File> {
        let name = clean_name(new_name, self.config.max_name_length, "File")?;
        let file = self.guard.owned_file(file_id, ctx.user_id).await?;
        let renamed = self
            .files
            .rename(file.id, &name)
            .await?
            .ok_or_else(|| vanished(file_id))?;

        self.recorder.record_user_action(
            ctx.user_id,
            UserActionType::Rename,
            Some(json!({ "file_id": file.id, "from": file.file_name, "to": renamed.file_name })),
        );
        self.recorder
            .record_file_action(file.id, FileActionType::Rename, Some(ctx.user_id), ctx.ip_address.clone());
        info!(user_id = %ctx.user_id, file_id = %file.id, "File renamed");
        Ok(renamed)
    }

    /// Flips the public flag on an owned file.
    pub async fn set_public(&self, ctx: &RequestContext, file_id: Uuid, is_public: bool) -> AppResult<File> {
        let file = self.guard.owned_file(file_id, ctx.user_id).await?;
        let updated = self
            .files
            .set_public(file.id, is_public)
            .await?
            .ok_or_else(|| vanished(file_id))?;
        info!(user_id = %ctx.user_id, file_id = %file.id, is_public, "File visibility changed");
        Ok(updated)
    }

    /// Moves an owned file into `target` (the root when `None`).
    pub async fn move_to_folder(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        target: Option<Uuid>,
    ) -> AppResult<File> {
        let file = self.guard.owned_file(file_id, ctx.user_id).await?;
        self.guard.owned_parent(target, ctx.user_id).await?;
        let moved = self
            .files
            .set_folder(file.id, target)
            .await?
            .ok_or_else(|| vanished(file_id))?;

        self.recorder.record_user_action(
            ctx.user_id,
            UserActionType::Move,
            Some(json!({ "file_id": file.id, "folder_id": target })),
        );
        self.recorder
            .record_file_action(file.id, FileActionType::Move, Some(ctx.user_id), ctx.ip_address.clone());
        info!(user_id = %ctx.user_id, file_id = %file.id, folder_id = ?target, "File moved");
        Ok(moved)
    }

    /// Deletes an owned file.
    ///
    /// The row and its share links go first, in one transaction. The stored
    /// bytes are removed afterwards; a failure there is retried in the
    /// background and never fails this call.
    pub async fn delete(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<()> {
        let file = self.guard.owned_file(file_id, ctx.user_id).await?;
        let deleted = self.files.delete(file.id).await?.ok_or_else(|| vanished(file_id))?;

        self.reclaimer.reclaim(deleted.location()).await;

        self.recorder.record_user_action(
            ctx.user_id,
            UserActionType::Delete,
            Some(json!({ "file_id": deleted.id, "file_name": deleted.file_name })),
        );
        self.recorder.refresh_storage_stats(ctx.user_id);
        info!(user_id = %ctx.user_id, file_id = %deleted.id, "File deleted");
        Ok(())
    }
}
