//! Folder CRUD operations, always scoped to the owner.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use stashbox_auth::OwnershipGuard;
use stashbox_core::config::CatalogConfig;
use stashbox_core::error::{AppError, ErrorKind};
use stashbox_core::result::AppResult;
use stashbox_database::store::{FileStore, FolderStore, Stores};
use stashbox_entity::analytics::UserActionType;
use stashbox_entity::file::File;
use stashbox_entity::folder::{CreateFolder, Folder, FolderTree};

use super::tree::TreeService;
use crate::analytics::AnalyticsRecorder;
use crate::context::RequestContext;
use crate::naming::clean_name;

/// What a folder view shows: where you are and what is inside.
#[derive(Debug, Clone, Serialize)]
pub struct FolderContents {
    /// The folder itself, `None` at the root.
    pub folder: Option<Folder>,
    /// Breadcrumbs from the root down to `folder`.
    pub path: Vec<Folder>,
    pub folders: Vec<Folder>,
    pub files: Vec<File>,
}

/// Manages folder CRUD operations.
#[derive(Clone)]
pub struct FolderService {
    folders: Arc<dyn FolderStore>,
    files: Arc<dyn FileStore>,
    guard: OwnershipGuard,
    tree: TreeService,
    recorder: AnalyticsRecorder,
    config: CatalogConfig,
}

impl std::fmt::Debug for FolderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderService")
            .field("config", &self.config)
            .finish()
    }
}

fn duplicate(name: &str) -> AppError {
    AppError::conflict(format!(
        "A folder named '{name}' already exists in this location"
    ))
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(
        stores: &Stores,
        guard: OwnershipGuard,
        recorder: AnalyticsRecorder,
        config: CatalogConfig,
    ) -> Self {
        Self {
            folders: stores.folders.clone(),
            files: stores.files.clone(),
            tree: TreeService::new(stores.folders.clone(), guard.clone(), config.max_folder_depth),
            guard,
            recorder,
            config,
        }
    }

    /// The tree service sharing this service's stores and depth cap.
    pub fn tree(&self) -> &TreeService {
        &self.tree
    }

    /// Gets an owned folder by ID.
    pub async fn get(&self, ctx: &RequestContext, folder_id: Uuid) -> AppResult<Folder> {
        self.guard.owned_folder(folder_id, ctx.user_id).await
    }

    /// Creates a folder under `parent_id` (the root when `None`).
    ///
    /// Sibling names are unique case-insensitively. The lookup here only
    /// improves the message; the store's unique index decides.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        name: &str,
        parent_id: Option<Uuid>,
    ) -> AppResult<Folder> {
        let name = clean_name(name, self.config.max_name_length, "Folder")?;
        self.guard.owned_parent(parent_id, ctx.user_id).await?;

        if self
            .folders
            .find_by_name(ctx.user_id, parent_id, &name)
            .await?
            .is_some()
        {
            return Err(duplicate(&name));
        }

        let folder = self
            .folders
            .create(&CreateFolder {
                owner_id: ctx.user_id,
                parent_id,
                name: name.clone(),
            })
            .await
            .map_err(|e| match e.kind {
                ErrorKind::Conflict => duplicate(&name),
                _ => e,
            })?;

        self.recorder.record_user_action(
            ctx.user_id,
            UserActionType::CreateFolder,
            Some(json!({ "folder_id": folder.id, "name": folder.name })),
        );
        info!(user_id = %ctx.user_id, folder_id = %folder.id, "Folder created");
        Ok(folder)
    }

    /// Renames an owned folder, keeping sibling names unique.
    pub async fn rename(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        new_name: &str,
    ) -> AppResult<Folder> {
        let name = clean_name(new_name, self.config.max_name_length, "Folder")?;
        let folder = self.guard.owned_folder(folder_id, ctx.user_id).await?;

        let clash = self
            .folders
            .find_by_name(ctx.user_id, folder.parent_id, &name)
            .await?;
        if clash.is_some_and(|existing| existing.id != folder.id) {
            return Err(duplicate(&name));
        }

        let renamed = self
            .folders
            .rename(folder.id, &name)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))?;

        self.recorder.record_user_action(
            ctx.user_id,
            UserActionType::Rename,
            Some(json!({ "folder_id": folder.id, "from": folder.name, "to": renamed.name })),
        );
        info!(user_id = %ctx.user_id, folder_id = %folder.id, "Folder renamed");
        Ok(renamed)
    }

    /// Moves an owned folder under `new_parent` (the root when `None`).
    ///
    /// Moving a folder into itself or any of its descendants is rejected.
    pub async fn move_to(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        new_parent: Option<Uuid>,
    ) -> AppResult<Folder> {
        let folder = self.guard.owned_folder(folder_id, ctx.user_id).await?;

        if let Some(target_id) = new_parent {
            let ancestry = self.tree.path_of(target_id, ctx.user_id).await?;
            if ancestry.iter().any(|f| f.id == folder.id) {
                return Err(AppError::validation(
                    "A folder cannot be moved into itself or one of its subfolders",
                ));
            }
        }
        if folder.parent_id == new_parent {
            return Ok(folder);
        }
        if self
            .folders
            .find_by_name(ctx.user_id, new_parent, &folder.name)
            .await?
            .is_some()
        {
            return Err(duplicate(&folder.name));
        }

        let moved = self
            .folders
            .set_parent(folder.id, new_parent)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))?;

        self.recorder.record_user_action(
            ctx.user_id,
            UserActionType::Move,
            Some(json!({ "folder_id": folder.id, "parent_id": new_parent })),
        );
        info!(user_id = %ctx.user_id, folder_id = %folder.id, parent_id = ?new_parent, "Folder moved");
        Ok(moved)
    }

    /// Deletes an owned folder, moving its files and subfolders to the root.
    pub async fn delete(&self, ctx: &RequestContext, folder_id: Uuid) -> AppResult<bool> {
        let folder = self.guard.owned_folder(folder_id, ctx.user_id).await?;

        let Some(summary) = self.folders.delete_and_reparent(folder.id).await? else {
            return Ok(false);
        };

        self.recorder.record_user_action(
            ctx.user_id,
            UserActionType::DeleteFolder,
            Some(json!({ "folder_id": folder.id, "name": folder.name })),
        );
        info!(
            user_id = %ctx.user_id,
            folder_id = %folder.id,
            files_reparented = summary.files_reparented,
            folders_reparented = summary.folders_reparented,
            "Folder deleted"
        );
        Ok(true)
    }

    /// Direct subfolders of `parent_id` (the root when `None`).
    pub async fn list_children(
        &self,
        ctx: &RequestContext,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<Folder>> {
        self.guard.owned_parent(parent_id, ctx.user_id).await?;
        self.folders.list_children(ctx.user_id, parent_id).await
    }

    /// Subfolders, files and breadcrumbs for one level of the catalog.
    pub async fn contents(
        &self,
        ctx: &RequestContext,
        folder_id: Option<Uuid>,
    ) -> AppResult<FolderContents> {
        let path = match folder_id {
            Some(id) => self.tree.path_of(id, ctx.user_id).await?,
            None => Vec::new(),
        };
        let (folders, files) = futures::try_join!(
            self.folders.list_children(ctx.user_id, folder_id),
            self.files.list_in_folder(ctx.user_id, folder_id),
        )?;

        Ok(FolderContents {
            folder: path.last().cloned(),
            path,
            folders,
            files,
        })
    }

    /// The breadcrumb path of an owned folder.
    pub async fn path_of(&self, ctx: &RequestContext, folder_id: Uuid) -> AppResult<Vec<Folder>> {
        self.tree.path_of(folder_id, ctx.user_id).await
    }

    /// The caller's whole folder forest.
    pub async fn tree_of(&self, ctx: &RequestContext) -> AppResult<FolderTree> {
        self.tree.tree_of(ctx.user_id).await
    }
}
