//! The ownership guard.
//!
//! Every file, folder and share-link operation resolves its target through
//! here before mutating or disclosing it. Share links are owned through
//! their file.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use stashbox_core::error::AppError;
use stashbox_core::result::AppResult;
use stashbox_database::store::{FileStore, FolderStore, ShareStore, Stores};
use stashbox_entity::ResourceKind;
use stashbox_entity::file::File;
use stashbox_entity::folder::Folder;
use stashbox_entity::share::ShareLink;

/// Centralized `owner_id == user` check.
#[derive(Clone)]
pub struct OwnershipGuard {
    folders: Arc<dyn FolderStore>,
    files: Arc<dyn FileStore>,
    shares: Arc<dyn ShareStore>,
}

impl std::fmt::Debug for OwnershipGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnershipGuard").finish_non_exhaustive()
    }
}

fn denied(kind: ResourceKind, id: Uuid, user_id: Uuid) -> AppError {
    warn!(%user_id, resource = %kind, resource_id = %id, "Ownership check failed");
    AppError::authorization(format!("{kind} does not belong to you"))
}

impl OwnershipGuard {
    /// Build a guard over the injected stores.
    pub fn new(stores: &Stores) -> Self {
        Self {
            folders: stores.folders.clone(),
            files: stores.files.clone(),
            shares: stores.shares.clone(),
        }
    }

    /// Fail unless `user_id` owns the resource.
    ///
    /// A missing resource is `NotFound`; someone else's is `Authorization`.
    pub async fn assert_owns(
        &self,
        kind: ResourceKind,
        resource_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<()> {
        match kind {
            ResourceKind::File => self.owned_file(resource_id, user_id).await.map(|_| ()),
            ResourceKind::Folder => self.owned_folder(resource_id, user_id).await.map(|_| ()),
            ResourceKind::ShareLink => self.owned_share(resource_id, user_id).await.map(|_| ()),
        }
    }

    /// The file, if `user_id` owns it.
    pub async fn owned_file(&self, file_id: Uuid, user_id: Uuid) -> AppResult<File> {
        let file = self
            .files
            .find_by_id(file_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))?;
        if file.owner_id != user_id {
            return Err(denied(ResourceKind::File, file_id, user_id));
        }
        Ok(file)
    }

    /// The folder, if `user_id` owns it.
    pub async fn owned_folder(&self, folder_id: Uuid, user_id: Uuid) -> AppResult<Folder> {
        let folder = self
            .folders
            .find_by_id(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))?;
        if folder.owner_id != user_id {
            return Err(denied(ResourceKind::Folder, folder_id, user_id));
        }
        Ok(folder)
    }

    /// Validate an optional target folder; `None` is the root and always allowed.
    pub async fn owned_parent(
        &self,
        folder_id: Option<Uuid>,
        user_id: Uuid,
    ) -> AppResult<Option<Folder>> {
        match folder_id {
            Some(id) => self.owned_folder(id, user_id).await.map(Some),
            None => Ok(None),
        }
    }

    /// The share link and its file, if `user_id` owns the file.
    pub async fn owned_share(&self, share_id: Uuid, user_id: Uuid) -> AppResult<(ShareLink, File)> {
        let link = self
            .shares
            .find_by_id(share_id)
            .await?
            .ok_or_else(|| AppError::not_found("Share link not found"))?;
        self.check_link(link, user_id).await
    }

    /// Same as [`Self::owned_share`], looked up by token.
    pub async fn owned_share_by_token(
        &self,
        token: &str,
        user_id: Uuid,
    ) -> AppResult<(ShareLink, File)> {
        let link = self
            .shares
            .find_by_token(token)
            .await?
            .ok_or_else(|| AppError::not_found("Share link not found"))?;
        self.check_link(link, user_id).await
    }

    async fn check_link(&self, link: ShareLink, user_id: Uuid) -> AppResult<(ShareLink, File)> {
        let file = self
            .files
            .find_by_id(link.file_id)
            .await?
            .ok_or_else(|| AppError::not_found("Share link not found"))?;
        if file.owner_id != user_id {
            return Err(denied(ResourceKind::ShareLink, link.id, user_id));
        }
        Ok((link, file))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use stashbox_core::ErrorKind;
    use stashbox_entity::file::{CreateFile, StorageLocation};
    use stashbox_entity::folder::CreateFolder;
    use stashbox_entity::share::CreateShareLink;

    use super::*;

    async fn seeded() -> (Stores, Uuid, File) {
        let stores = Stores::in_memory();
        let owner = Uuid::new_v4();
        let file = stores
            .files
            .create(&CreateFile {
                owner_id: owner,
                folder_id: None,
                file_name: "plan.pdf".to_string(),
                size_bytes: 3,
                mime_type: None,
                location: StorageLocation::Local {
                    path: format!("{owner}/x_plan.pdf"),
                },
                storage_url: "/static/uploads/x".to_string(),
                is_public: false,
            })
            .await
            .unwrap();
        (stores, owner, file)
    }

    #[tokio::test]
    async fn test_file_ownership() {
        let (stores, owner, file) = seeded().await;
        let guard = OwnershipGuard::new(&stores);

        guard.assert_owns(ResourceKind::File, file.id, owner).await.unwrap();

        let err = guard
            .assert_owns(ResourceKind::File, file.id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);

        let err = guard
            .assert_owns(ResourceKind::File, Uuid::new_v4(), owner)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_share_link_owned_through_file() {
        let (stores, owner, file) = seeded().await;
        let link = stores
            .shares
            .create(&CreateShareLink {
                file_id: file.id,
                token: "t".repeat(32),
                expires_at: Utc::now() + Duration::hours(1),
                password_hash: None,
                max_downloads: None,
            })
            .await
            .unwrap();
        let guard = OwnershipGuard::new(&stores);

        let (found, via) = guard.owned_share(link.id, owner).await.unwrap();
        assert_eq!(found.id, link.id);
        assert_eq!(via.id, file.id);

        let err = guard
            .assert_owns(ResourceKind::ShareLink, link.id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn test_folder_ownership() {
        let (stores, owner, _) = seeded().await;
        let folder = stores
            .folders
            .create(&CreateFolder {
                owner_id: owner,
                parent_id: None,
                name: "Docs".to_string(),
            })
            .await
            .unwrap();
        let guard = OwnershipGuard::new(&stores);

        assert!(guard.owned_parent(None, Uuid::new_v4()).await.unwrap().is_none());
        assert_eq!(
            guard.owned_parent(Some(folder.id), owner).await.unwrap().unwrap().id,
            folder.id
        );
        let err = guard.owned_folder(folder.id, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }
}
