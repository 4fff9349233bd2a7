//! File upload service.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use stashbox_auth::OwnershipGuard;
use stashbox_core::config::StorageConfig;
use stashbox_core::error::AppError;
use stashbox_core::result::AppResult;
use stashbox_database::store::{FileStore, Stores};
use stashbox_entity::analytics::{FileActionType, UserActionType};
use stashbox_entity::file::{CreateFile, File, format_file_size};
use stashbox_storage::StorageManager;
use stashbox_storage::keys::{dotted_extension, sanitize_file_name};

use crate::analytics::AnalyticsRecorder;
use crate::context::RequestContext;

/// One file of a (possibly multi-file) upload.
#[derive(Debug, Clone)]
pub struct UploadItem {
    /// Name as sent by the client.
    pub file_name: String,
    /// Content type as sent by the client.
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// A file that could not be stored, and why.
#[derive(Debug, Clone, Serialize)]
pub struct UploadFailure {
    pub file_name: String,
    pub reason: String,
}

/// Outcome of a multi-file upload. Each file succeeds or fails on its own.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadReport {
    pub uploaded: Vec<File>,
    pub failed: Vec<UploadFailure>,
}

/// Validates, stores and catalogs uploaded files.
#[derive(Clone)]
pub struct UploadService {
    files: Arc<dyn FileStore>,
    guard: OwnershipGuard,
    storage: Arc<StorageManager>,
    recorder: AnalyticsRecorder,
    config: StorageConfig,
}

impl std::fmt::Debug for UploadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadService").finish()
    }
}

impl UploadService {
    /// Creates a new upload service.
    pub fn new(
        stores: &Stores,
        guard: OwnershipGuard,
        storage: Arc<StorageManager>,
        recorder: AnalyticsRecorder,
        config: StorageConfig,
    ) -> Self {
        Self {
            files: stores.files.clone(),
            guard,
            storage,
            recorder,
            config,
        }
    }

    /// Checks an item against the size ceiling and extension allow-list.
    ///
    /// Returns the sanitized name the file is cataloged under.
    fn validate(&self, item: &UploadItem) -> AppResult<String> {
        if item.file_name.trim().is_empty() {
            return Err(AppError::validation("No file selected"));
        }
        if item.data.len() as u64 > self.config.max_upload_size_bytes {
            return Err(AppError::validation(format!(
                "File exceeds the maximum upload size of {}",
                format_file_size(self.config.max_upload_size_bytes)
            )));
        }

        let name = sanitize_file_name(&item.file_name);
        let ext = dotted_extension(&name);
        let allowed = ext
            .strip_prefix('.')
            .is_some_and(|ext| self.config.is_extension_allowed(ext));
        if !allowed {
            return Err(AppError::validation(format!(
                "File type not allowed. Allowed types: {}",
                self.config.allowed_extensions.join(", ")
            )));
        }
        Ok(name)
    }

    async fn store_one(
        &self,
        ctx: &RequestContext,
        folder_id: Option<Uuid>,
        item: UploadItem,
    ) -> AppResult<File> {
        let file_name = self.validate(&item)?;
        let size_bytes = item.data.len() as i64;

        let stored = self
            .storage
            .store(item.data, &file_name, ctx.user_id, item.content_type.as_deref())
            .await?;

        let created = self
            .files
            .create(&CreateFile {
                owner_id: ctx.user_id,
                folder_id,
                file_name,
                size_bytes,
                mime_type: item.content_type,
                location: stored.location.clone(),
                storage_url: stored.url,
                is_public: false,
            })
            .await;

        let file = match created {
            Ok(file) => file,
            Err(e) => {
                // The bytes are stored but uncatalogued; drop them.
                if let Err(cleanup) = self.storage.delete(&stored.location).await {
                    warn!(key = stored.location.key(), error = %cleanup, "Failed to remove orphaned upload");
                }
                return Err(e);
            }
        };

        self.recorder.record_user_action(
            ctx.user_id,
            UserActionType::Upload,
            Some(json!({ "file_id": file.id, "file_name": file.file_name, "size": file.size_bytes })),
        );
        self.recorder
            .record_file_action(file.id, FileActionType::Upload, Some(ctx.user_id), ctx.ip_address.clone());
        info!(
            user_id = %ctx.user_id,
            file_id = %file.id,
            backend = %file.storage_backend,
            size_bytes = file.size_bytes,
            "File uploaded"
        );
        Ok(file)
    }

    /// Uploads a single file into `folder_id` (the root when `None`).
    pub async fn upload(
        &self,
        ctx: &RequestContext,
        folder_id: Option<Uuid>,
        item: UploadItem,
    ) -> AppResult<File> {
        self.guard.owned_parent(folder_id, ctx.user_id).await?;
        let file = self.store_one(ctx, folder_id, item).await?;
        self.recorder.refresh_storage_stats(ctx.user_id);
        Ok(file)
    }

    /// Uploads several files; one failing does not stop the others.
    ///
    /// The target folder is checked once, up front, and a bad folder fails
    /// the whole request.
    pub async fn upload_many(
        &self,
        ctx: &RequestContext,
        folder_id: Option<Uuid>,
        items: Vec<UploadItem>,
    ) -> AppResult<UploadReport> {
        if items.is_empty() {
            return Err(AppError::validation("No files selected"));
        }
        self.guard.owned_parent(folder_id, ctx.user_id).await?;

        let mut report = UploadReport::default();
        for item in items {
            let file_name = item.file_name.clone();
            match self.store_one(ctx, folder_id, item).await {
                Ok(file) => report.uploaded.push(file),
                Err(e) => {
                    warn!(user_id = %ctx.user_id, file_name = %file_name, error = %e, "Upload rejected");
                    let reason = if e.kind.is_user_facing() {
                        e.message
                    } else {
                        "Could not store file".to_string()
                    };
                    report.failed.push(UploadFailure { file_name, reason });
                }
            }
        }

        if !report.uploaded.is_empty() {
            self.recorder.refresh_storage_stats(ctx.user_id);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, FlakyObjectStore};
    use stashbox_core::ErrorKind;
    use stashbox_entity::file::StorageBackend;
    use tempfile::TempDir;

    fn item(name: &str, body: &'static [u8]) -> UploadItem {
        UploadItem {
            file_name: name.to_string(),
            content_type: Some("text/plain".into()),
            data: Bytes::from_static(body),
        }
    }

    fn service(stores: &Stores, storage: Arc<StorageManager>, config: StorageConfig) -> UploadService {
        UploadService::new(
            stores,
            OwnershipGuard::new(stores),
            storage,
            AnalyticsRecorder::new(stores),
            config,
        )
    }

    #[tokio::test]
    async fn test_upload_stores_locally_without_remote() {
        let dir = TempDir::new().unwrap();
        let stores = Stores::in_memory();
        let storage = testing::local_storage(&dir).await;
        let uploads = service(&stores, storage.clone(), StorageConfig::default());
        let ctx = RequestContext::for_user(Uuid::new_v4());

        let file = uploads
            .upload(&ctx, None, item("My Notes.txt", b"hello"))
            .await
            .unwrap();

        assert_eq!(file.file_name, "My_Notes.txt");
        assert_eq!(file.size_bytes, 5);
        assert_eq!(file.storage_backend, StorageBackend::Local);
        let bytes = storage.local().read_bytes(&file.storage_key).await.unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn test_remote_failure_falls_back_to_local() {
        let dir = TempDir::new().unwrap();
        let stores = Stores::in_memory();
        let storage = testing::remote_storage(&dir, FlakyObjectStore::failing(1)).await;
        let uploads = service(&stores, storage, StorageConfig::default());
        let ctx = RequestContext::for_user(Uuid::new_v4());

        let first = uploads.upload(&ctx, None, item("a.txt", b"a")).await.unwrap();
        let second = uploads.upload(&ctx, None, item("b.txt", b"b")).await.unwrap();

        assert_eq!(first.storage_backend, StorageBackend::Local);
        assert_eq!(second.storage_backend, StorageBackend::Remote);
    }

    #[tokio::test]
    async fn test_rejects_disallowed_and_oversized() {
        let dir = TempDir::new().unwrap();
        let stores = Stores::in_memory();
        let config = StorageConfig {
            max_upload_size_bytes: 4,
            ..StorageConfig::default()
        };
        let uploads = service(&stores, testing::local_storage(&dir).await, config);
        let ctx = RequestContext::for_user(Uuid::new_v4());

        let err = uploads.upload(&ctx, None, item("run.exe", b"MZ")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        let err = uploads.upload(&ctx, None, item("big.txt", b"12345")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        let err = uploads.upload(&ctx, None, item("noext", b"1")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_upload_many_reports_each_file() {
        let dir = TempDir::new().unwrap();
        let stores = Stores::in_memory();
        let uploads = service(&stores, testing::local_storage(&dir).await, StorageConfig::default());
        let owner = Uuid::new_v4();
        let ctx = RequestContext::for_user(owner);

        let report = uploads
            .upload_many(
                &ctx,
                None,
                vec![item("ok.pdf", b"%PDF"), item("nope.sh", b"#!"), item("fine.png", b"PNG")],
            )
            .await
            .unwrap();

        assert_eq!(report.uploaded.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].file_name, "nope.sh");
        assert_eq!(stores.files.usage(owner).await.unwrap(), (2, 7));
    }

    #[tokio::test]
    async fn test_foreign_folder_fails_whole_batch() {
        let dir = TempDir::new().unwrap();
        let stores = Stores::in_memory();
        let uploads = service(&stores, testing::local_storage(&dir).await, StorageConfig::default());
        let foreign = stores
            .folders
            .create(&stashbox_entity::folder::CreateFolder {
                owner_id: Uuid::new_v4(),
                parent_id: None,
                name: "x".into(),
            })
            .await
            .unwrap();

        let err = uploads
            .upload_many(&RequestContext::for_user(Uuid::new_v4()), Some(foreign.id), vec![item("a.txt", b"a")])
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }
}
