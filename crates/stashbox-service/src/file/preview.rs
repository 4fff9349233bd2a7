//! File previews: classify by extension and point at the bytes.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use stashbox_auth::OwnershipGuard;
use stashbox_core::result::AppResult;
use stashbox_entity::analytics::FileActionType;
use stashbox_entity::file::{File, FileKind, format_file_size};
use stashbox_storage::{AccessTarget, StorageManager};

use crate::analytics::AnalyticsRecorder;
use crate::context::RequestContext;

/// What the preview page renders.
#[derive(Debug, Clone, Serialize)]
pub struct FilePreview {
    pub file: File,
    pub kind: FileKind,
    pub formatted_size: String,
    pub preview_available: bool,
    /// Where to load the content from, when it can be previewed inline.
    pub access: Option<AccessTarget>,
}

/// Serves preview metadata for owned files.
#[derive(Clone)]
pub struct PreviewService {
    guard: OwnershipGuard,
    storage: Arc<StorageManager>,
    recorder: AnalyticsRecorder,
}

impl std::fmt::Debug for PreviewService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewService").finish()
    }
}

impl PreviewService {
    /// Creates a new preview service.
    pub fn new(guard: OwnershipGuard, storage: Arc<StorageManager>, recorder: AnalyticsRecorder) -> Self {
        Self {
            guard,
            storage,
            recorder,
        }
    }

    /// Preview details for an owned file.
    pub async fn preview(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<FilePreview> {
        let file = self.guard.owned_file(file_id, ctx.user_id).await?;
        let kind = file.kind();
        let preview_available = kind.preview_available();
        let access = if preview_available {
            Some(self.storage.retrieve_access(&file.location()).await?)
        } else {
            None
        };

        self.recorder
            .record_file_action(file.id, FileActionType::Preview, Some(ctx.user_id), ctx.ip_address.clone());

        Ok(FilePreview {
            formatted_size: format_file_size(file.size_bytes.max(0) as u64),
            file,
            kind,
            preview_available,
            access,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use stashbox_database::Stores;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_preview_by_kind() {
        let dir = TempDir::new().unwrap();
        let stores = Stores::in_memory();
        let previews = PreviewService::new(
            OwnershipGuard::new(&stores),
            testing::local_storage(&dir).await,
            AnalyticsRecorder::new(&stores),
        );
        let owner = Uuid::new_v4();
        let ctx = RequestContext::for_user(owner);

        let pdf = testing::seed_file(&stores, owner, "paper.pdf").await;
        let preview = previews.preview(&ctx, pdf.id).await.unwrap();
        assert_eq!(preview.kind, FileKind::Pdf);
        assert!(preview.preview_available);
        assert!(preview.access.is_some());
        assert_eq!(preview.formatted_size, "1.5 KB");

        let zip = testing::seed_file(&stores, owner, "bundle.zip").await;
        let preview = previews.preview(&ctx, zip.id).await.unwrap();
        assert_eq!(preview.kind, FileKind::Archive);
        assert!(!preview.preview_available);
        assert!(preview.access.is_none());
    }
}
