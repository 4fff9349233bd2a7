//! Owner downloads: hand out a URL or path for the stored bytes.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use stashbox_auth::OwnershipGuard;
use stashbox_core::result::AppResult;
use stashbox_entity::analytics::{FileActionType, UserActionType};
use stashbox_entity::file::File;
use stashbox_storage::{AccessTarget, StorageManager};

use crate::analytics::AnalyticsRecorder;
use crate::context::RequestContext;

/// A file and where its bytes can be fetched.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadResult {
    pub file: File,
    pub access: AccessTarget,
}

/// Grants owners access to their own files.
#[derive(Clone)]
pub struct DownloadService {
    guard: OwnershipGuard,
    storage: Arc<StorageManager>,
    recorder: AnalyticsRecorder,
}

impl std::fmt::Debug for DownloadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadService").finish()
    }
}

impl DownloadService {
    /// Creates a new download service.
    pub fn new(guard: OwnershipGuard, storage: Arc<StorageManager>, recorder: AnalyticsRecorder) -> Self {
        Self {
            guard,
            storage,
            recorder,
        }
    }

    /// Downloads an owned file.
    pub async fn download(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<DownloadResult> {
        let file = self.guard.owned_file(file_id, ctx.user_id).await?;
        let access = self.storage.retrieve_access(&file.location()).await?;

        self.recorder.record_user_action(
            ctx.user_id,
            UserActionType::Download,
            Some(serde_json::json!({ "file_id": file.id, "file_name": file.file_name })),
        );
        self.recorder
            .record_file_action(file.id, FileActionType::Download, Some(ctx.user_id), ctx.ip_address.clone());
        info!(user_id = %ctx.user_id, file_id = %file.id, "File downloaded");

        Ok(DownloadResult { file, access })
    }
}
