//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use stashbox_auth::{JwtDecoder, JwtEncoder, OwnershipGuard, PasswordHasher, PasswordValidator};
use stashbox_core::config::AppConfig;
use stashbox_database::Stores;
use stashbox_service::{
    AccessService, AnalyticsRecorder, AnalyticsService, DownloadService, FileService,
    FolderService, IdentityService, PreviewService, ShareService, StorageReclaimer,
    UploadService,
};
use stashbox_storage::StorageManager;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// Remote-first storage with the local fallback
    pub storage: Arc<StorageManager>,

    // ── Services ─────────────────────────────────────────────
    pub identity_service: Arc<IdentityService>,
    pub folder_service: Arc<FolderService>,
    pub file_service: Arc<FileService>,
    pub upload_service: Arc<UploadService>,
    pub download_service: Arc<DownloadService>,
    pub preview_service: Arc<PreviewService>,
    pub share_service: Arc<ShareService>,
    pub access_service: Arc<AccessService>,
    pub analytics_service: Arc<AnalyticsService>,
}

impl AppState {
    /// Wires every service over the given stores and storage manager.
    pub fn build(config: AppConfig, stores: &Stores, storage: Arc<StorageManager>) -> Self {
        // ── Auth ─────────────────────────────────────────────
        let password_hasher = Arc::new(PasswordHasher::new());
        let guard = OwnershipGuard::new(stores);
        let recorder = AnalyticsRecorder::new(stores);

        let identity_service = Arc::new(IdentityService::new(
            stores,
            Arc::clone(&password_hasher),
            PasswordValidator::new(&config.auth),
            JwtEncoder::new(&config.auth),
            JwtDecoder::new(&config.auth),
            recorder.clone(),
        ));

        // ── Catalog ──────────────────────────────────────────
        let folder_service = Arc::new(FolderService::new(
            stores,
            guard.clone(),
            recorder.clone(),
            config.catalog.clone(),
        ));
        let reclaimer = StorageReclaimer::new(
            Arc::clone(&storage),
            config.storage.delete_retry.clone(),
        );
        let file_service = Arc::new(FileService::new(
            stores,
            guard.clone(),
            reclaimer,
            recorder.clone(),
            config.catalog.clone(),
        ));
        let upload_service = Arc::new(UploadService::new(
            stores,
            guard.clone(),
            Arc::clone(&storage),
            recorder.clone(),
            config.storage.clone(),
        ));
        let download_service = Arc::new(DownloadService::new(
            guard.clone(),
            Arc::clone(&storage),
            recorder.clone(),
        ));
        let preview_service = Arc::new(PreviewService::new(
            guard.clone(),
            Arc::clone(&storage),
            recorder.clone(),
        ));

        // ── Sharing ──────────────────────────────────────────
        let share_service = Arc::new(ShareService::new(
            stores,
            guard.clone(),
            Arc::clone(&password_hasher),
            recorder.clone(),
            config.share.clone(),
        ));
        let access_service = Arc::new(AccessService::new(
            stores,
            Arc::clone(&storage),
            password_hasher,
            recorder,
        ));

        // ── Analytics ────────────────────────────────────────
        let analytics_service = Arc::new(AnalyticsService::new(
            stores,
            guard,
            config.storage.display_quota_bytes,
        ));

        Self {
            config: Arc::new(config),
            storage,
            identity_service,
            folder_service,
            file_service,
            upload_service,
            download_service,
            preview_service,
            share_service,
            access_service,
            analytics_service,
        }
    }
}
