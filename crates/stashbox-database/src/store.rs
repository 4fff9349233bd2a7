//! Repository traits the service layer is written against.
//!
//! Each trait has a Postgres implementation in [`crate::repositories`] and
//! an in-memory one in [`crate::memory`]. Services receive them as
//! `Arc<dyn …>` through [`Stores`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use stashbox_core::result::AppResult;
use stashbox_entity::analytics::{
    ActionCount, DailyCount, FileStats, NewFileAction, NewShareAccess, NewUserAction, PopularFile,
    ShareStats, StorageStats, UserActionRecord,
};
use stashbox_entity::file::{CreateFile, File};
use stashbox_entity::folder::{CreateFolder, Folder, ReparentSummary};
use stashbox_entity::share::{CreateShareLink, ShareLink};
use stashbox_entity::user::{CreateUser, User};

use crate::memory::MemoryStore;
use crate::repositories::{
    AnalyticsRepository, FileRepository, FolderRepository, ShareRepository, UserRepository,
};

/// User persistence.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Case-insensitive lookup.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Insert a user. A taken email is a `Conflict`.
    async fn create(&self, data: &CreateUser) -> AppResult<User>;

    /// Replace the password hash. Returns `false` if the user is missing.
    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<bool>;
}

/// Folder persistence.
///
/// Writes that would give two siblings the same case-insensitive name fail
/// with `Conflict`.
#[async_trait]
pub trait FolderStore: Send + Sync + 'static {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Folder>>;

    /// Find a sibling by case-insensitive name.
    async fn find_by_name(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Option<Folder>>;

    /// Direct children of `parent_id` (root level when `None`), sorted by name.
    async fn list_children(&self, owner_id: Uuid, parent_id: Option<Uuid>)
    -> AppResult<Vec<Folder>>;

    /// Every folder the user owns.
    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Folder>>;

    async fn create(&self, data: &CreateFolder) -> AppResult<Folder>;

    async fn rename(&self, id: Uuid, name: &str) -> AppResult<Option<Folder>>;

    async fn set_parent(&self, id: Uuid, parent_id: Option<Uuid>) -> AppResult<Option<Folder>>;

    /// Atomically move child files and folders to root and delete the row.
    ///
    /// Returns `None` when the folder does not exist.
    async fn delete_and_reparent(&self, id: Uuid) -> AppResult<Option<ReparentSummary>>;
}

/// File metadata persistence.
#[async_trait]
pub trait FileStore: Send + Sync + 'static {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<File>>;

    /// Files directly in `folder_id` (root level when `None`), newest first.
    async fn list_in_folder(&self, owner_id: Uuid, folder_id: Option<Uuid>)
    -> AppResult<Vec<File>>;

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<File>>;

    async fn create(&self, data: &CreateFile) -> AppResult<File>;

    async fn rename(&self, id: Uuid, file_name: &str) -> AppResult<Option<File>>;

    async fn set_public(&self, id: Uuid, is_public: bool) -> AppResult<Option<File>>;

    async fn set_folder(&self, id: Uuid, folder_id: Option<Uuid>) -> AppResult<Option<File>>;

    /// Delete the row and its share links in one transaction.
    ///
    /// Returns the deleted row so the caller can reclaim its storage.
    async fn delete(&self, id: Uuid) -> AppResult<Option<File>>;

    /// `(file count, total bytes)` for a user.
    async fn usage(&self, owner_id: Uuid) -> AppResult<(i64, i64)>;
}

/// Share link persistence.
#[async_trait]
pub trait ShareStore: Send + Sync + 'static {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ShareLink>>;

    async fn find_by_token(&self, token: &str) -> AppResult<Option<ShareLink>>;

    /// Insert a link. A duplicate token is a `Conflict`.
    async fn create(&self, data: &CreateShareLink) -> AppResult<ShareLink>;

    async fn list_for_file(&self, file_id: Uuid) -> AppResult<Vec<ShareLink>>;

    /// Links on every file the user owns, newest first.
    async fn list_for_owner(&self, owner_id: Uuid) -> AppResult<Vec<ShareLink>>;

    /// Increment `download_count` iff the link is active, unexpired and
    /// under its limit, as one conditional update.
    ///
    /// Returns the new count, or `None` when no row qualified.
    async fn try_consume(&self, token: &str) -> AppResult<Option<i32>>;

    /// Clear `is_active`. Returns `false` if it was already cleared.
    async fn deactivate(&self, id: Uuid) -> AppResult<bool>;

    /// Delete links with `expires_at <= now`. Returns the number removed.
    async fn delete_expired(&self) -> AppResult<u64>;
}

/// Analytics sinks and read models.
#[async_trait]
pub trait AnalyticsStore: Send + Sync + 'static {
    async fn insert_share_access(&self, event: &NewShareAccess) -> AppResult<()>;

    async fn insert_user_action(&self, event: &NewUserAction) -> AppResult<()>;

    async fn insert_file_action(&self, event: &NewFileAction) -> AppResult<()>;

    /// Overwrite the user's storage snapshot.
    async fn upsert_storage_stats(
        &self,
        user_id: Uuid,
        total_files: i64,
        total_size: i64,
    ) -> AppResult<StorageStats>;

    async fn storage_stats(&self, user_id: Uuid) -> AppResult<Option<StorageStats>>;

    async fn share_stats(&self, share_link_id: Uuid) -> AppResult<ShareStats>;

    /// Per-day access counts since `since`, oldest first.
    async fn share_timeline(
        &self,
        share_link_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<DailyCount>>;

    /// Most recent actions, newest first.
    async fn recent_user_actions(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<UserActionRecord>>;

    /// Action counts since `since`, most frequent first.
    async fn action_summary(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<ActionCount>>;

    /// Per-day login counts since `since`, oldest first.
    async fn login_frequency(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<DailyCount>>;

    /// The user's files ranked by download count.
    async fn popular_files(&self, owner_id: Uuid, limit: i64) -> AppResult<Vec<PopularFile>>;

    async fn file_stats(&self, file_id: Uuid) -> AppResult<FileStats>;
}

/// The full set of stores, injected into services at construction.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub folders: Arc<dyn FolderStore>,
    pub files: Arc<dyn FileStore>,
    pub shares: Arc<dyn ShareStore>,
    pub analytics: Arc<dyn AnalyticsStore>,
}

impl Stores {
    /// Postgres-backed stores sharing one pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            folders: Arc::new(FolderRepository::new(pool.clone())),
            files: Arc::new(FileRepository::new(pool.clone())),
            shares: Arc::new(ShareRepository::new(pool.clone())),
            analytics: Arc::new(AnalyticsRepository::new(pool)),
        }
    }

    /// In-memory stores sharing one state.
    pub fn in_memory() -> Self {
        Self::from_memory(MemoryStore::new())
    }

    /// Stores backed by an existing in-memory state, so a test can keep a
    /// handle for seeding and inspection.
    pub fn from_memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            folders: store.clone(),
            files: store.clone(),
            shares: store.clone(),
            analytics: store,
        }
    }
}

impl fmt::Debug for Stores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}
