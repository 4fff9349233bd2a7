//! In-memory implementation of every store trait.
//!
//! All five traits share one mutex-guarded state so cross-table operations
//! (file delete removing its links, folder delete reparenting files) stay
//! atomic exactly as they are in Postgres. Used by tests and for running
//! the server without a database.

mod analytics;
mod catalog;
mod shares;
mod users;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use stashbox_entity::analytics::{StorageStats, UserActionRecord};
use stashbox_entity::file::File;
use stashbox_entity::folder::Folder;
use stashbox_entity::share::ShareLink;
use stashbox_entity::user::User;

#[derive(Debug, Clone)]
struct ShareAccessRow {
    share_link_id: Uuid,
    ip_address: Option<String>,
    accessed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct FileActionRow {
    file_id: Uuid,
    action_type: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    folders: HashMap<Uuid, Folder>,
    files: HashMap<Uuid, File>,
    shares: HashMap<Uuid, ShareLink>,
    share_accesses: Vec<ShareAccessRow>,
    user_actions: Vec<UserActionRecord>,
    file_actions: Vec<FileActionRow>,
    storage_stats: HashMap<Uuid, StorageStats>,
    next_action_id: i64,
}

impl MemoryState {
    /// Whether a sibling other than `except` already uses `name`.
    fn folder_name_taken(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
        name: &str,
        except: &[Uuid],
    ) -> bool {
        let lowered = name.to_lowercase();
        self.folders.values().any(|f| {
            f.owner_id == owner_id
                && f.parent_id == parent_id
                && !except.contains(&f.id)
                && f.name.to_lowercase() == lowered
        })
    }
}

/// Mutex-guarded in-memory store. Cloning shares the state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace a share link verbatim, bypassing validation.
    ///
    /// Lets callers seed links in states the service never produces
    /// directly, such as already expired.
    pub fn put_share_link(&self, link: ShareLink) {
        self.lock().shares.insert(link.id, link);
    }

    /// Insert or replace a folder verbatim, bypassing the sibling name check.
    pub fn put_folder(&self, folder: Folder) {
        self.lock().folders.insert(folder.id, folder);
    }

    /// Number of recorded share accesses for a link.
    pub fn share_access_count(&self, share_link_id: Uuid) -> usize {
        self.lock()
            .share_accesses
            .iter()
            .filter(|a| a.share_link_id == share_link_id)
            .count()
    }
}
