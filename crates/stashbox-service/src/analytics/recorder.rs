//! Fire-and-forget analytics sinks.
//!
//! Every method spawns its write and returns immediately. A failed write is
//! logged at `warn` and never reaches the caller.

use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use stashbox_database::store::{AnalyticsStore, FileStore, Stores};
use stashbox_entity::analytics::{
    FileActionType, NewFileAction, NewShareAccess, NewUserAction, UserActionType,
};

use crate::context::ClientInfo;

/// Spawns analytics writes off the request path.
///
/// The returned handles may be dropped; tests await them.
#[derive(Clone)]
pub struct AnalyticsRecorder {
    analytics: Arc<dyn AnalyticsStore>,
    files: Arc<dyn FileStore>,
}

impl std::fmt::Debug for AnalyticsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsRecorder").finish()
    }
}

impl AnalyticsRecorder {
    /// Creates a recorder over the analytics and file stores.
    pub fn new(stores: &Stores) -> Self {
        Self {
            analytics: stores.analytics.clone(),
            files: stores.files.clone(),
        }
    }

    /// Records a public access of a share link.
    pub fn record_share_access(&self, share_link_id: Uuid, client: &ClientInfo) -> JoinHandle<()> {
        let store = self.analytics.clone();
        let event = NewShareAccess {
            share_link_id,
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
        };
        tokio::spawn(async move {
            if let Err(e) = store.insert_share_access(&event).await {
                warn!(share_id = %share_link_id, error = %e, "Failed to record share access");
            }
        })
    }

    /// Records an action performed by an authenticated user.
    pub fn record_user_action(
        &self,
        user_id: Uuid,
        action_type: UserActionType,
        details: Option<Value>,
    ) -> JoinHandle<()> {
        let store = self.analytics.clone();
        let event = NewUserAction {
            user_id,
            action_type,
            details,
        };
        tokio::spawn(async move {
            if let Err(e) = store.insert_user_action(&event).await {
                warn!(%user_id, action = %action_type, error = %e, "Failed to record user action");
            }
        })
    }

    /// Records an action against a file. Anonymous for public downloads.
    pub fn record_file_action(
        &self,
        file_id: Uuid,
        action_type: FileActionType,
        user_id: Option<Uuid>,
        ip_address: Option<String>,
    ) -> JoinHandle<()> {
        let store = self.analytics.clone();
        let event = NewFileAction {
            file_id,
            action_type,
            user_id,
            ip_address,
        };
        tokio::spawn(async move {
            if let Err(e) = store.insert_file_action(&event).await {
                warn!(%file_id, error = %e, "Failed to record file action");
            }
        })
    }

    /// Recomputes the user's storage snapshot from the file catalog.
    pub fn refresh_storage_stats(&self, user_id: Uuid) -> JoinHandle<()> {
        let store = self.analytics.clone();
        let files = self.files.clone();
        tokio::spawn(async move {
            let result = async {
                let (count, size) = files.usage(user_id).await?;
                store.upsert_storage_stats(user_id, count, size).await
            }
            .await;
            match result {
                Ok(stats) => debug!(
                    %user_id,
                    total_files = stats.total_files,
                    total_size = stats.total_size,
                    "Storage snapshot refreshed"
                ),
                Err(e) => warn!(%user_id, error = %e, "Failed to refresh storage stats"),
            }
        })
    }
}
