//! Storage deletes that outlive the metadata row.
//!
//! A file row is deleted first; the bytes follow. When that second step
//! fails the object is retried in the background with exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use stashbox_core::config::DeleteRetryConfig;
use stashbox_entity::file::StorageLocation;
use stashbox_storage::StorageManager;

/// Deletes stored objects, retrying failures off the request path.
#[derive(Debug, Clone)]
pub struct StorageReclaimer {
    storage: Arc<StorageManager>,
    retry: DeleteRetryConfig,
}

impl StorageReclaimer {
    /// Creates a reclaimer over `storage`.
    pub fn new(storage: Arc<StorageManager>, retry: DeleteRetryConfig) -> Self {
        Self { storage, retry }
    }

    /// Deletes `location` now; on failure schedules background retries.
    ///
    /// Returns the retry task when one was spawned.
    pub async fn reclaim(&self, location: StorageLocation) -> Option<JoinHandle<()>> {
        let err = match self.storage.delete(&location).await {
            Ok(()) => return None,
            Err(e) => e,
        };
        if self.retry.max_attempts <= 1 {
            error!(key = location.key(), error = %err, "Storage delete failed, object orphaned");
            return None;
        }

        warn!(key = location.key(), error = %err, "Storage delete failed, retrying in background");
        let storage = self.storage.clone();
        let retry = self.retry.clone();
        Some(tokio::spawn(async move {
            retry_delete(storage, location, retry).await;
        }))
    }
}

async fn retry_delete(storage: Arc<StorageManager>, location: StorageLocation, retry: DeleteRetryConfig) {
    let mut delay = Duration::from_millis(retry.base_delay_ms);
    // Attempt 1 already ran synchronously.
    for attempt in 2..=retry.max_attempts {
        tokio::time::sleep(delay).await;
        match storage.delete(&location).await {
            Ok(()) => {
                info!(key = location.key(), attempt, "Storage delete succeeded on retry");
                return;
            }
            Err(e) => {
                warn!(key = location.key(), attempt, error = %e, "Storage delete retry failed");
            }
        }
        delay = delay.saturating_mul(2);
    }
    error!(
        key = location.key(),
        attempts = retry.max_attempts,
        "Storage delete gave up, object orphaned"
    );
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::testing::{self, FlakyObjectStore};
    use tempfile::TempDir;

    fn remote(key: &str) -> StorageLocation {
        StorageLocation::Remote { key: key.into() }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_delete_is_retried_with_backoff() {
        let dir = TempDir::new().unwrap();
        let store = FlakyObjectStore::failing(2);
        let storage = testing::remote_storage(&dir, store.clone()).await;
        let reclaimer = StorageReclaimer::new(storage, DeleteRetryConfig::default());

        let handle = reclaimer.reclaim(remote("uploads/a")).await.unwrap();
        handle.await.unwrap();

        assert_eq!(store.deletes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_stop_after_max_attempts() {
        let dir = TempDir::new().unwrap();
        let store = FlakyObjectStore::failing(10);
        let storage = testing::remote_storage(&dir, store.clone()).await;
        let retry = DeleteRetryConfig {
            max_attempts: 3,
            base_delay_ms: 100,
        };
        let reclaimer = StorageReclaimer::new(storage, retry);

        let handle = reclaimer.reclaim(remote("uploads/b")).await.unwrap();
        handle.await.unwrap();

        assert_eq!(store.deletes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_local_file_needs_no_retry() {
        let dir = TempDir::new().unwrap();
        let storage = testing::local_storage(&dir).await;
        let reclaimer = StorageReclaimer::new(storage, DeleteRetryConfig::default());

        let handle = reclaimer
            .reclaim(StorageLocation::Local {
                path: "someone/never_written.txt".into(),
            })
            .await;
        assert!(handle.is_none());
    }
}
