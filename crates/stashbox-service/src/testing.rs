//! Shared fixtures for the service unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tempfile::TempDir;
use uuid::Uuid;

use stashbox_core::error::AppError;
use stashbox_core::result::AppResult;
use stashbox_core::traits::{ObjectStore, ObjectSummary};
use stashbox_database::Stores;
use stashbox_entity::file::{CreateFile, File, StorageLocation};
use stashbox_entity::share::ShareLink;
use stashbox_storage::{LocalStorageProvider, StorageManager};

pub(crate) async fn local_storage(dir: &TempDir) -> Arc<StorageManager> {
    let local = LocalStorageProvider::new(&dir.path().to_string_lossy(), "/static/uploads")
        .await
        .unwrap();
    Arc::new(StorageManager::new(
        None,
        local,
        "uploads",
        Duration::from_secs(3600),
    ))
}

pub(crate) async fn remote_storage(
    dir: &TempDir,
    remote: Arc<FlakyObjectStore>,
) -> Arc<StorageManager> {
    let local = LocalStorageProvider::new(&dir.path().to_string_lossy(), "/static/uploads")
        .await
        .unwrap();
    Arc::new(StorageManager::new(
        Some(remote as Arc<dyn ObjectStore>),
        local,
        "uploads",
        Duration::from_secs(3600),
    ))
}

/// A catalog row pointing at a local path that was never written.
pub(crate) async fn seed_file(stores: &Stores, owner_id: Uuid, name: &str) -> File {
    stores
        .files
        .create(&CreateFile {
            owner_id,
            folder_id: None,
            file_name: name.to_string(),
            size_bytes: 1536,
            mime_type: None,
            location: StorageLocation::Local {
                path: format!("{owner_id}/{}_{name}", Uuid::new_v4().simple()),
            },
            storage_url: format!("/static/uploads/{name}"),
            is_public: false,
        })
        .await
        .unwrap()
}

/// An active, unlimited link that expires in an hour.
pub(crate) fn share_link(file_id: Uuid, token: &str) -> ShareLink {
    ShareLink {
        id: Uuid::new_v4(),
        file_id,
        token: token.to_string(),
        expires_at: Utc::now() + chrono::Duration::hours(1),
        password_hash: None,
        max_downloads: None,
        download_count: 0,
        is_active: true,
        created_at: Utc::now(),
    }
}

/// Object store double whose first `failures` calls to `put`/`delete` fail.
#[derive(Debug, Default)]
pub(crate) struct FlakyObjectStore {
    failures: AtomicU32,
    pub puts: AtomicU32,
    pub deletes: AtomicU32,
}

impl FlakyObjectStore {
    pub(crate) fn failing(failures: u32) -> Arc<Self> {
        Arc::new(Self {
            failures: AtomicU32::new(failures),
            ..Self::default()
        })
    }

    fn trip(&self) -> AppResult<()> {
        let left = self.failures.load(Ordering::SeqCst);
        if left > 0 {
            self.failures.store(left - 1, Ordering::SeqCst);
            return Err(AppError::storage_transient("connection reset"));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for FlakyObjectStore {
    fn backend_name(&self) -> &str {
        "flaky"
    }

    async fn put(&self, _key: &str, _data: Bytes, _content_type: Option<&str>) -> AppResult<()> {
        self.trip()?;
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, _key: &str) -> AppResult<()> {
        self.trip()?;
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn presign(&self, key: &str, _ttl: Duration) -> AppResult<String> {
        Ok(format!("https://objects.test/{key}?sig=1"))
    }

    fn object_url(&self, key: &str) -> String {
        format!("https://objects.test/{key}")
    }

    async fn bucket_exists(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn create_bucket(&self) -> AppResult<()> {
        Ok(())
    }

    async fn list(&self, _prefix: &str) -> AppResult<Vec<ObjectSummary>> {
        Ok(Vec::new())
    }
}
