//! Storage manager: remote-first writes with a local fallback.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use stashbox_core::config::StorageConfig;
use stashbox_core::error::{AppError, ErrorKind};
use stashbox_core::result::AppResult;
use stashbox_core::traits::{ObjectStore, ObjectSummary};
use stashbox_entity::file::StorageLocation;

use crate::keys;
use crate::providers::local::LocalStorageProvider;
use crate::providers::s3::S3ObjectStore;

/// Result of a successful store.
#[derive(Debug, Clone, Serialize)]
pub struct StoredObject {
    /// Where the bytes ended up.
    pub location: StorageLocation,
    /// Permanent URL recorded with the file row.
    pub url: String,
}

/// How a client can fetch stored bytes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessTarget {
    /// Time-limited presigned GET URL on the object store.
    SignedUrl {
        url: String,
        expires_at: DateTime<Utc>,
    },
    /// A file under the local root and the URL it is served at.
    LocalPath {
        #[serde(skip)]
        path: PathBuf,
        url: String,
    },
}

impl AccessTarget {
    /// The URL a client should follow.
    pub fn url(&self) -> &str {
        match self {
            Self::SignedUrl { url, .. } | Self::LocalPath { url, .. } => url,
        }
    }
}

/// Routes storage operations between the object store and local disk.
#[derive(Debug, Clone)]
pub struct StorageManager {
    remote: Option<Arc<dyn ObjectStore>>,
    local: LocalStorageProvider,
    key_prefix: String,
    presign_ttl: Duration,
}

impl StorageManager {
    /// Create a manager from explicit backends.
    pub fn new(
        remote: Option<Arc<dyn ObjectStore>>,
        local: LocalStorageProvider,
        key_prefix: impl Into<String>,
        presign_ttl: Duration,
    ) -> Self {
        Self {
            remote,
            local,
            key_prefix: key_prefix.into(),
            presign_ttl,
        }
    }

    /// Build the local provider and, when enabled, the S3 client.
    pub async fn from_config(config: &StorageConfig) -> AppResult<Self> {
        let local =
            LocalStorageProvider::new(&config.local.root_path, &config.local.public_url_prefix)
                .await?;
        let remote: Option<Arc<dyn ObjectStore>> = if config.s3.enabled {
            Some(Arc::new(S3ObjectStore::from_config(&config.s3).await?))
        } else {
            info!("S3 disabled, storing uploads on local disk only");
            None
        };
        Ok(Self::new(
            remote,
            local,
            config.s3.key_prefix.clone(),
            Duration::from_secs(config.s3.presign_ttl_seconds),
        ))
    }

    /// Whether an object store is configured.
    pub fn remote_enabled(&self) -> bool {
        self.remote.is_some()
    }

    /// The local fallback provider.
    pub fn local(&self) -> &LocalStorageProvider {
        &self.local
    }

    /// Store bytes, trying the object store first.
    ///
    /// Any remote failure is logged and absorbed; the bytes then go to local
    /// disk. Only a local failure surfaces, as `StorageFatal`.
    pub async fn store(
        &self,
        data: Bytes,
        logical_name: &str,
        owner_id: Uuid,
        content_type: Option<&str>,
    ) -> AppResult<StoredObject> {
        if let Some(ref remote) = self.remote {
            let key = keys::remote_key(&self.key_prefix, owner_id, logical_name);
            match remote.put(&key, data.clone(), content_type).await {
                Ok(()) => {
                    info!(%owner_id, key = %key, backend = remote.backend_name(), "Stored object remotely");
                    return Ok(StoredObject {
                        url: remote.object_url(&key),
                        location: StorageLocation::Remote { key },
                    });
                }
                Err(e) => {
                    warn!(
                        %owner_id,
                        key = %key,
                        error = %e,
                        "Remote store failed, falling back to local disk"
                    );
                }
            }
        }

        let path = keys::local_path(owner_id, logical_name);
        match self.local.write(&path, &data).await {
            Ok(_) => {
                info!(%owner_id, path = %path, "Stored object locally");
                Ok(StoredObject {
                    url: self.local.public_url(&path),
                    location: StorageLocation::Local { path },
                })
            }
            Err(e) => {
                error!(%owner_id, path = %path, error = %e, "Local store failed");
                Err(AppError::with_source(
                    ErrorKind::StorageFatal,
                    "No storage backend accepted the upload",
                    e,
                ))
            }
        }
    }

    /// Produce a way for a client to fetch the bytes at `location`.
    pub async fn retrieve_access(&self, location: &StorageLocation) -> AppResult<AccessTarget> {
        match location {
            StorageLocation::Remote { key } => {
                let remote = self.require_remote(key)?;
                let url = remote.presign(key, self.presign_ttl).await?;
                let ttl = chrono::Duration::from_std(self.presign_ttl)
                    .unwrap_or_else(|_| chrono::Duration::hours(1));
                Ok(AccessTarget::SignedUrl {
                    url,
                    expires_at: Utc::now() + ttl,
                })
            }
            StorageLocation::Local { path } => {
                let full_path = self.local.resolve(path)?;
                Ok(AccessTarget::LocalPath {
                    path: full_path,
                    url: self.local.public_url(path),
                })
            }
        }
    }

    /// Delete the bytes at `location`. Deleting something already gone
    /// succeeds for both backends.
    pub async fn delete(&self, location: &StorageLocation) -> AppResult<()> {
        match location {
            StorageLocation::Remote { key } => self.require_remote(key)?.delete(key).await,
            StorageLocation::Local { path } => {
                if !self.local.delete(path).await? {
                    info!(path = %path, "Local file already absent");
                }
                Ok(())
            }
        }
    }

    /// Make sure the configured bucket exists, creating it when allowed.
    pub async fn ensure_bucket(&self, create_if_missing: bool) -> AppResult<()> {
        let Some(ref remote) = self.remote else {
            return Ok(());
        };
        if remote.bucket_exists().await? {
            info!("Object store bucket is reachable");
            return Ok(());
        }
        if !create_if_missing {
            return Err(AppError::configuration(
                "Object store bucket does not exist and creation is disabled",
            ));
        }
        remote.create_bucket().await
    }

    /// List remote objects under `prefix`.
    pub async fn list_remote(&self, prefix: &str) -> AppResult<Vec<ObjectSummary>> {
        match self.remote {
            Some(ref remote) => remote.list(prefix).await,
            None => Ok(Vec::new()),
        }
    }

    fn require_remote(&self, key: &str) -> AppResult<&Arc<dyn ObjectStore>> {
        self.remote.as_ref().ok_or_else(|| {
            AppError::storage_fatal(format!(
                "Object '{key}' lives in the object store but none is configured"
            ))
        })
    }
}
