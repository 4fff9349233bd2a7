//! Remote object-store contract used by the storage fallback policy.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Metadata about a stored object, as returned by a listing.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ObjectSummary {
    /// Object key.
    pub key: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Last modified timestamp.
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
}

/// Coarse classification of object-store failures, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectStoreFailure {
    /// Credentials are missing or rejected.
    Credentials,
    /// The request reached the service and was refused.
    Request,
    /// Network, DNS, TLS, or timeout.
    Transport,
}

impl fmt::Display for ObjectStoreFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credentials => write!(f, "credentials"),
            Self::Request => write!(f, "request"),
            Self::Transport => write!(f, "transport"),
        }
    }
}

/// Trait for remote blob stores.
///
/// Every method returns `ErrorKind::StorageTransient` on failure; the
/// storage manager decides whether to fall back to local disk.
/// `delete` of a key that does not exist succeeds.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the backend name (e.g. "s3").
    fn backend_name(&self) -> &str;

    /// Upload `data` under `key`.
    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> AppResult<()>;

    /// Remove `key`.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Produce a time-bounded GET URL for `key`.
    async fn presign(&self, key: &str, ttl: Duration) -> AppResult<String>;

    /// Permanent (non-signed) URL for `key`, stored alongside the file row.
    fn object_url(&self, key: &str) -> String;

    /// Whether the configured bucket exists and is reachable.
    async fn bucket_exists(&self) -> AppResult<bool>;

    /// Create the configured bucket.
    async fn create_bucket(&self) -> AppResult<()>;

    /// List objects under `prefix`.
    async fn list(&self, prefix: &str) -> AppResult<Vec<ObjectSummary>>;
}
