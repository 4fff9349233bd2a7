//! Storage backend configuration.

use serde::{Deserialize, Serialize};

/// Top-level storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Maximum upload size in bytes (default 16 MiB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
    /// Lowercase file extensions accepted for upload.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    /// Per-user quota shown on the usage page. Display only, never enforced.
    #[serde(default = "default_display_quota")]
    pub display_quota_bytes: u64,
    /// Local filesystem fallback configuration.
    #[serde(default)]
    pub local: LocalStorageConfig,
    /// S3-compatible object storage configuration.
    #[serde(default)]
    pub s3: S3StorageConfig,
    /// Retry policy for storage deletes that fail after the metadata row is gone.
    #[serde(default)]
    pub delete_retry: DeleteRetryConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_upload_size_bytes: default_max_upload(),
            allowed_extensions: default_allowed_extensions(),
            display_quota_bytes: default_display_quota(),
            local: LocalStorageConfig::default(),
            s3: S3StorageConfig::default(),
            delete_retry: DeleteRetryConfig::default(),
        }
    }
}

impl StorageConfig {
    /// Check an extension (without the dot) against the allow-list.
    pub fn is_extension_allowed(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        self.allowed_extensions.iter().any(|allowed| *allowed == ext)
    }
}

/// Local filesystem fallback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    /// Directory the process writes fallback uploads into.
    #[serde(default = "default_local_root")]
    pub root_path: String,
    /// URL prefix under which `root_path` is served statically.
    #[serde(default = "default_public_url_prefix")]
    pub public_url_prefix: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_local_root(),
            public_url_prefix: default_public_url_prefix(),
        }
    }
}

/// S3-compatible object storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3StorageConfig {
    /// Whether the remote object store is used at all.
    #[serde(default)]
    pub enabled: bool,
    /// Endpoint URL for non-AWS services (MinIO, R2). Empty uses AWS.
    #[serde(default)]
    pub endpoint: String,
    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Bucket name.
    #[serde(default)]
    pub bucket: String,
    /// Access key ID. Empty falls back to the default AWS credential chain.
    #[serde(default)]
    pub access_key: String,
    /// Secret access key.
    #[serde(default)]
    pub secret_key: String,
    /// Use path-style addressing (required by most S3-compatible servers).
    #[serde(default)]
    pub force_path_style: bool,
    /// Key prefix for uploaded objects.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Validity of presigned download URLs, in seconds.
    #[serde(default = "default_presign_ttl")]
    pub presign_ttl_seconds: u64,
    /// Upper bound on any single object-store call, in seconds.
    #[serde(default = "default_s3_timeout")]
    pub timeout_seconds: u64,
    /// Create the bucket at startup when `head_bucket` reports it missing.
    #[serde(default = "default_true")]
    pub create_bucket_if_missing: bool,
}

impl Default for S3StorageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::new(),
            region: default_region(),
            bucket: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            force_path_style: false,
            key_prefix: default_key_prefix(),
            presign_ttl_seconds: default_presign_ttl(),
            timeout_seconds: default_s3_timeout(),
            create_bucket_if_missing: true,
        }
    }
}

/// Exponential backoff for asynchronous storage deletes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRetryConfig {
    /// Total attempts including the first synchronous one.
    #[serde(default = "default_retry_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry, doubled after each failure.
    #[serde(default = "default_retry_delay")]
    pub base_delay_ms: u64,
}

impl Default for DeleteRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_attempts(),
            base_delay_ms: default_retry_delay(),
        }
    }
}

fn default_max_upload() -> u64 {
    16 * 1024 * 1024
}

fn default_allowed_extensions() -> Vec<String> {
    [
        "txt", "pdf", "png", "jpg", "jpeg", "gif", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
        "zip", "rar",
    ]
    .iter()
    .map(|e| e.to_string())
    .collect()
}

fn default_display_quota() -> u64 {
    1024 * 1024 * 1024
}

fn default_local_root() -> String {
    "./data/uploads".to_string()
}

fn default_public_url_prefix() -> String {
    "/static/uploads".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_key_prefix() -> String {
    "uploads".to_string()
}

fn default_presign_ttl() -> u64 {
    3600
}

fn default_s3_timeout() -> u64 {
    15
}

fn default_true() -> bool {
    true
}

fn default_retry_attempts() -> u32 {
    5
}

fn default_retry_delay() -> u64 {
    500
}
