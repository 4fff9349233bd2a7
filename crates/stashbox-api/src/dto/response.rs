//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stashbox_entity::file::File;
use stashbox_storage::AccessTarget;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outcome of a delete or revoke. `false` means there was nothing to remove.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

/// A granted public download.
#[derive(Debug, Clone, Serialize)]
pub struct ShareDownloadResponse {
    pub file: File,
    pub url: String,
    /// Set for presigned URLs only.
    pub url_expires_at: Option<DateTime<Utc>>,
    pub download_count: i32,
}

impl ShareDownloadResponse {
    pub fn new(file: File, access: &AccessTarget, download_count: i32) -> Self {
        let url_expires_at = match access {
            AccessTarget::SignedUrl { expires_at, .. } => Some(*expires_at),
            AccessTarget::LocalPath { .. } => None,
        };
        Self {
            file,
            url: access.url().to_string(),
            url_expires_at,
            download_count,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// `"s3"` when an object store is configured, otherwise `"local"`.
    pub storage: String,
}
