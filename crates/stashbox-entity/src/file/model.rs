//! File entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::FileKind;
use super::location::{StorageBackend, StorageLocation};

/// A file stored in Stashbox.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct File {
    /// Unique file identifier.
    pub id: Uuid,
    /// The file owner.
    pub owner_id: Uuid,
    /// The folder containing this file (None for the root level).
    pub folder_id: Option<Uuid>,
    /// Display name including extension.
    pub file_name: String,
    /// File size in bytes.
    pub size_bytes: i64,
    /// MIME type reported at upload.
    pub mime_type: Option<String>,
    /// Which backend holds the bytes.
    pub storage_backend: StorageBackend,
    /// Object key or local relative path, depending on `storage_backend`.
    #[serde(skip_serializing)]
    pub storage_key: String,
    /// URL recorded at upload time.
    pub storage_url: String,
    /// Informational visibility flag.
    pub is_public: bool,
    /// When the file was uploaded.
    pub created_at: DateTime<Utc>,
    /// When the file was last updated.
    pub updated_at: DateTime<Utc>,
}

impl File {
    /// The typed storage location.
    pub fn location(&self) -> StorageLocation {
        StorageLocation::from_parts(self.storage_backend, self.storage_key.clone())
    }

    /// Get the file extension (lowercase), if any.
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
            .map(|(_, ext)| ext.to_lowercase())
    }

    /// Preview category derived from the extension.
    pub fn kind(&self) -> FileKind {
        FileKind::from_file_name(&self.file_name)
    }
}

/// Data required to create a new file record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFile {
    /// The file owner.
    pub owner_id: Uuid,
    /// Target folder.
    pub folder_id: Option<Uuid>,
    /// Display name.
    pub file_name: String,
    /// File size in bytes.
    pub size_bytes: i64,
    /// MIME type.
    pub mime_type: Option<String>,
    /// Where the bytes were written.
    pub location: StorageLocation,
    /// URL returned by the storage layer.
    pub storage_url: String,
    /// Visibility flag.
    pub is_public: bool,
}
