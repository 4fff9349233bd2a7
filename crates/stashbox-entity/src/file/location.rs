//! Where a file's bytes physically live.

use serde::{Deserialize, Serialize};

/// Persisted discriminator for [`StorageLocation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "storage_backend", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// S3-compatible object store.
    Remote,
    /// Local filesystem fallback.
    Local,
}

impl StorageBackend {
    /// Get the backend as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Local => "local",
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The physical location of a stored file.
///
/// Persisted as the `(storage_backend, storage_key)` column pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageLocation {
    /// An object key in the remote bucket.
    Remote {
        /// Object key.
        key: String,
    },
    /// A path relative to the local storage root.
    Local {
        /// Relative path.
        path: String,
    },
}

impl StorageLocation {
    /// Rebuild a location from its persisted columns.
    pub fn from_parts(backend: StorageBackend, key: impl Into<String>) -> Self {
        match backend {
            StorageBackend::Remote => Self::Remote { key: key.into() },
            StorageBackend::Local => Self::Local { path: key.into() },
        }
    }

    /// The backend discriminator.
    pub fn backend(&self) -> StorageBackend {
        match self {
            Self::Remote { .. } => StorageBackend::Remote,
            Self::Local { .. } => StorageBackend::Local,
        }
    }

    /// The object key or relative path.
    pub fn key(&self) -> &str {
        match self {
            Self::Remote { key } => key,
            Self::Local { path } => path,
        }
    }

    /// Whether the bytes live in the remote object store.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_matches_backend() {
        let loc = StorageLocation::from_parts(StorageBackend::Local, "u/abc_report.pdf");
        assert_eq!(loc.backend(), StorageBackend::Local);
        assert_eq!(loc.key(), "u/abc_report.pdf");
        assert!(!loc.is_remote());
    }

    #[test]
    fn test_serializes_tagged() {
        let loc = StorageLocation::Remote {
            key: "uploads/a/b.pdf".to_string(),
        };
        let json = serde_json::to_value(&loc).unwrap();
        assert_eq!(json["backend"], "remote");
        assert_eq!(json["key"], "uploads/a/b.pdf");
    }
}
