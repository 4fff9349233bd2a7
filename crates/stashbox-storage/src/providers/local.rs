//! Local filesystem storage.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use stashbox_core::error::{AppError, ErrorKind};
use stashbox_core::result::AppResult;

/// Stores files under a root directory that is also served statically.
#[derive(Debug, Clone)]
pub struct LocalStorageProvider {
    /// Absolute root directory for all stored files.
    root: PathBuf,
    /// URL prefix the root is served under.
    public_url_prefix: String,
}

impl LocalStorageProvider {
    /// Create a provider rooted at `root_path`, creating the directory.
    pub async fn new(root_path: &str, public_url_prefix: &str) -> AppResult<Self> {
        fs::create_dir_all(root_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::StorageFatal,
                format!("Failed to create storage root: {root_path}"),
                e,
            )
        })?;
        let root = fs::canonicalize(root_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::StorageFatal,
                format!("Failed to resolve storage root: {root_path}"),
                e,
            )
        })?;
        Ok(Self {
            root,
            public_url_prefix: public_url_prefix.trim_end_matches('/').to_string(),
        })
    }

    /// The absolute storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative path inside the root, rejecting escapes.
    pub fn resolve(&self, relative: &str) -> AppResult<PathBuf> {
        let relative = Path::new(relative);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || relative.as_os_str().is_empty() {
            return Err(AppError::storage_fatal(format!(
                "Refusing storage path outside the root: {}",
                relative.display()
            )));
        }
        Ok(self.root.join(relative))
    }

    /// URL under which `relative` is served.
    pub fn public_url(&self, relative: &str) -> String {
        format!("{}/{}", self.public_url_prefix, relative.trim_start_matches('/'))
    }

    /// Write `data` to `relative`, creating parent directories.
    pub async fn write(&self, relative: &str, data: &Bytes) -> AppResult<PathBuf> {
        let full_path = self.resolve(relative)?;
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::StorageFatal,
                    format!("Failed to create directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        fs::write(&full_path, data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::StorageFatal,
                format!("Failed to write file: {relative}"),
                e,
            )
        })?;
        debug!(path = relative, bytes = data.len(), "Wrote local file");
        Ok(full_path)
    }

    /// Read a stored file.
    pub async fn read_bytes(&self, relative: &str) -> AppResult<Bytes> {
        let full_path = self.resolve(relative)?;
        match fs::read(&full_path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::not_found(format!("Stored file not found: {relative}")))
            }
            Err(e) => Err(AppError::with_source(
                ErrorKind::StorageFatal,
                format!("Failed to read file: {relative}"),
                e,
            )),
        }
    }

    /// Remove a stored file. Returns `false` if it was already gone.
    pub async fn delete(&self, relative: &str) -> AppResult<bool> {
        let full_path = self.resolve(relative)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::with_source(
                ErrorKind::StorageFatal,
                format!("Failed to delete file: {relative}"),
                e,
            )),
        }
    }

    /// Whether a stored file exists.
    pub async fn exists(&self, relative: &str) -> bool {
        match self.resolve(relative) {
            Ok(path) => fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }
}
