//! Public access to share links.
//!
//! A link is checked in a fixed order: existence, expiry, active flag,
//! password, download limit. The first failing check decides the error.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use stashbox_auth::PasswordHasher;
use stashbox_core::error::{AppError, ErrorKind};
use stashbox_core::result::AppResult;
use stashbox_database::store::{FileStore, ShareStore, Stores};
use stashbox_entity::analytics::FileActionType;
use stashbox_entity::file::{File, format_file_size};
use stashbox_entity::share::{ShareLink, SharedFile};
use stashbox_storage::{AccessTarget, StorageManager};

use crate::analytics::AnalyticsRecorder;
use crate::context::ClientInfo;

/// What a recipient sees before downloading.
#[derive(Debug, Clone, Serialize)]
pub struct SharePreview {
    pub file_name: String,
    pub size_bytes: i64,
    pub formatted_size: String,
    pub mime_type: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub password_required: bool,
    pub downloads_remaining: Option<i32>,
}

/// A granted download: the file and where to fetch its bytes.
#[derive(Debug, Clone, Serialize)]
pub struct ShareDownload {
    pub file: File,
    pub access: AccessTarget,
    /// The link's count after this download.
    pub download_count: i32,
}

/// Resolves and consumes share links on behalf of anonymous recipients.
#[derive(Clone)]
pub struct AccessService {
    shares: Arc<dyn ShareStore>,
    files: Arc<dyn FileStore>,
    storage: Arc<StorageManager>,
    hasher: Arc<PasswordHasher>,
    recorder: AnalyticsRecorder,
}

impl std::fmt::Debug for AccessService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessService").finish()
    }
}

/// The first lifecycle check `link` fails at `now`, ignoring the password.
fn lifecycle_denial(link: &ShareLink, now: DateTime<Utc>) -> Option<AppError> {
    if link.is_expired_at(now) {
        Some(AppError::new(ErrorKind::Expired, "This share link has expired"))
    } else if !link.is_active {
        Some(AppError::new(
            ErrorKind::Revoked,
            "This share link has been revoked",
        ))
    } else {
        None
    }
}

fn limit_denial(link: &ShareLink) -> Option<AppError> {
    link.limit_reached().then(|| {
        AppError::new(
            ErrorKind::DownloadLimitReached,
            "This share link has reached its download limit",
        )
    })
}

impl AccessService {
    /// Creates a new access service.
    pub fn new(
        stores: &Stores,
        storage: Arc<StorageManager>,
        hasher: Arc<PasswordHasher>,
        recorder: AnalyticsRecorder,
    ) -> Self {
        Self {
            shares: stores.shares.clone(),
            files: stores.files.clone(),
            storage,
            hasher,
            recorder,
        }
    }

    async fn find_link(&self, token: &str) -> AppResult<ShareLink> {
        self.shares
            .find_by_token(token)
            .await?
            .ok_or_else(|| AppError::not_found("Share link not found"))
    }

    async fn backing_file(&self, link: &ShareLink) -> AppResult<File> {
        self.files
            .find_by_id(link.file_id)
            .await?
            .ok_or_else(|| AppError::not_found("Shared file no longer exists"))
    }

    fn check_password(&self, link: &ShareLink, password: Option<&str>) -> AppResult<()> {
        let Some(ref hash) = link.password_hash else {
            return Ok(());
        };
        match password.filter(|p| !p.trim().is_empty()) {
            None => Err(AppError::new(
                ErrorKind::PasswordRequired,
                "This share link requires a password",
            )),
            Some(password) if self.hasher.verify_password(password, hash)? => Ok(()),
            Some(_) => {
                warn!(share_id = %link.id, "Wrong share password");
                Err(AppError::new(ErrorKind::WrongPassword, "Incorrect password"))
            }
        }
    }

    /// Public metadata for a link, without checking the password.
    pub async fn inspect(&self, token: &str) -> AppResult<SharePreview> {
        let link = self.find_link(token).await?;
        if let Some(err) = lifecycle_denial(&link, Utc::now()).or_else(|| limit_denial(&link)) {
            return Err(err);
        }
        let file = self.backing_file(&link).await?;

        Ok(SharePreview {
            formatted_size: format_file_size(file.size_bytes.max(0) as u64),
            file_name: file.file_name,
            size_bytes: file.size_bytes,
            mime_type: file.mime_type,
            expires_at: link.expires_at,
            password_required: link.is_password_protected(),
            downloads_remaining: link.downloads_remaining(),
        })
    }

    /// Checks a link and returns it with its file. Has no side effects.
    pub async fn resolve(&self, token: &str, password: Option<&str>) -> AppResult<SharedFile> {
        let link = self.find_link(token).await?;
        if let Some(err) = lifecycle_denial(&link, Utc::now()) {
            return Err(err);
        }
        self.check_password(&link, password)?;
        if let Some(err) = limit_denial(&link) {
            return Err(err);
        }
        let file = self.backing_file(&link).await?;
        Ok(SharedFile { link, file })
    }

    /// Atomically counts one download and returns the new count.
    ///
    /// When the conditional update matches nothing, the link is re-read to
    /// report why.
    pub async fn consume(&self, token: &str) -> AppResult<i32> {
        if let Some(count) = self.shares.try_consume(token).await? {
            return Ok(count);
        }

        let link = self.find_link(token).await?;
        let err = lifecycle_denial(&link, Utc::now())
            .or_else(|| limit_denial(&link))
            // Only clock skew between the database and this process lands here.
            .unwrap_or_else(|| AppError::new(ErrorKind::Expired, "This share link has expired"));
        Err(err)
    }

    /// Resolves, consumes and returns access to the shared bytes.
    pub async fn download(
        &self,
        token: &str,
        password: Option<&str>,
        client: &ClientInfo,
    ) -> AppResult<ShareDownload> {
        let SharedFile { link, file } = self.resolve(token, password).await?;
        // A download is only counted once its URL exists.
        let access = self.storage.retrieve_access(&file.location()).await?;
        let download_count = self.consume(token).await?;

        self.recorder.record_share_access(link.id, client);
        self.recorder.record_file_action(
            file.id,
            FileActionType::Download,
            None,
            client.ip_address.clone(),
        );

        info!(
            share_id = %link.id,
            file_id = %file.id,
            download_count,
            "Shared file downloaded"
        );

        Ok(ShareDownload {
            file,
            access,
            download_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use chrono::Duration;
    use stashbox_database::MemoryStore;
    use stashbox_entity::file::{CreateFile, StorageLocation};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        memory: MemoryStore,
        access: AccessService,
        file: File,
    }

    async fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let memory = MemoryStore::new();
        let stores = Stores::from_memory(memory.clone());
        let storage = testing::local_storage(&dir).await;
        let file = testing::seed_file(&stores, uuid::Uuid::new_v4(), "slides.pdf").await;
        let access = AccessService::new(
            &stores,
            storage,
            Arc::new(PasswordHasher::new()),
            AnalyticsRecorder::new(&stores),
        );
        Fixture {
            _dir: dir,
            memory,
            access,
            file,
        }
    }

    #[tokio::test]
    async fn test_resolve_returns_backing_file() {
        let fx = fixture().await;
        let link = testing::share_link(fx.file.id, "open");
        fx.memory.put_share_link(link.clone());

        let shared = fx.access.resolve("open", None).await.unwrap();
        assert_eq!(shared.file.id, fx.file.id);
        assert_eq!(shared.link.id, link.id);
        assert_eq!(shared.link.download_count, 0);
    }

    #[tokio::test]
    async fn test_unknown_token_is_not_found() {
        let fx = fixture().await;
        let err = fx.access.resolve("missing", None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_expiry_wins_over_every_other_state() {
        let fx = fixture().await;
        let mut link = testing::share_link(fx.file.id, "stale");
        link.expires_at = Utc::now() - Duration::seconds(1);
        link.is_active = false;
        link.max_downloads = Some(1);
        link.download_count = 1;
        fx.memory.put_share_link(link);

        let err = fx.access.resolve("stale", Some("whatever")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Expired);
    }

    #[tokio::test]
    async fn test_revoked_link_before_expiry() {
        let fx = fixture().await;
        let mut link = testing::share_link(fx.file.id, "gone");
        link.is_active = false;
        fx.memory.put_share_link(link);

        let err = fx.access.resolve("gone", None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Revoked);
    }

    #[tokio::test]
    async fn test_password_checks_precede_limit() {
        let fx = fixture().await;
        let mut link = testing::share_link(fx.file.id, "locked");
        link.password_hash = Some(PasswordHasher::new().hash_password("open-sesame").unwrap());
        link.max_downloads = Some(1);
        link.download_count = 1;
        fx.memory.put_share_link(link);

        let err = fx.access.resolve("locked", None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::PasswordRequired);
        let err = fx.access.resolve("locked", Some("")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::PasswordRequired);
        let err = fx.access.resolve("locked", Some("nope")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::WrongPassword);
        let err = fx.access.resolve("locked", Some("open-sesame")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::DownloadLimitReached);
    }

    #[tokio::test]
    async fn test_consume_stops_at_limit_under_concurrency() {
        let fx = fixture().await;
        let mut link = testing::share_link(fx.file.id, "limited");
        link.max_downloads = Some(3);
        fx.memory.put_share_link(link);

        let attempts = (0..10).map(|_| {
            let access = fx.access.clone();
            tokio::spawn(async move { access.consume("limited").await })
        });
        let results = futures::future::join_all(attempts).await;

        let granted = results.iter().filter(|r| matches!(r, Ok(Ok(_)))).count();
        let refused = results
            .iter()
            .filter(|r| matches!(r, Ok(Err(e)) if e.is(ErrorKind::DownloadLimitReached)))
            .count();
        assert_eq!(granted, 3);
        assert_eq!(refused, 7);

        let err = fx.access.resolve("limited", None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::DownloadLimitReached);
    }

    #[tokio::test]
    async fn test_consume_reports_revocation() {
        let fx = fixture().await;
        let mut link = testing::share_link(fx.file.id, "revoked");
        link.is_active = false;
        fx.memory.put_share_link(link);

        let err = fx.access.consume("revoked").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Revoked);
    }

    #[tokio::test]
    async fn test_download_counts_and_records_access() {
        let fx = fixture().await;
        let link = testing::share_link(fx.file.id, "dl");
        fx.memory.put_share_link(link.clone());
        let client = ClientInfo {
            ip_address: Some("192.0.2.7".into()),
            user_agent: Some("curl/8".into()),
        };

        let download = fx.access.download("dl", None, &client).await.unwrap();
        assert_eq!(download.download_count, 1);
        assert_eq!(download.file.id, fx.file.id);
        assert!(matches!(download.access, AccessTarget::LocalPath { .. }));

        for _ in 0..20 {
            if fx.memory.share_access_count(link.id) == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(fx.memory.share_access_count(link.id), 1);
    }

    #[tokio::test]
    async fn test_failed_access_does_not_spend_a_download() {
        let fx = fixture().await;
        let stores = Stores::from_memory(fx.memory.clone());
        let remote_file = stores
            .files
            .create(&CreateFile {
                owner_id: fx.file.owner_id,
                folder_id: None,
                file_name: "offsite.pdf".to_string(),
                size_bytes: 10,
                mime_type: None,
                location: StorageLocation::Remote {
                    key: "uploads/someone/offsite.pdf".to_string(),
                },
                storage_url: "https://objects.test/offsite.pdf".to_string(),
                is_public: false,
            })
            .await
            .unwrap();
        let mut link = testing::share_link(remote_file.id, "once");
        link.max_downloads = Some(1);
        fx.memory.put_share_link(link);

        let err = fx
            .access
            .download("once", None, &ClientInfo::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::StorageFatal);

        let shared = fx.access.resolve("once", None).await.unwrap();
        assert_eq!(shared.link.download_count, 0);
    }

    #[tokio::test]
    async fn test_password_with_surrounding_spaces_verifies() {
        let fx = fixture().await;
        let mut link = testing::share_link(fx.file.id, "spaced");
        link.password_hash = Some(PasswordHasher::new().hash_password("secret pass ").unwrap());
        fx.memory.put_share_link(link);

        let err = fx.access.resolve("spaced", Some("   ")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::PasswordRequired);
        let err = fx.access.resolve("spaced", Some("secret pass")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::WrongPassword);
        fx.access.resolve("spaced", Some("secret pass ")).await.unwrap();
    }

    #[tokio::test]
    async fn test_inspect_skips_password() {
        let fx = fixture().await;
        let mut link = testing::share_link(fx.file.id, "peek");
        link.password_hash = Some(PasswordHasher::new().hash_password("pw123456").unwrap());
        link.max_downloads = Some(5);
        link.download_count = 2;
        fx.memory.put_share_link(link);

        let preview = fx.access.inspect("peek").await.unwrap();
        assert!(preview.password_required);
        assert_eq!(preview.downloads_remaining, Some(3));
        assert_eq!(preview.file_name, "slides.pdf");
    }
}
