//! Share issuance, listing, revocation and the expiry sweep.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use stashbox_auth::{OwnershipGuard, PasswordHasher};
use stashbox_core::config::ShareConfig;
use stashbox_core::error::{AppError, ErrorKind};
use stashbox_core::result::AppResult;
use stashbox_database::store::{ShareStore, Stores};
use stashbox_entity::analytics::{FileActionType, UserActionType};
use stashbox_entity::share::{CreateShareLink, ShareLink};

use super::link::LinkService;
use crate::analytics::AnalyticsRecorder;
use crate::context::RequestContext;

/// Request to share a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueShareRequest {
    /// The file to share.
    pub file_id: Uuid,
    /// Link lifetime. Defaults to `share.default_expiry_hours`.
    pub expiry_hours: Option<i64>,
    /// Optional access password. Blank counts as none.
    pub password: Option<String>,
    /// Download ceiling (None = unlimited).
    pub max_downloads: Option<i32>,
}

/// A share link together with the URL to hand out.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedShare {
    #[serde(flatten)]
    pub link: ShareLink,
    pub url: String,
}

/// Manages share creation, listing, and revocation.
#[derive(Clone)]
pub struct ShareService {
    shares: Arc<dyn ShareStore>,
    guard: OwnershipGuard,
    links: LinkService,
    hasher: Arc<PasswordHasher>,
    recorder: AnalyticsRecorder,
    config: ShareConfig,
}

impl std::fmt::Debug for ShareService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareService")
            .field("links", &self.links)
            .finish()
    }
}

impl ShareService {
    /// Creates a new share service.
    pub fn new(
        stores: &Stores,
        guard: OwnershipGuard,
        hasher: Arc<PasswordHasher>,
        recorder: AnalyticsRecorder,
        config: ShareConfig,
    ) -> Self {
        Self {
            shares: stores.shares.clone(),
            guard,
            links: LinkService::new(config.token_length, config.public_base_url.clone()),
            hasher,
            recorder,
            config,
        }
    }

    /// Issues a share link for a file the caller owns.
    pub async fn issue(
        &self,
        ctx: &RequestContext,
        req: IssueShareRequest,
    ) -> AppResult<IssuedShare> {
        let file = self.guard.owned_file(req.file_id, ctx.user_id).await?;

        let expiry_hours = req.expiry_hours.unwrap_or(self.config.default_expiry_hours);
        if !(1..=self.config.max_expiry_hours).contains(&expiry_hours) {
            return Err(AppError::validation(format!(
                "expiry_hours must be between 1 and {}",
                self.config.max_expiry_hours
            )));
        }
        if req.max_downloads.is_some_and(|max| max < 1) {
            return Err(AppError::validation("max_downloads must be at least 1"));
        }

        // Hashed exactly as typed; an all-blank password means no password.
        let password_hash = match req.password.as_deref() {
            Some(password) if !password.trim().is_empty() => {
                Some(self.hasher.hash_password(password)?)
            }
            _ => None,
        };
        let expires_at = Utc::now() + Duration::hours(expiry_hours);

        let mut attempt = 0;
        let link = loop {
            attempt += 1;
            let data = CreateShareLink {
                file_id: file.id,
                token: self.links.generate_token(),
                expires_at,
                password_hash: password_hash.clone(),
                max_downloads: req.max_downloads,
            };
            match self.shares.create(&data).await {
                Ok(link) => break link,
                Err(e) if e.is(ErrorKind::Conflict) && attempt < self.config.max_token_attempts => {
                    warn!(file_id = %file.id, attempt, "Share token collision, retrying");
                }
                Err(e) if e.is(ErrorKind::Conflict) => {
                    return Err(AppError::internal(format!(
                        "Could not generate a unique share token after {attempt} attempts"
                    )));
                }
                Err(e) => return Err(e),
            }
        };

        self.recorder.record_user_action(
            ctx.user_id,
            UserActionType::Share,
            Some(json!({ "file_id": file.id, "file_name": file.file_name })),
        );
        self.recorder
            .record_file_action(file.id, FileActionType::Share, Some(ctx.user_id), ctx.ip_address.clone());

        info!(
            user_id = %ctx.user_id,
            file_id = %file.id,
            share_id = %link.id,
            expires_at = %link.expires_at,
            protected = link.is_password_protected(),
            "Share created"
        );

        Ok(self.present(link))
    }

    /// Deactivates a link. Returns `false` if it was already inactive.
    pub async fn revoke(&self, ctx: &RequestContext, token: &str) -> AppResult<bool> {
        let (link, file) = self.guard.owned_share_by_token(token, ctx.user_id).await?;
        let changed = self.shares.deactivate(link.id).await?;

        if changed {
            self.recorder.record_user_action(
                ctx.user_id,
                UserActionType::Revoke,
                Some(json!({ "file_id": file.id, "share_id": link.id })),
            );
            info!(user_id = %ctx.user_id, share_id = %link.id, "Share revoked");
        }
        Ok(changed)
    }

    /// Links for one owned file, newest first.
    pub async fn list_for_file(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
    ) -> AppResult<Vec<IssuedShare>> {
        let file = self.guard.owned_file(file_id, ctx.user_id).await?;
        let links = self.shares.list_for_file(file.id).await?;
        Ok(links.into_iter().map(|l| self.present(l)).collect())
    }

    /// Every link on the caller's files, newest first.
    pub async fn list_for_owner(&self, ctx: &RequestContext) -> AppResult<Vec<IssuedShare>> {
        let links = self.shares.list_for_owner(ctx.user_id).await?;
        Ok(links.into_iter().map(|l| self.present(l)).collect())
    }

    /// Deletes every expired link. Safe to run alongside reads.
    pub async fn sweep_expired(&self) -> AppResult<u64> {
        let removed = self.shares.delete_expired().await?;
        if removed > 0 {
            info!(removed, "Swept expired share links");
        }
        Ok(removed)
    }

    fn present(&self, link: ShareLink) -> IssuedShare {
        IssuedShare {
            url: self.links.share_url(&link.token),
            link,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use stashbox_database::MemoryStore;

    fn service(stores: &Stores, config: ShareConfig) -> ShareService {
        ShareService::new(
            stores,
            OwnershipGuard::new(stores),
            Arc::new(PasswordHasher::new()),
            AnalyticsRecorder::new(stores),
            config,
        )
    }

    fn request(file_id: Uuid) -> IssueShareRequest {
        IssueShareRequest {
            file_id,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_issue_uses_default_expiry() {
        let stores = Stores::in_memory();
        let owner = Uuid::new_v4();
        let file = testing::seed_file(&stores, owner, "notes.txt").await;
        let shares = service(&stores, ShareConfig::default());

        let before = Utc::now();
        let issued = shares
            .issue(&RequestContext::for_user(owner), request(file.id))
            .await
            .unwrap();

        assert_eq!(issued.link.token.len(), 32);
        assert!(issued.link.is_active);
        assert_eq!(issued.link.download_count, 0);
        assert_eq!(
            issued.url,
            format!("http://localhost:8080/api/s/{}", issued.link.token)
        );
        let lifetime = issued.link.expires_at - before;
        assert!(lifetime > Duration::hours(23) && lifetime <= Duration::hours(24));
    }

    #[tokio::test]
    async fn test_issue_hashes_password() {
        let stores = Stores::in_memory();
        let owner = Uuid::new_v4();
        let file = testing::seed_file(&stores, owner, "notes.txt").await;
        let shares = service(&stores, ShareConfig::default());

        let issued = shares
            .issue(
                &RequestContext::for_user(owner),
                IssueShareRequest {
                    password: Some("hunter22".into()),
                    ..request(file.id)
                },
            )
            .await
            .unwrap();

        let hash = issued.link.password_hash.unwrap();
        assert_ne!(hash, "hunter22");
        assert!(PasswordHasher::new().verify_password("hunter22", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_issue_keeps_password_whitespace() {
        let stores = Stores::in_memory();
        let owner = Uuid::new_v4();
        let file = testing::seed_file(&stores, owner, "notes.txt").await;
        let shares = service(&stores, ShareConfig::default());
        let ctx = RequestContext::for_user(owner);

        let spaced = shares
            .issue(
                &ctx,
                IssueShareRequest {
                    password: Some("secret pass ".into()),
                    ..request(file.id)
                },
            )
            .await
            .unwrap();
        let hash = spaced.link.password_hash.unwrap();
        let hasher = PasswordHasher::new();
        assert!(hasher.verify_password("secret pass ", &hash).unwrap());
        assert!(!hasher.verify_password("secret pass", &hash).unwrap());

        let blank = shares
            .issue(
                &ctx,
                IssueShareRequest {
                    password: Some("   ".into()),
                    ..request(file.id)
                },
            )
            .await
            .unwrap();
        assert!(blank.link.password_hash.is_none());
    }

    #[tokio::test]
    async fn test_issue_validates_limits() {
        let stores = Stores::in_memory();
        let owner = Uuid::new_v4();
        let file = testing::seed_file(&stores, owner, "notes.txt").await;
        let shares = service(&stores, ShareConfig::default());
        let ctx = RequestContext::for_user(owner);

        let err = shares
            .issue(&ctx, IssueShareRequest { expiry_hours: Some(0), ..request(file.id) })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err = shares
            .issue(&ctx, IssueShareRequest { max_downloads: Some(0), ..request(file.id) })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_issue_for_foreign_file_is_denied() {
        let stores = Stores::in_memory();
        let file = testing::seed_file(&stores, Uuid::new_v4(), "notes.txt").await;
        let shares = service(&stores, ShareConfig::default());

        let err = shares
            .issue(&RequestContext::for_user(Uuid::new_v4()), request(file.id))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn test_token_collisions_exhaust_attempts() {
        let stores = Stores::in_memory();
        let owner = Uuid::new_v4();
        let file = testing::seed_file(&stores, owner, "notes.txt").await;
        // One-character tokens have 62 possible values; take them all.
        let config = ShareConfig {
            token_length: 1,
            max_token_attempts: 3,
            ..ShareConfig::default()
        };
        let shares = service(&stores, config);
        let ctx = RequestContext::for_user(owner);
        for c in ('a'..='z').chain('A'..='Z').chain('0'..='9') {
            stores
                .shares
                .create(&CreateShareLink {
                    file_id: file.id,
                    token: c.to_string(),
                    expires_at: Utc::now() + Duration::hours(1),
                    password_hash: None,
                    max_downloads: None,
                })
                .await
                .unwrap();
        }

        let err = shares.issue(&ctx, request(file.id)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let stores = Stores::in_memory();
        let owner = Uuid::new_v4();
        let file = testing::seed_file(&stores, owner, "notes.txt").await;
        let shares = service(&stores, ShareConfig::default());
        let ctx = RequestContext::for_user(owner);
        let issued = shares.issue(&ctx, request(file.id)).await.unwrap();

        assert!(shares.revoke(&ctx, &issued.link.token).await.unwrap());
        assert!(!shares.revoke(&ctx, &issued.link.token).await.unwrap());

        let stranger = RequestContext::for_user(Uuid::new_v4());
        let err = shares.revoke(&stranger, &issued.link.token).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn test_listing_and_sweep() {
        let memory = MemoryStore::new();
        let stores = Stores::from_memory(memory.clone());
        let owner = Uuid::new_v4();
        let file = testing::seed_file(&stores, owner, "notes.txt").await;
        let shares = service(&stores, ShareConfig::default());
        let ctx = RequestContext::for_user(owner);
        let live = shares.issue(&ctx, request(file.id)).await.unwrap();

        let mut stale = live.link.clone();
        stale.id = Uuid::new_v4();
        stale.token = "x".repeat(32);
        stale.expires_at = Utc::now() - Duration::minutes(1);
        memory.put_share_link(stale);

        assert_eq!(shares.list_for_file(&ctx, file.id).await.unwrap().len(), 2);
        assert_eq!(shares.sweep_expired().await.unwrap(), 1);

        let remaining = shares.list_for_owner(&ctx).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].link.id, live.link.id);
    }
}
