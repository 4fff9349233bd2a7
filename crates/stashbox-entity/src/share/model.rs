//! Share link entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::file::File;

/// A tokenized, time-limited link granting download access to one file.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShareLink {
    /// Unique link identifier.
    pub id: Uuid,
    /// The shared file. Ownership flows through it.
    pub file_id: Uuid,
    /// 32-character alphanumeric token, globally unique.
    pub token: String,
    /// The link is unusable at and after this instant.
    pub expires_at: DateTime<Utc>,
    /// Argon2 hash of the optional access password.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Download ceiling (None means unlimited).
    pub max_downloads: Option<i32>,
    /// Successful downloads so far. Only ever increases.
    pub download_count: i32,
    /// Cleared by revoke, never set again.
    pub is_active: bool,
    /// When the link was issued.
    pub created_at: DateTime<Utc>,
}

impl ShareLink {
    /// Whether the link has expired as of `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether a password must be presented.
    pub fn is_password_protected(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Whether the download ceiling has been reached.
    pub fn limit_reached(&self) -> bool {
        self.max_downloads
            .is_some_and(|max| self.download_count >= max)
    }

    /// Remaining downloads, if limited.
    pub fn downloads_remaining(&self) -> Option<i32> {
        self.max_downloads
            .map(|max| (max - self.download_count).max(0))
    }
}

/// Data required to persist a new share link.
#[derive(Debug, Clone)]
pub struct CreateShareLink {
    /// The shared file.
    pub file_id: Uuid,
    /// Generated token.
    pub token: String,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
    /// Hashed password.
    pub password_hash: Option<String>,
    /// Download ceiling.
    pub max_downloads: Option<i32>,
}

/// A resolved link together with its backing file.
#[derive(Debug, Clone, Serialize)]
pub struct SharedFile {
    /// The share link.
    pub link: ShareLink,
    /// The file it grants access to.
    pub file: File,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn link(max: Option<i32>, count: i32) -> ShareLink {
        let now = Utc::now();
        ShareLink {
            id: Uuid::new_v4(),
            file_id: Uuid::new_v4(),
            token: "a".repeat(32),
            expires_at: now + Duration::hours(1),
            password_hash: None,
            max_downloads: max,
            download_count: count,
            is_active: true,
            created_at: now,
        }
    }

    #[test]
    fn test_limit_reached() {
        assert!(!link(None, 1000).limit_reached());
        assert!(!link(Some(3), 2).limit_reached());
        assert!(link(Some(3), 3).limit_reached());
        assert_eq!(link(Some(3), 1).downloads_remaining(), Some(2));
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let l = link(None, 0);
        assert!(!l.is_expired_at(l.expires_at - Duration::seconds(1)));
        assert!(l.is_expired_at(l.expires_at));
    }
}
