//! Append-only analytics events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::action::{FileActionType, UserActionType};

/// A public access of a share link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShareAccess {
    pub share_link_id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// An action performed by an authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUserAction {
    pub user_id: Uuid,
    pub action_type: UserActionType,
    /// Free-form context such as the file name or share token.
    pub details: Option<serde_json::Value>,
}

/// An action against a file, possibly anonymous (public share downloads).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFileAction {
    pub file_id: Uuid,
    pub action_type: FileActionType,
    pub user_id: Option<Uuid>,
    pub ip_address: Option<String>,
}

/// A stored `user_analytics` row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserActionRecord {
    pub id: i64,
    pub user_id: Uuid,
    pub action_type: String,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
