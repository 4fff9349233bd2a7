//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Password change request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Create folder request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolderRequest {
    pub name: String,
    /// Parent folder, the root when absent.
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

/// Rename a folder or a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

/// Move a folder under a new parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveFolderRequest {
    /// New parent, the root when absent.
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

/// Move a file into another folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveFileRequest {
    /// Target folder, the root when absent.
    #[serde(default)]
    pub folder_id: Option<Uuid>,
}

/// Toggle a file's public flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityRequest {
    pub is_public: bool,
}

/// File listing filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListFilesQuery {
    /// Folder to list, the root when absent.
    pub folder_id: Option<Uuid>,
    /// List every file the caller owns, ignoring `folder_id`.
    #[serde(default)]
    pub all: bool,
}

/// Timeline window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelineQuery {
    pub days: Option<i64>,
}

/// Body of a public share download. May be empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShareDownloadRequest {
    #[serde(default)]
    pub password: Option<String>,
}
