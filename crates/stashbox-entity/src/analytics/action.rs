//! Action type vocabularies for the analytics tables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Actions recorded in `user_analytics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserActionType {
    Register,
    Login,
    PasswordChange,
    Upload,
    Download,
    Delete,
    Rename,
    Move,
    CreateFolder,
    DeleteFolder,
    Share,
    Revoke,
}

impl UserActionType {
    /// Get the action as its stored string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Login => "login",
            Self::PasswordChange => "password_change",
            Self::Upload => "upload",
            Self::Download => "download",
            Self::Delete => "delete",
            Self::Rename => "rename",
            Self::Move => "move",
            Self::CreateFolder => "create_folder",
            Self::DeleteFolder => "delete_folder",
            Self::Share => "share",
            Self::Revoke => "revoke",
        }
    }
}

impl fmt::Display for UserActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "register" => Ok(Self::Register),
            "login" => Ok(Self::Login),
            "password_change" => Ok(Self::PasswordChange),
            "upload" => Ok(Self::Upload),
            "download" => Ok(Self::Download),
            "delete" => Ok(Self::Delete),
            "rename" => Ok(Self::Rename),
            "move" => Ok(Self::Move),
            "create_folder" => Ok(Self::CreateFolder),
            "delete_folder" => Ok(Self::DeleteFolder),
            "share" => Ok(Self::Share),
            "revoke" => Ok(Self::Revoke),
            other => Err(format!("Unknown user action: {other}")),
        }
    }
}

/// Actions recorded in `file_analytics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileActionType {
    Upload,
    Download,
    Preview,
    Share,
    Rename,
    Move,
}

impl FileActionType {
    /// Get the action as its stored string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Download => "download",
            Self::Preview => "preview",
            Self::Share => "share",
            Self::Rename => "rename",
            Self::Move => "move",
        }
    }
}

impl fmt::Display for FileActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
