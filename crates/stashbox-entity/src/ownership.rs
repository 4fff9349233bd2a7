//! Resource kinds subject to the ownership check.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kinds of owner-scoped records.
///
/// Share links carry no owner column; they are owned through their file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// A stored file.
    File,
    /// A folder in the hierarchy.
    Folder,
    /// A share link.
    ShareLink,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "File"),
            Self::Folder => write!(f, "Folder"),
            Self::ShareLink => write!(f, "Share link"),
        }
    }
}
