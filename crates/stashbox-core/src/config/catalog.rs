//! Folder and file catalog configuration.

use serde::{Deserialize, Serialize};

/// Limits applied to the folder hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Maximum number of parent hops walked when resolving a folder path.
    #[serde(default = "default_max_depth")]
    pub max_folder_depth: usize,
    /// Maximum folder or file name length in characters.
    #[serde(default = "default_max_name")]
    pub max_name_length: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_folder_depth: default_max_depth(),
            max_name_length: default_max_name(),
        }
    }
}

fn default_max_depth() -> usize {
    64
}

fn default_max_name() -> usize {
    255
}
