//! Folder management and tree services.

pub mod service;
pub mod tree;

pub use service::{FolderContents, FolderService};
pub use tree::TreeService;
