//! # stashbox-service
//!
//! Business logic for Stashbox. Each service orchestrates the stores,
//! storage manager, and auth primitives to implement one use case area.
//!
//! Services follow constructor injection: every dependency is handed in at
//! construction time, stores as `Arc<dyn …>` trait objects.

pub mod analytics;
pub mod context;
pub mod file;
pub mod folder;
mod naming;
pub mod share;
pub mod user;

#[cfg(test)]
mod testing;

pub use analytics::{AnalyticsRecorder, AnalyticsService};
pub use context::{ClientInfo, RequestContext};
pub use file::{
    DownloadService, FileService, PreviewService, StorageReclaimer, UploadService,
};
pub use folder::{FolderService, TreeService};
pub use share::{AccessService, LinkService, ShareService};
pub use user::IdentityService;
