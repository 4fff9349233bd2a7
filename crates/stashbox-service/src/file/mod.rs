//! File catalog services: CRUD, upload, owner download, preview, reclaim.

pub mod cleanup;
pub mod download;
pub mod preview;
pub mod service;
pub mod upload;

pub use cleanup::StorageReclaimer;
pub use download::{DownloadResult, DownloadService};
pub use preview::{FilePreview, PreviewService};
pub use service::FileService;
pub use upload::{UploadFailure, UploadItem, UploadReport, UploadService};
