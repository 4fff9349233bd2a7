//! Share link lifecycle: issue, resolve, consume, download, revoke, sweep.

pub mod access;
pub mod link;
pub mod service;

pub use access::{AccessService, SharePreview, ShareDownload};
pub use link::LinkService;
pub use service::{IssueShareRequest, IssuedShare, ShareService};
