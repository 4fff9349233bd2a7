//! # stashbox-storage
//!
//! Where file bytes live. Uploads go to an S3-compatible object store when
//! one is configured and reachable, and to a local directory otherwise.

pub mod keys;
pub mod manager;
pub mod providers;

pub use manager::{AccessTarget, StorageManager, StoredObject};
pub use providers::local::LocalStorageProvider;
pub use providers::s3::S3ObjectStore;
