//! Core traits defined in `stashbox-core` and implemented by other crates.

pub mod object_store;

pub use object_store::{ObjectStore, ObjectStoreFailure, ObjectSummary};
