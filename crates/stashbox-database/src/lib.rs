//! # stashbox-database
//!
//! PostgreSQL connection management, the repository traits every service
//! depends on, and two implementations of them: Postgres repositories and
//! an in-memory store for tests and local development.

pub mod connection;
pub mod error;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use store::{AnalyticsStore, FileStore, FolderStore, ShareStore, Stores, UserStore};
