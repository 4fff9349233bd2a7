//! Postgres implementations of the store traits.

pub mod analytics;
pub mod file;
pub mod folder;
pub mod share;
pub mod user;

pub use analytics::AnalyticsRepository;
pub use file::FileRepository;
pub use folder::FolderRepository;
pub use share::ShareRepository;
pub use user::UserRepository;
