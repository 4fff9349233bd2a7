//! File domain entities.

pub mod kind;
pub mod location;
pub mod model;

pub use kind::{FileKind, format_file_size};
pub use location::{StorageBackend, StorageLocation};
pub use model::{CreateFile, File};
