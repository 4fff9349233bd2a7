//! # stashbox-core
//!
//! Core crate for Stashbox. Contains the object-store trait, configuration
//! schemas, and the unified error system.
//!
//! This crate has **no** dependencies on other Stashbox crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
