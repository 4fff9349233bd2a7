//! # stashbox-entity
//!
//! Domain entity models for Stashbox. Every struct in this crate
//! represents a database table row or a domain value object. Database
//! entities derive `sqlx::FromRow`.

pub mod analytics;
pub mod file;
pub mod folder;
pub mod ownership;
pub mod share;
pub mod user;

pub use ownership::ResourceKind;
