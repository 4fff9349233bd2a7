//! Route handlers organized by domain.

pub mod analytics;
pub mod auth;
pub mod file;
pub mod folder;
pub mod health;
pub mod public;
pub mod share;
