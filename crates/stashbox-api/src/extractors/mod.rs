//! Custom Axum extractors.

pub mod auth;
pub mod client;
pub mod json;

pub use auth::AuthUser;
pub use client::Client;
pub use json::{AppJson, AppPath, AppQuery};
