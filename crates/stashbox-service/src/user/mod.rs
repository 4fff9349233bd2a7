//! Identity: registration, login, token authentication, password changes.

pub mod service;

pub use service::{IdentityService, LoginResponse, RegisterRequest};
