//! # stashbox-auth
//!
//! Authentication and authorization for Stashbox.
//!
//! ## Modules
//!
//! - `jwt`: bearer token issuance and validation
//! - `password`: Argon2id hashing and the length policy
//! - `ownership`: the single ownership guard every operation goes through

pub mod jwt;
pub mod ownership;
pub mod password;

pub use jwt::{Claims, IssuedToken, JwtDecoder, JwtEncoder};
pub use ownership::OwnershipGuard;
pub use password::{PasswordHasher, PasswordValidator};
