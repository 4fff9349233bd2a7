//! Share link configuration.

use serde::{Deserialize, Serialize};

/// Share link issuance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Expiry applied when the caller does not choose one.
    #[serde(default = "default_expiry")]
    pub default_expiry_hours: i64,
    /// Longest expiry a caller may request.
    #[serde(default = "default_max_expiry")]
    pub max_expiry_hours: i64,
    /// Length of generated tokens.
    #[serde(default = "default_token_length")]
    pub token_length: usize,
    /// How many fresh tokens to try when the unique index rejects one.
    #[serde(default = "default_token_attempts")]
    pub max_token_attempts: u32,
    /// Base URL used to render share links (e.g. `https://files.example.com`).
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            default_expiry_hours: default_expiry(),
            max_expiry_hours: default_max_expiry(),
            token_length: default_token_length(),
            max_token_attempts: default_token_attempts(),
            public_base_url: default_public_base_url(),
        }
    }
}

fn default_expiry() -> i64 {
    24
}

fn default_max_expiry() -> i64 {
    24 * 30
}

fn default_token_length() -> usize {
    32
}

fn default_token_attempts() -> u32 {
    3
}

fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}
