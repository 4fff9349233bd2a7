//! Share link token generation.

use rand::Rng;
use rand::distr::Alphanumeric;

/// Generates share tokens and renders their public URLs.
#[derive(Debug, Clone)]
pub struct LinkService {
    token_length: usize,
    public_base_url: String,
}

impl LinkService {
    /// Creates a link service producing `token_length`-character tokens.
    pub fn new(token_length: usize, public_base_url: impl Into<String>) -> Self {
        Self {
            token_length,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// A fresh alphanumeric token from the thread-local CSPRNG.
    pub fn generate_token(&self) -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(self.token_length)
            .map(char::from)
            .collect()
    }

    /// The URL a recipient opens for `token`, served by the public share route.
    pub fn share_url(&self, token: &str) -> String {
        format!("{}/api/s/{token}", self.public_base_url)
    }
}
