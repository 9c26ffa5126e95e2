//! Access-token caching
//!
//! Both the app token (client credentials) and the owner token (refresh
//! grant) expire after about an hour. Tokens are reused until shortly
//! before expiry, then re-requested.

use serde::Deserialize;
use std::time::{Duration, Instant};

/// Tokens are renewed this long before the provider's stated expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Token endpoint response (client-credentials, refresh and code grants)
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    /// Only sent by the code grant and, sometimes, on refresh
    #[serde(default)]
    pub refresh_token: Option<String>,
}

fn default_expires_in() -> u64 {
    3600
}

/// An access token with its local expiry deadline
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    pub fn new(access_token: String, expires_in: Duration) -> Self {
        Self {
            access_token,
            expires_at: Instant::now() + expires_in,
        }
    }

    pub fn from_response(response: &TokenResponse) -> Self {
        Self::new(
            response.access_token.clone(),
            Duration::from_secs(response.expires_in),
        )
    }

    /// Usable for at least another [`EXPIRY_MARGIN`]
    pub fn is_fresh(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN < self.expires_at
    }
}
