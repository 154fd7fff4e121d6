//! ============================================================================
//! Tokens - Access token value type and token endpoint response decoding
//! ============================================================================

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// OAuth 2.0 token issued by the token endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Token {
    /// Whether the token has expired. Tokens without an expiry never do.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|expires_at| expires_at <= Utc::now())
            .unwrap_or(false)
    }
}

/// Raw token endpoint response.
///
/// StackExchange answers with `expires`; standard servers use `expires_in`.
/// A `no_expiry` grant omits both.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub expires: Option<i64>,
}

impl TokenResponse {
    /// Convert to a [`Token`], resolving the lifetime against `now`.
    ///
    /// A lifetime too large to represent as a timestamp is treated as no
    /// expiry.
    pub fn into_token(self, now: DateTime<Utc>) -> Token {
        let expires_at = self
            .expires_in
            .or(self.expires)
            .filter(|secs| *secs > 0)
            .and_then(TimeDelta::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime));

        Token {
            access_token: self.access_token,
            token_type: self.token_type,
            refresh_token: self.refresh_token,
            expires_at,
        }
    }
}
