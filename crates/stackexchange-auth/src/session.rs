//! ============================================================================
//! Session - Per-login state between redirect and profile fetch
//! ============================================================================
//! Created by `begin_auth` with only the authorization URL set. The access
//! token arrives later, either set by the caller or through `authorize`.
//! ============================================================================

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};
use crate::provider::Provider;
use crate::stackexchange::StackExchangeProvider;

/// StackExchange login session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "AuthURL", default)]
    pub auth_url: String,
    #[serde(rename = "AccessToken", default)]
    pub access_token: String,
    #[serde(rename = "ExpiresAt", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// New session pointing at `auth_url`, no token yet
    pub fn new(auth_url: impl Into<String>) -> Self {
        Self {
            auth_url: auth_url.into(),
            ..Self::default()
        }
    }

    /// The URL to send the user to
    pub fn auth_url(&self) -> Result<&str> {
        if self.auth_url.is_empty() {
            return Err(AuthError::MissingAuthUrl);
        }
        Ok(&self.auth_url)
    }

    /// Serialize to the JSON text form
    pub fn marshal(&self) -> String {
        // Plain strings and an optional timestamp cannot fail to serialize
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parse a session previously produced by [`Session::marshal`]
    pub fn unmarshal(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    /// Complete the login with the callback parameters.
    ///
    /// Exchanges `code` for an access token, stores the token and its expiry
    /// on the session and returns the token.
    pub async fn authorize(
        &mut self,
        provider: &StackExchangeProvider,
        params: &HashMap<String, String>,
    ) -> Result<String> {
        let code = params
            .get("code")
            .filter(|code| !code.is_empty())
            .ok_or(AuthError::MissingParameter("code"))?;

        let token = provider.exchange_code(code).await?;
        if token.access_token.is_empty() {
            return Err(AuthError::MissingAccessToken {
                provider: provider.name().to_string(),
            });
        }

        self.access_token = token.access_token;
        self.expires_at = token.expires_at;
        Ok(self.access_token.clone())
    }
}
