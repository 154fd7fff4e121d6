//! ============================================================================
//! Credentials - StackExchange app registration loaded from the environment
//! ============================================================================
//! Variables (a `.env` file in the working directory is honored):
//! - STACKEXCHANGE_KEY          client id
//! - STACKEXCHANGE_SECRET       client secret, also the appsecret_proof key
//! - STACKEXCHANGE_ACCESS_KEY   API key sent as `key` on every API call
//! - STACKEXCHANGE_CALLBACK_URL redirect URL (optional)
//! ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};

pub const ENV_CLIENT_KEY: &str = "STACKEXCHANGE_KEY";
pub const ENV_SECRET: &str = "STACKEXCHANGE_SECRET";
pub const ENV_ACCESS_KEY: &str = "STACKEXCHANGE_ACCESS_KEY";
pub const ENV_CALLBACK_URL: &str = "STACKEXCHANGE_CALLBACK_URL";

/// Redirect URL used when none is configured
pub const DEFAULT_CALLBACK_URL: &str = "http://localhost:9876/callback";

/// Registered application credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub client_key: String,
    pub secret: String,
    pub client_access_key: String,
    pub callback_url: String,
}

impl Credentials {
    /// Load from the process environment and `.env`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    /// Load through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| AuthError::Config(format!("{} is not set", key)))
        };

        Ok(Self {
            client_key: required(ENV_CLIENT_KEY)?,
            secret: required(ENV_SECRET)?,
            client_access_key: required(ENV_ACCESS_KEY)?,
            callback_url: lookup(ENV_CALLBACK_URL)
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| DEFAULT_CALLBACK_URL.to_string()),
        })
    }
}
