//! ============================================================================
//! Error Types - Failure taxonomy for the StackExchange provider
//! ============================================================================
//! Every failure is returned to the caller. Nothing here is retried or
//! swallowed; the host decides what to do with it.
//! ============================================================================

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AuthError>;

/// Error types for the provider, session and profile mapper
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{provider} cannot get user information without accessToken")]
    IncompleteSession { provider: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{provider} responded with a {status} trying to fetch user information")]
    UnexpectedStatus { provider: String, status: u16 },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("profile response contained no items")]
    EmptyProfile,

    #[error("{operation} is not provided by {provider}")]
    Unsupported {
        provider: String,
        operation: &'static str,
    },

    #[error("an AuthURL has not been set")]
    MissingAuthUrl,

    #[error("Missing callback parameter: {0}")]
    MissingParameter(&'static str),

    #[error("{provider} token exchange failed ({status}): {body}")]
    TokenExchange {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider} token response did not contain an access_token")]
    MissingAccessToken { provider: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HMAC init failed: {0}")]
    Hmac(String),
}
