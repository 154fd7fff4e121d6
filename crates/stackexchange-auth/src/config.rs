//! ============================================================================
//! OAuth2 Config - Client configuration and authorization URL rendering
//! ============================================================================
//! Derives the OAuth 2.0 client configuration from provider credentials and
//! renders the authorization-code request URL the user is redirected to.
//! ============================================================================

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// StackExchange authorization endpoint
pub const AUTH_URL: &str = "https://stackexchange.com/oauth";

/// StackExchange token endpoint (JSON variant)
pub const TOKEN_URL: &str = "https://stackexchange.com/oauth/access_token/json";

/// Scope every configuration carries, whatever the caller asks for
pub const DEFAULT_SCOPE: &str = "private_info";

/// Authorization and token endpoint pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub auth_url: String,
    pub token_url: String,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            auth_url: AUTH_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
        }
    }
}

/// OAuth 2.0 client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2Config {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub endpoint: Endpoint,
    pub scopes: Vec<String>,
}

impl OAuth2Config {
    /// Build a config against the production endpoints.
    ///
    /// The scope list starts with [`DEFAULT_SCOPE`] and appends each caller
    /// scope that is not the default. Repeats among the caller scopes are
    /// kept as given.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
        scopes: &[String],
    ) -> Self {
        let mut merged = vec![DEFAULT_SCOPE.to_string()];
        merged.extend(
            scopes
                .iter()
                .filter(|scope| scope.as_str() != DEFAULT_SCOPE)
                .cloned(),
        );

        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: redirect_url.into(),
            endpoint: Endpoint::default(),
            scopes: merged,
        }
    }

    /// Replace the endpoint pair
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Render the authorization-code request URL for `state`.
    ///
    /// Query parameters are emitted in key order and form-urlencoded;
    /// `redirect_uri` and `scope` are left out when empty.
    pub fn auth_code_url(&self, state: &str) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("client_id", &self.client_id);
        if !self.redirect_url.is_empty() {
            query.append_pair("redirect_uri", &self.redirect_url);
        }
        query.append_pair("response_type", "code");
        if !self.scopes.is_empty() {
            query.append_pair("scope", &self.scopes.join(" "));
        }
        query.append_pair("state", state);

        let separator = if self.endpoint.auth_url.contains('?') {
            '&'
        } else {
            '?'
        };
        format!("{}{}{}", self.endpoint.auth_url, separator, query.finish())
    }
}
