//! ============================================================================
//! StackExchange Provider - OAuth 2.0 login through stackexchange.com
//! ============================================================================
//! Implements the authorization code flow against StackExchange:
//! - Authorization URL rendering with a caller-supplied state
//! - Code exchange at the JSON token endpoint
//! - Profile fetch from `/me`, signed with an appsecret_proof
//!
//! StackExchange does not issue refresh tokens.
//! ============================================================================

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode};
use sha2::Sha256;
use tracing::{debug, error, info};

use crate::config::{Endpoint, OAuth2Config};
use crate::credentials::Credentials;
use crate::error::{AuthError, Result};
use crate::http::client_with_fallback;
use crate::profile::map_profile;
use crate::provider::Provider;
use crate::session::Session;
use crate::token::{Token, TokenResponse};
use crate::user::User;

/// Profile endpoint; request parameters are appended to its query
pub const PROFILE_URL: &str = "https://api.stackexchange.com/me?site=stackoverflow";

/// Name the provider registers under unless renamed
pub const PROVIDER_NAME: &str = "stackexchange";

type HmacSha256 = Hmac<Sha256>;

/// Hex HMAC-SHA256 of `access_token` keyed by the client secret
pub fn appsecret_proof(secret: &str, access_token: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AuthError::Hmac(e.to_string()))?;
    mac.update(access_token.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// StackExchange OAuth 2.0 provider
#[derive(Debug)]
pub struct StackExchangeProvider {
    pub client_key: String,
    pub secret: String,
    pub client_access_key: String,
    pub callback_url: String,
    http_client: Option<Client>,
    config: OAuth2Config,
    profile_endpoint: String,
    provider_name: String,
}

impl StackExchangeProvider {
    /// Create a provider. Always go through this (or
    /// [`StackExchangeProvider::from_credentials`]) so the OAuth config is
    /// derived from the credentials.
    pub fn new(
        client_key: impl Into<String>,
        secret: impl Into<String>,
        client_access_key: impl Into<String>,
        callback_url: impl Into<String>,
        scopes: &[String],
    ) -> Self {
        let client_key = client_key.into();
        let secret = secret.into();
        let callback_url = callback_url.into();
        let config = OAuth2Config::new(&client_key, &secret, &callback_url, scopes);

        Self {
            client_key,
            secret,
            client_access_key: client_access_key.into(),
            callback_url,
            http_client: None,
            config,
            profile_endpoint: PROFILE_URL.to_string(),
            provider_name: PROVIDER_NAME.to_string(),
        }
    }

    /// Create a provider from loaded credentials
    pub fn from_credentials(credentials: &Credentials, scopes: &[String]) -> Self {
        Self::new(
            credentials.client_key.clone(),
            credentials.secret.clone(),
            credentials.client_access_key.clone(),
            credentials.callback_url.clone(),
            scopes,
        )
    }

    /// Use `client` for every request instead of the shared default
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Point authorization and token requests at other endpoints
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.config = self.config.with_endpoint(endpoint);
        self
    }

    /// Point profile requests at another `/me` URL. It must already carry a
    /// query string.
    pub fn with_profile_endpoint(mut self, url: impl Into<String>) -> Self {
        self.profile_endpoint = url.into();
        self
    }

    /// The derived OAuth config
    pub fn config(&self) -> &OAuth2Config {
        &self.config
    }

    /// The injected client, or the shared default
    pub fn client(&self) -> &Client {
        client_with_fallback(self.http_client.as_ref())
    }

    /// Exchange an authorization code for a token
    pub async fn exchange_code(&self, code: &str) -> Result<Token> {
        info!("Exchanging authorization code for {} tokens", self.provider_name);

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self
            .client()
            .post(&self.config.endpoint.token_url)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Token exchange failed: {} - {}", status, body);
            return Err(AuthError::TokenExchange {
                provider: self.provider_name.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        let token: TokenResponse = serde_json::from_slice(&body)?;
        let token = token.into_token(Utc::now());

        match token.expires_at {
            Some(expires_at) => {
                info!("Obtained {} token, expires at {}", self.provider_name, expires_at)
            }
            None => info!("Obtained {} token without expiry", self.provider_name),
        }
        Ok(token)
    }

    fn profile_url(&self, access_token: &str) -> Result<String> {
        let proof = appsecret_proof(&self.secret, access_token)?;
        Ok(format!(
            "{}&access_token={}&key={}&appsecret_proof={}",
            self.profile_endpoint,
            urlencoding::encode(access_token),
            self.client_access_key,
            proof
        ))
    }
}

#[async_trait]
impl Provider for StackExchangeProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    fn set_name(&mut self, name: String) {
        self.provider_name = name;
    }

    fn begin_auth(&self, state: &str) -> Result<Session> {
        let url = self.config.auth_code_url(state);
        debug!("Generated {} auth URL with state: {}", self.provider_name, state);
        Ok(Session::new(url))
    }

    fn unmarshal_session(&self, data: &str) -> Result<Session> {
        Session::unmarshal(data)
    }

    /// Fetch the `/me` profile with the session's access token.
    ///
    /// Failures return only the error. No partially filled [`User`] comes
    /// back with it; the token, expiry and provider name it would hold are
    /// already known to the caller.
    async fn fetch_user(&self, session: &Session) -> Result<User> {
        let mut user = User {
            access_token: session.access_token.clone(),
            provider: self.name().to_string(),
            expires_at: session.expires_at,
            ..User::default()
        };

        if user.access_token.is_empty() {
            return Err(AuthError::IncompleteSession {
                provider: self.provider_name.clone(),
            });
        }

        let url = self.profile_url(&session.access_token)?;
        info!("Fetching {} user profile", self.provider_name);

        let response = self.client().get(&url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            error!("{} profile request failed: {}", self.provider_name, status);
            return Err(AuthError::UnexpectedStatus {
                provider: self.provider_name.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        user.raw_data = serde_json::from_slice(&body)?;
        user.apply_profile(map_profile(&body)?);

        debug!("Fetched {} user {}", self.provider_name, user.user_id);
        Ok(user)
    }

    async fn refresh_token(&self, _refresh_token: &str) -> Result<Token> {
        Err(AuthError::Unsupported {
            provider: self.provider_name.clone(),
            operation: "Refresh token",
        })
    }

    fn refresh_token_available(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubServer;

    const SAMPLE: &str = r#"{"items":[{"user_id":42,"email":"a@b.com","about_me":"bio","display_name":"Ada","first_name":"Ada","last_name":"L","link":"http://x","profile_image":"http://p","location":"NY"}]}"#;

    fn provider() -> StackExchangeProvider {
        StackExchangeProvider::new(
            "client-key",
            "secret",
            "access-key",
            "/foo",
            &["private_info".to_string()],
        )
    }

    fn stubbed(server: &StubServer) -> StackExchangeProvider {
        provider().with_profile_endpoint(format!("{}/me?site=stackoverflow", server.base_url))
    }

    fn session(token: &str) -> Session {
        Session {
            auth_url: String::new(),
            access_token: token.to_string(),
            expires_at: None,
        }
    }

    #[test]
    fn test_new() {
        let p = provider();
        assert_eq!(p.client_key, "client-key");
        assert_eq!(p.secret, "secret");
        assert_eq!(p.client_access_key, "access-key");
        assert_eq!(p.callback_url, "/foo");
        assert_eq!(p.name(), PROVIDER_NAME);
        assert_eq!(p.config().client_id, "client-key");
        assert_eq!(p.config().client_secret, "secret");
        assert_eq!(p.config().redirect_url, "/foo");
        assert_eq!(p.config().scopes, vec!["private_info".to_string()]);
    }

    #[test]
    fn test_implements_provider() {
        let boxed: Box<dyn Provider> = Box::new(provider());
        assert_eq!(boxed.name(), "stackexchange");
    }

    #[test]
    fn test_set_name() {
        let mut p = provider();
        p.set_name("stackexchange-staging".to_string());
        assert_eq!(p.name(), "stackexchange-staging");
    }

    #[test]
    fn test_begin_auth() {
        let session = provider().begin_auth("test_state").unwrap();
        assert!(session.auth_url.contains("stackexchange.com/oauth"));
        assert!(session.auth_url.contains("client_id=client-key"));
        assert!(session.auth_url.contains("state=test_state"));
        assert!(session.auth_url.contains("scope=private_info"));
        assert!(session.access_token.is_empty());
        assert_eq!(session.expires_at, None);
    }

    #[test]
    fn test_begin_auth_encodes_state() {
        let p = provider();
        for (state, encoded) in [
            ("a b&c", "state=a+b%26c"),
            ("x=y/z", "state=x%3Dy%2Fz"),
            ("plain-123", "state=plain-123"),
        ] {
            let session = p.begin_auth(state).unwrap();
            assert!(session.auth_url.ends_with(encoded), "url: {}", session.auth_url);
            assert!(session.auth_url.contains("client_id=client-key"));
            assert!(session.auth_url.contains("scope=private_info"));
        }
    }

    #[test]
    fn test_session_from_json() {
        let session = provider()
            .unmarshal_session(
                r#"{"AuthURL":"http://stackexchange.com/auth_url","AccessToken":"1234567890"}"#,
            )
            .unwrap();
        assert_eq!(session.auth_url, "http://stackexchange.com/auth_url");
        assert_eq!(session.access_token, "1234567890");
    }

    #[test]
    fn test_appsecret_proof() {
        assert_eq!(
            appsecret_proof("Jefe", "what do ya want for nothing?").unwrap(),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_client_fallback() {
        let p = provider();
        assert!(std::ptr::eq(p.client(), crate::http::default_client()));

        let p = provider().with_http_client(Client::new());
        assert!(!std::ptr::eq(p.client(), crate::http::default_client()));
    }

    #[tokio::test]
    async fn test_fetch_user_without_token() {
        let server = StubServer::start(200, SAMPLE);
        let err = stubbed(&server).fetch_user(&session("")).await.unwrap_err();

        assert!(matches!(err, AuthError::IncompleteSession { .. }));
        assert!(err.to_string().contains("stackexchange"));
        assert_eq!(server.hits(), 0);
    }

    #[tokio::test]
    async fn test_fetch_user() {
        let server = StubServer::start(200, SAMPLE);
        let mut sess = session("abc");
        sess.expires_at = Some(Utc::now());

        let user = stubbed(&server).fetch_user(&sess).await.unwrap();

        assert_eq!(user.user_id, "42");
        assert_eq!(user.name, "Ada");
        assert_eq!(user.nick_name, "Ada");
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.last_name, "L");
        assert_eq!(user.email, "a@b.com");
        assert_eq!(user.description, "bio");
        assert_eq!(user.avatar_url, "http://p");
        assert_eq!(user.location, "NY");
        assert_eq!(user.access_token, "abc");
        assert_eq!(user.expires_at, sess.expires_at);
        assert_eq!(user.provider, "stackexchange");
        assert!(user.raw_data["items"].is_array());
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn test_fetch_user_query_order() {
        let server = StubServer::start(200, SAMPLE);
        stubbed(&server).fetch_user(&session("abc")).await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(
            requests[0].url,
            "/me?site=stackoverflow&access_token=abc&key=access-key\
             &appsecret_proof=9946dad4e00e913fc8be8e5d3f7e110a4a9e832f83fb09c345285d78638d8a0e"
        );
    }

    #[tokio::test]
    async fn test_fetch_user_escapes_token() {
        let server = StubServer::start(200, SAMPLE);
        stubbed(&server).fetch_user(&session("a b&c")).await.unwrap();

        let url = &server.requests()[0].url;
        assert!(url.contains("access_token=a%20b%26c&key="));
    }

    #[tokio::test]
    async fn test_fetch_user_renamed_provider() {
        let server = StubServer::start(200, SAMPLE);
        let mut p = stubbed(&server);
        p.set_name("se2".to_string());
        let user = p.fetch_user(&session("abc")).await.unwrap();
        assert_eq!(user.provider, "se2");
    }

    #[tokio::test]
    async fn test_fetch_user_not_found() {
        let server = StubServer::start(404, "{}");
        let err = stubbed(&server).fetch_user(&session("abc")).await.unwrap_err();

        match &err {
            AuthError::UnexpectedStatus { provider, status } => {
                assert_eq!(*status, 404);
                assert_eq!(provider, "stackexchange");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_fetch_user_malformed_body() {
        let server = StubServer::start(200, "{not json");
        let err = stubbed(&server).fetch_user(&session("abc")).await.unwrap_err();
        assert!(matches!(err, AuthError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_user_non_object_body() {
        let server = StubServer::start(200, "[1, 2]");
        let err = stubbed(&server).fetch_user(&session("abc")).await.unwrap_err();
        assert!(matches!(err, AuthError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_user_empty_items() {
        let server = StubServer::start(200, r#"{"items":[]}"#);
        let err = stubbed(&server).fetch_user(&session("abc")).await.unwrap_err();
        assert!(matches!(err, AuthError::EmptyProfile));
        assert_eq!(err.to_string(), "profile response contained no items");
    }

    #[tokio::test]
    async fn test_fetch_user_transport_error() {
        // Bind then release a port so nothing is listening on it
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let p = provider()
            .with_profile_endpoint(format!("http://127.0.0.1:{}/me?site=stackoverflow", port));

        let err = p.fetch_user(&session("abc")).await.unwrap_err();
        assert!(matches!(err, AuthError::Transport(_)));
    }

    #[tokio::test]
    async fn test_fetch_user_uses_injected_client() {
        let server = StubServer::start(200, SAMPLE);
        let client = Client::builder().user_agent("injected/1.0").build().unwrap();
        let user = stubbed(&server)
            .with_http_client(client)
            .fetch_user(&session("abc"))
            .await
            .unwrap();
        assert_eq!(user.user_id, "42");
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn test_refresh_token_unsupported() {
        let p = provider();
        let err = p.refresh_token("anything").await.unwrap_err();
        assert!(matches!(err, AuthError::Unsupported { .. }));
        assert_eq!(err.to_string(), "Refresh token is not provided by stackexchange");
        assert!(!p.refresh_token_available());
    }
}
