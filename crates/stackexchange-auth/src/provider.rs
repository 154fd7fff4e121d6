//! Provider interface expected by a multi-provider authentication registry.
//!
//! The trait is object-safe so a host can keep providers as
//! `Box<dyn Provider>` keyed by [`Provider::name`].

use async_trait::async_trait;

use crate::error::Result;
use crate::session::Session;
use crate::token::Token;
use crate::user::User;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Name the provider is registered under
    fn name(&self) -> &str;

    /// Rename, for registering several instances of one provider type
    fn set_name(&mut self, name: String);

    /// Start a login; the returned session carries the authorization URL
    fn begin_auth(&self, state: &str) -> Result<Session>;

    /// Restore a session from its marshaled form
    fn unmarshal_session(&self, data: &str) -> Result<Session>;

    /// Fetch and normalize the user behind the session's access token
    async fn fetch_user(&self, session: &Session) -> Result<User>;

    /// Exchange a refresh token for a new token
    async fn refresh_token(&self, refresh_token: &str) -> Result<Token>;

    /// Whether [`Provider::refresh_token`] is supported
    fn refresh_token_available(&self) -> bool;
}
