//! ============================================================================
//! STACKEXCHANGE-AUTH: "Login with StackExchange"
//! ============================================================================
//! OAuth 2.0 authorization code flow for StackExchange behind a generic
//! multi-provider interface:
//! - Authorization URL rendering with the mandatory `private_info` scope
//! - Code exchange at the token endpoint
//! - Signed profile fetch normalized into a canonical user record
//! ============================================================================

pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod profile;
pub mod provider;
pub mod session;
pub mod stackexchange;
pub mod token;
pub mod user;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use config::{Endpoint, OAuth2Config};
pub use credentials::Credentials;
pub use error::{AuthError, Result};
pub use profile::{map_profile, ProfileFields};
pub use provider::Provider;
pub use session::Session;
pub use stackexchange::StackExchangeProvider;
pub use token::Token;
pub use user::User;
