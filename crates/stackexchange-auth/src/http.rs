//! Shared HTTP client used when a provider has none injected.

use once_cell::sync::OnceCell;
use reqwest::Client;

static DEFAULT_CLIENT: OnceCell<Client> = OnceCell::new();

/// Process-wide default client, built on first use
pub fn default_client() -> &'static Client {
    DEFAULT_CLIENT.get_or_init(|| {
        Client::builder()
            .user_agent("stackexchange-auth/1.0")
            .build()
            .unwrap_or_else(|_| Client::new())
    })
}

/// Return `client` if present, otherwise the shared default
pub fn client_with_fallback(client: Option<&Client>) -> &Client {
    client.unwrap_or_else(|| default_client())
}
