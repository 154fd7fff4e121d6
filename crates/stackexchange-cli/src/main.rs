// ============================================================================
// se-auth — drive the StackExchange OAuth 2.0 login from a terminal
// ============================================================================
// Usage:
//   se-auth auth-url [--state STATE] [--scope SCOPE]...   Print the login URL
//   se-auth exchange --code CODE                           Exchange a code, print the session
//   se-auth whoami --token TOKEN                           Fetch the logged-in user
//   se-auth whoami --session JSON                          Same, from a marshaled session
//
// Credentials come from STACKEXCHANGE_KEY, STACKEXCHANGE_SECRET,
// STACKEXCHANGE_ACCESS_KEY and STACKEXCHANGE_CALLBACK_URL (or a .env file).
// ============================================================================

use std::collections::HashMap;

use anyhow::Result;
use clap::{Parser, Subcommand};
use stackexchange_auth::{Credentials, Provider, Session, StackExchangeProvider};
use tracing::info;

/// StackExchange OAuth login helper
#[derive(Parser)]
#[command(name = "se-auth", version, about = "Log in with StackExchange from the command line")]
struct Cli {
    /// Extra OAuth scopes on top of private_info (repeatable)
    #[arg(long = "scope", global = true)]
    scopes: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the authorization URL to open in a browser
    AuthUrl {
        /// Anti-CSRF state (random when omitted)
        #[arg(long)]
        state: Option<String>,
    },

    /// Exchange an authorization code and print the marshaled session
    Exchange {
        /// The `code` parameter from the callback URL
        #[arg(long)]
        code: String,
    },

    /// Fetch the user behind an access token
    Whoami {
        /// Access token
        #[arg(long, conflicts_with = "session", required_unless_present = "session")]
        token: Option<String>,

        /// Marshaled session JSON as printed by `exchange`
        #[arg(long)]
        session: Option<String>,
    },
}

/// Random hex state for CSRF protection
fn generate_state() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Could not load .env file: {}", e);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stackexchange_auth=debug".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let credentials = Credentials::from_env()?;
    let provider = StackExchangeProvider::from_credentials(&credentials, &cli.scopes);

    match cli.command {
        Commands::AuthUrl { state } => cmd_auth_url(&provider, state),
        Commands::Exchange { code } => cmd_exchange(&provider, &code).await,
        Commands::Whoami { token, session } => cmd_whoami(&provider, token, session).await,
    }
}

fn cmd_auth_url(provider: &StackExchangeProvider, state: Option<String>) -> Result<()> {
    let state = state.unwrap_or_else(generate_state);
    let session = provider.begin_auth(&state)?;

    println!("{}", session.auth_url()?);
    eprintln!("state: {}", state);
    Ok(())
}

async fn cmd_exchange(provider: &StackExchangeProvider, code: &str) -> Result<()> {
    let mut session = provider.begin_auth(&generate_state())?;
    let params = HashMap::from([("code".to_string(), code.to_string())]);
    session.authorize(provider, &params).await?;

    info!("Login complete");
    println!("{}", session.marshal());
    Ok(())
}

async fn cmd_whoami(
    provider: &StackExchangeProvider,
    token: Option<String>,
    session: Option<String>,
) -> Result<()> {
    let session = match (token, session) {
        (Some(token), _) => Session {
            access_token: token,
            ..Session::default()
        },
        (None, Some(data)) => provider.unmarshal_session(&data)?,
        (None, None) => anyhow::bail!("Either --token or --session is required"),
    };

    let user = provider.fetch_user(&session).await?;
    println!("{}", serde_json::to_string_pretty(&user)?);
    Ok(())
}
