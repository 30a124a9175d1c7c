use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::session::{
    Action, Clock, MemorySessionStore, SessionGuard, SessionStore, SystemClock, TOKEN_KEY,
    USER_ROLE_ID,
};

#[derive(Parser)]
#[command(name = "smartmeter-portal")]
#[command(about = "Smart Meter Portal - role-gated frontend for the metering API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Evaluate the page gate for a token without starting the server
    Token {
        /// Compact JWT as issued by the API
        #[arg(value_name = "TOKEN")]
        token: String,

        /// Role the page requires
        #[arg(short, long, default_value_t = USER_ROLE_ID)]
        role: i64,

        /// Where a viewer with the wrong role is sent
        #[arg(short, long, default_value = "/")]
        fallback: String,
    },

    /// Configuration validation
    Config,
}

/// Result of gating a single token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenReport {
    pub action: Action,
    pub is_administrator: bool,
    pub cleared: bool,
}

pub fn evaluate_token<C: Clock>(token: &str, role: i64, fallback: &str, clock: C) -> TokenReport {
    let store = MemorySessionStore::with_token(token);
    let guard = SessionGuard::with_clock(&store, clock);

    // Read the admin predicate first; the gate may clear the token.
    let is_administrator = guard.is_administrator();
    let action = guard.check_access(role, fallback);

    TokenReport {
        action,
        is_administrator,
        cleared: store.get(TOKEN_KEY).is_none(),
    }
}

pub fn handle_token_check(token: &str, role: i64, fallback: &str) -> anyhow::Result<()> {
    match crate::session::decode_token(token) {
        Ok(claims) => {
            println!("Claims:");
            println!("  User ID: {}", claims.user_id);
            println!("  Username: {}", claims.username);
            println!("  Role ID: {}", claims.role_id);
            println!("  Expires: {}", format_expiry(claims.exp));
        }
        Err(err) => println!("✗ {}", err),
    }

    let report = evaluate_token(token, role, fallback, SystemClock);
    println!("Administrator: {}", report.is_administrator);
    match &report.action {
        Action::Allow => println!("✓ Access to a role {} page is allowed", role),
        Action::Redirect(path) => println!("→ Redirect to {}", path),
    }
    if report.cleared {
        println!("  Token would be cleared");
    }

    Ok(())
}

fn format_expiry(exp: i64) -> String {
    chrono::DateTime::from_timestamp(exp, 0)
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| exp.to_string())
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");

    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!("  API Base URL: {}", config.api_base_url);
    match config.api_timeout_secs {
        Some(secs) => println!("  API Timeout: {}s", secs),
        None => println!("  API Timeout: none"),
    }
    println!("  Secure Cookies: {}", config.cookie_secure);
    if !config.cors_allowed_origins.is_empty() {
        println!("  CORS Origins: {}", config.cors_allowed_origins.join(", "));
    }

    tracing::info!("Configuration is valid");
    println!("✓ Configuration is valid");

    Ok(())
}
