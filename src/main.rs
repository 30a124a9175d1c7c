use clap::Parser;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use smartmeter_portal::cli::{self, Cli, Commands};
use smartmeter_portal::config::Config;
use smartmeter_portal::web::{create_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        // Offline check, no configuration needed.
        Commands::Token {
            token,
            role,
            fallback,
        } => cli::handle_token_check(&token, role, &fallback),
        Commands::Config => {
            let config = Config::from_env()?;
            cli::handle_config_validate(&config)
        }
        Commands::Serve => serve(Config::from_env()?).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let state = AppState::from_config(&config);
    tracing::info!("Metering API client initialized with URL: {}", config.api_base_url);

    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
