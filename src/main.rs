//! Strictly Gomoku - coordinator binary

#![warn(missing_docs)]

use anyhow::Result;
use clap::Parser;
use strictly_gomoku::{Cli, Command, GameServer, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config, port, host } => {
            let config = ServerConfig::load(&config)?.with_overrides(host, port);
            run_server(config).await
        }
    }
}

/// Run the WebSocket game coordinator
async fn run_server(config: ServerConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .init();

    info!(host = %config.host(), port = *config.port(), "Starting Strictly Gomoku coordinator");

    let server = GameServer::new();
    strictly_gomoku::serve(&config, server).await
}
