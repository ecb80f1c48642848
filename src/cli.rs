//! Command-line interface for strictly_gomoku.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Strictly Gomoku - real-time two-player five-in-a-row coordinator
#[derive(Parser, Debug)]
#[command(name = "strictly_gomoku")]
#[command(about = "Pairs WebSocket connections into gomoku matches", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the game coordinator
    Serve {
        /// Path to a TOML config file (optional)
        #[arg(short, long, default_value = "gomoku.toml")]
        config: PathBuf,

        /// Port to bind to (overrides config file and PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config file)
        #[arg(long)]
        host: Option<String>,
    },
}
