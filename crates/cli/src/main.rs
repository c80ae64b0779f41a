//! Entry point for the `decant` extraction CLI.

mod app;
mod cli;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

/// Initialize the tracing subscriber, with optional JSON formatting
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json_format {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    // Load .env before anything reads the environment, RUST_LOG included.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => app::run(cli.config, args).await,
        Commands::Window(args) => app::window(cli.config, args).await,
        Commands::Authorize(args) => app::authorize(cli.config, args).await,
    };

    if let Err(e) = result {
        error!("Command failed: {e:#}");
        std::process::exit(1);
    }
}
