//! Argument definitions for the `decant` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use decant_domain::constants::DEFAULT_WINDOW_DAYS;

#[derive(Parser)]
#[command(name = "decant")]
#[command(version, about = "Bulk extraction for rate-limited OAuth2 APIs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (default: probe for config.{json,toml}, then environment)
    #[arg(long, global = true, env = "DECANT_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract all configured resources, or a single named one
    Run(RunArgs),

    /// Extract date-windowed resources over a date range
    Window(WindowArgs),

    /// Exchange an authorization code and store the refresh token
    Authorize(AuthorizeArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Only extract the named resource
    #[arg(long)]
    pub resource: Option<String>,
}

#[derive(Args)]
pub struct WindowArgs {
    /// Only extract the named resource
    #[arg(long)]
    pub resource: Option<String>,

    /// Trailing window length in days, ending on the last complete day
    #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS, conflicts_with_all = ["from", "to"])]
    pub days: i64,

    /// Window start date (YYYY-MM-DD)
    #[arg(long, requires = "to")]
    pub from: Option<String>,

    /// Window end date (YYYY-MM-DD)
    #[arg(long, requires = "from")]
    pub to: Option<String>,
}

#[derive(Args)]
pub struct AuthorizeArgs {
    /// Authorization code obtained from the provider's consent screen
    #[arg(long)]
    pub code: String,
}
