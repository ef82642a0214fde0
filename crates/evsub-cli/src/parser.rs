//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Watch the latest event of a server-sent event stream.
#[derive(Parser)]
#[command(name = "evsub")]
#[command(about = "Watch the latest event of a server-sent event stream")]
#[command(version)]
pub struct Cli {
    /// Base URL that relative locators are resolved against
    #[arg(long = "base-url", env = "EVSUB_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// TCP connect timeout in seconds
    #[arg(
        long = "connect-timeout-secs",
        env = "EVSUB_CONNECT_TIMEOUT_SECS",
        default_value_t = 10,
        global = true
    )]
    pub connect_timeout_secs: u64,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}
