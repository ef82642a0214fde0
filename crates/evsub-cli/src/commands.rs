//! Subcommands and their arguments.

use clap::{Args, Subcommand};
use evsub_core::DEFAULT_EVENT_TYPE;

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Subscribe to a stream and print the latest payload as it changes
    Watch(WatchArgs),
}

/// Arguments of `evsub watch`.
#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Stream endpoint, absolute or relative to --base-url
    pub locator: String,

    /// Event type to listen for
    #[arg(short, long = "event", default_value = DEFAULT_EVENT_TYPE)]
    pub event: String,

    /// Extra request header as NAME:VALUE (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Send Last-Event-ID on connect
    #[arg(long)]
    pub last_event_id: Option<String>,

    /// Start without connecting (use `enable` in interactive mode)
    #[arg(long)]
    pub disabled: bool,

    /// Read control commands from stdin
    #[arg(short, long)]
    pub interactive: bool,
}

/// Parse a `NAME:VALUE` header argument.
pub fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing header name in '{raw}'"));
    }
    Ok((name.to_string(), value.trim_start().to_string()))
}
