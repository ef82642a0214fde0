//! CLI bootstrap - the composition root.
//!
//! The only place where the SSE transport is built from command-line and
//! environment settings.

use std::sync::Arc;
use std::time::Duration;

use evsub_sse::{SseClientConfig, SseTransport, SseTransportOptions};

use crate::commands::WatchArgs;
use crate::error::CliError;
use crate::parser::Cli;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Base URL for relative locators.
    pub base_url: Option<String>,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
}

impl CliConfig {
    /// Collect the global settings from parsed arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            base_url: cli.base_url.clone(),
            connect_timeout: Duration::from_secs(cli.connect_timeout_secs),
        }
    }

    /// Client configuration for the SSE transport.
    pub fn client_config(&self) -> SseClientConfig {
        SseClientConfig::new()
            .with_optional_base_url(self.base_url.clone())
            .with_connect_timeout(self.connect_timeout)
    }

    /// Build the transport.
    pub fn build_transport(&self) -> Result<Arc<SseTransport>, CliError> {
        Ok(Arc::new(SseTransport::new(self.client_config())?))
    }
}

/// Per-connection options from `watch` flags, or `None` when no flag needs any.
pub fn transport_options(args: &WatchArgs) -> Option<SseTransportOptions> {
    if args.headers.is_empty() && args.last_event_id.is_none() {
        return None;
    }

    let mut options = args
        .headers
        .iter()
        .fold(SseTransportOptions::new(), |options, (name, value)| {
            options.with_header(name.clone(), value.clone())
        });
    if let Some(id) = &args.last_event_id {
        options = options.with_last_event_id(id.clone());
    }
    Some(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Commands;
    use clap::Parser;

    fn watch_args(argv: &[&str]) -> WatchArgs {
        let Commands::Watch(args) = Cli::parse_from(argv).command;
        args
    }

    #[test]
    fn test_config_from_cli() {
        let cli = Cli::parse_from([
            "evsub",
            "--base-url",
            "http://127.0.0.1:9",
            "--connect-timeout-secs",
            "4",
            "watch",
            "/s",
        ]);
        let config = CliConfig::from_cli(&cli);
        assert_eq!(config.base_url.as_deref(), Some("http://127.0.0.1:9"));
        assert_eq!(config.connect_timeout, Duration::from_secs(4));
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let config = CliConfig {
            base_url: Some("not a url".to_string()),
            connect_timeout: Duration::from_secs(1),
        };
        let err = config.build_transport().unwrap_err();
        assert_eq!(err.exit_code(), 78);
    }

    #[test]
    fn test_no_options_without_flags() {
        assert!(transport_options(&watch_args(&["evsub", "watch", "/s"])).is_none());
    }

    #[test]
    fn test_options_from_flags() {
        let options = transport_options(&watch_args(&[
            "evsub",
            "watch",
            "/s",
            "-H",
            "x-a:1",
            "--last-event-id",
            "5",
        ]))
        .unwrap();
        assert_eq!(options.headers(), &[("x-a".to_string(), "1".to_string())]);
        assert_eq!(options.last_event_id(), Some("5"));
    }
}
