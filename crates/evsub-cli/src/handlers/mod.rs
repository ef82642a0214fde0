//! Command handlers.
//!
//! Handlers follow the pattern `pub async fn execute(config: &CliConfig, ...)`:
//! build what they need from the config, drive it, format output for the
//! terminal.

pub mod watch;
