//! `evsub` command-line adapter.
//!
//! Wires the SSE transport into a [`SubscriptionHook`](evsub_core::SubscriptionHook)
//! and prints the latest payload as it changes. With `--interactive`, stdin
//! lines reconfigure the running subscription.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by the binary only
use anyhow as _;
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod control;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod session;

pub use bootstrap::CliConfig;
pub use commands::{Commands, WatchArgs};
pub use control::ControlCommand;
pub use error::CliError;
pub use parser::Cli;
pub use session::{Flow, WatchSession};
