#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

// Dev-dependencies used only by the integration tests.
#[cfg(test)]
use axum as _;
#[cfg(test)]
use tokio_stream as _;

mod config;
mod error;
mod locator;
mod options;
mod stream;
mod transport;

pub use config::SseClientConfig;
pub use error::{SseError, SseResult};
pub use options::SseTransportOptions;
pub use transport::SseTransport;
