//! Internal error types for SSE connections.
//!
//! Construction errors are returned to the caller. Streaming errors are
//! logged by the connection task and never reach the hook.

use thiserror::Error;

/// Result type alias for SSE operations.
pub type SseResult<T> = Result<T, SseError>;

/// Errors related to SSE client setup and streaming.
#[derive(Debug, Error)]
pub enum SseError {
    /// The configured base URL is not a valid absolute URL.
    #[error("Invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        /// The configured value
        url: String,
        /// Parse failure
        #[source]
        source: url::ParseError,
    },

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The stream endpoint answered with a non-success status.
    #[error("Stream request failed with status {status}: {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// The endpoint did not answer with `text/event-stream`.
    #[error("Unexpected content type '{content_type}' from {url}")]
    ContentType {
        /// Content type as reported, or empty when missing
        content_type: String,
        /// The URL that was requested
        url: String,
    },

    /// Network or HTTP client error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The body could not be decoded as an event stream.
    #[error("Malformed event stream: {0}")]
    Decode(String),
}
