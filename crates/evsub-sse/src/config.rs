//! Public configuration for the SSE transport.
//!
//! This is the per-client configuration. Per-connection settings travel in
//! [`SseTransportOptions`](crate::SseTransportOptions) instead.

use std::time::Duration;

/// Configuration for the SSE transport.
///
/// Use the builder pattern methods to customize the client configuration.
///
/// # Example
///
/// ```
/// use evsub_sse::SseClientConfig;
/// use std::time::Duration;
///
/// let config = SseClientConfig::new()
///     .with_base_url("http://localhost:8080")
///     .with_connect_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct SseClientConfig {
    /// Base URL that relative locators are resolved against
    pub(crate) base_url: Option<String>,
    /// User agent string for HTTP requests
    pub(crate) user_agent: String,
    /// TCP connect timeout
    pub(crate) connect_timeout: Duration,
}

impl Default for SseClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            user_agent: concat!("evsub-sse/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl SseClientConfig {
    /// Create a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL used to resolve relative locators such as `/stream`.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set an optional base URL.
    #[must_use]
    pub fn with_optional_base_url(mut self, url: Option<String>) -> Self {
        self.base_url = url;
        self
    }

    /// Set the user agent string for HTTP requests.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the connect timeout.
    ///
    /// Defaults to 10 seconds. There is no overall request timeout; streams
    /// stay open until closed.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}
