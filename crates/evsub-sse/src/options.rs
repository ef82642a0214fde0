//! Per-connection options.
//!
//! The hook passes these through untouched; only this adapter reads them.

use evsub_core::TransportError;
use reqwest::header::{ACCEPT, CACHE_CONTROL, HeaderMap, HeaderName, HeaderValue};

/// Header carrying the id to resume from.
const LAST_EVENT_ID: &str = "last-event-id";

/// Options for one SSE connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseTransportOptions {
    headers: Vec<(String, String)>,
    last_event_id: Option<String>,
}

impl SseTransportOptions {
    /// Options with no extra headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a request header. Repeated names are all sent.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Send `Last-Event-ID` on connect.
    #[must_use]
    pub fn with_last_event_id(mut self, id: impl Into<String>) -> Self {
        self.last_event_id = Some(id.into());
        self
    }

    /// Extra headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The id sent as `Last-Event-ID`, if any.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }
}

/// Build the request headers for a connection.
///
/// The SSE `Accept` and `Cache-Control` headers are always present; caller
/// headers are appended after them.
pub(crate) fn request_headers(
    options: Option<&SseTransportOptions>,
) -> Result<HeaderMap, TransportError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    let Some(options) = options else {
        return Ok(headers);
    };

    for (name, value) in &options.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| TransportError::InvalidOptions(format!("header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            TransportError::InvalidOptions(format!("header '{}' value: {e}", name.as_str()))
        })?;
        headers.append(name, value);
    }

    if let Some(id) = &options.last_event_id {
        let value = HeaderValue::from_str(id)
            .map_err(|e| TransportError::InvalidOptions(format!("last event id: {e}")))?;
        headers.insert(HeaderName::from_static(LAST_EVENT_ID), value);
    }

    Ok(headers)
}
