//! Streaming transport port.
//!
//! The hook never talks to a network directly. It drives an implementation
//! of [`StreamTransport`], which owns connection setup, framing and event
//! dispatch. Adapters (the SSE client, the in-memory fake) live elsewhere.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Opaque handle to one open streaming connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wrap a raw transport-assigned id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id, for logging.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Identity of a registered listener, used to deregister it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Wrap a raw registry-assigned id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id, for logging.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// One event delivered by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    /// Named event type (`"message"` for unnamed events).
    pub event_type: String,
    /// The event body. May be empty.
    pub data: String,
    /// Last event id reported by the stream, if any.
    pub last_event_id: Option<String>,
}

impl StreamEvent {
    /// Build an event with no id.
    pub fn new(event_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            data: data.into(),
            last_event_id: None,
        }
    }

    /// Attach the stream's last event id.
    #[must_use]
    pub fn with_last_event_id(mut self, id: impl Into<String>) -> Self {
        self.last_event_id = Some(id.into());
        self
    }
}

/// Callback invoked for each event of the type it was registered for.
pub type EventListener = Arc<dyn Fn(&StreamEvent) + Send + Sync>;

/// Failures a transport reports synchronously.
///
/// Failures that happen after `open` returns (HTTP status, broken framing,
/// the stream ending) are the adapter's business and never reach this type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The locator could not be turned into an endpoint address.
    #[error("Invalid locator '{locator}': {reason}")]
    InvalidLocator {
        /// The locator as given by the caller.
        locator: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The transport options cannot be applied to a connection.
    #[error("Invalid transport options: {0}")]
    InvalidOptions(String),

    /// The transport needs an async runtime and none is running.
    #[error("No async runtime available to drive the connection")]
    NoRuntime,

    /// The connection id is not (or no longer) known to the transport.
    #[error("Unknown connection: {0}")]
    UnknownConnection(ConnectionId),

    /// The transport refused to open the connection.
    #[error("Connection failed: {0}")]
    Connect(String),
}

/// Capability to open streaming connections and listen to named events.
///
/// `remove_listener` and `close` must be idempotent and must accept ids the
/// transport no longer knows about; release paths call them unconditionally.
pub trait StreamTransport: Send + Sync {
    /// Transport-specific connection options, forwarded verbatim by callers.
    type Options: Send + Sync + 'static;

    /// Start a connection to `locator`.
    ///
    /// Returns as soon as the connection is registered. Events may arrive on
    /// any thread at any later point until [`close`](Self::close).
    fn open(
        &self,
        locator: &str,
        options: Option<&Self::Options>,
    ) -> Result<ConnectionId, TransportError>;

    /// Register `listener` for events named `event_type` on `connection`.
    fn add_listener(
        &self,
        connection: ConnectionId,
        event_type: &str,
        listener: EventListener,
    ) -> Result<ListenerId, TransportError>;

    /// Deregister a listener. Unknown ids are ignored.
    fn remove_listener(&self, connection: ConnectionId, event_type: &str, listener: ListenerId);

    /// Close a connection. Unknown ids are ignored.
    fn close(&self, connection: ConnectionId);
}
