//! Errors surfaced by the subscription hook.

use thiserror::Error;

use crate::ports::TransportError;

/// Why the hook could not establish a subscription.
///
/// Only failures that happen while acquiring a connection are reported here.
/// The hook stays `Disconnected` after any of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    /// The transport refused to open the connection.
    #[error("Failed to open '{locator}': {source}")]
    Open {
        /// Locator the hook tried to open.
        locator: String,
        /// Underlying transport error.
        #[source]
        source: TransportError,
    },

    /// The connection opened but the listener could not be registered.
    #[error("Failed to listen for '{event_type}' on '{locator}': {source}")]
    Listen {
        /// Locator of the connection.
        locator: String,
        /// Event type the hook tried to observe.
        event_type: String,
        /// Underlying transport error.
        #[source]
        source: TransportError,
    },
}

impl SubscriptionError {
    /// The transport error behind this failure.
    pub const fn transport_error(&self) -> &TransportError {
        match self {
            Self::Open { source, .. } | Self::Listen { source, .. } => source,
        }
    }
}
