//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define what the subscription hook expects from infrastructure.
//! They contain no network or runtime details.
//!
//! # Design Rules
//!
//! - No HTTP or SSE framing types in any signature
//! - Transport options are an associated type the hook never inspects
//! - Release operations (`remove_listener`, `close`) cannot fail

pub mod listeners;
pub mod transport;

pub use listeners::ListenerRegistry;
pub use transport::{
    ConnectionId, EventListener, ListenerId, StreamEvent, StreamTransport, TransportError,
};
