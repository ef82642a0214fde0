#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod ports;
pub mod subscription;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export commonly used types for convenience
pub use ports::{
    ConnectionId, EventListener, ListenerId, ListenerRegistry, StreamEvent, StreamTransport,
    TransportError,
};
pub use subscription::{
    DEFAULT_EVENT_TYPE, HookState, SubscriptionConfig, SubscriptionError, SubscriptionHook,
    UNKNOWN_EVENT_DATA, payload_from_data,
};
