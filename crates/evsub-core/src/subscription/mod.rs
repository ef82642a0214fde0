//! The subscription hook and the values it works with.

mod config;
mod error;
mod hook;
mod payload;

pub use config::{DEFAULT_EVENT_TYPE, SubscriptionConfig};
pub use error::SubscriptionError;
pub use hook::{HookState, SubscriptionHook};
pub use payload::{UNKNOWN_EVENT_DATA, payload_from_data};
