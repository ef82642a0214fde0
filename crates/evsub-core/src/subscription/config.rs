//! Subscription configuration as supplied by the caller on every update.

use std::fmt;
use std::sync::Arc;

/// Event type observed when none is configured.
pub const DEFAULT_EVENT_TYPE: &str = "message";

/// Configuration for one [`SubscriptionHook`](super::SubscriptionHook) update.
///
/// Built fresh by the caller each time it re-evaluates its inputs. The hook
/// compares it against the previously applied configuration to decide whether
/// the connection must be re-established.
///
/// Transport options are held behind an `Arc` and compared by pointer, not by
/// value: handing the hook a newly allocated options value re-establishes the
/// connection even if its contents match the previous one.
///
/// # Example
///
/// ```
/// use evsub_core::SubscriptionConfig;
///
/// let config = SubscriptionConfig::<()>::new("/stream")
///     .with_event_type("ping")
///     .with_enabled(false);
///
/// assert_eq!(config.event_type(), "ping");
/// assert!(!config.enabled);
/// ```
pub struct SubscriptionConfig<O> {
    /// Endpoint locator, forwarded to the transport unvalidated.
    pub locator: String,
    /// Named event to observe. `None` means [`DEFAULT_EVENT_TYPE`].
    pub event_type: Option<String>,
    /// Opaque transport options.
    pub transport_options: Option<Arc<O>>,
    /// Whether a connection should be open.
    pub enabled: bool,
}

impl<O> SubscriptionConfig<O> {
    /// Create an enabled configuration with default event type and no options.
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            event_type: None,
            transport_options: None,
            enabled: true,
        }
    }

    /// Set the event type to observe.
    #[must_use]
    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Set the transport options.
    #[must_use]
    pub fn with_transport_options(mut self, options: Arc<O>) -> Self {
        self.transport_options = Some(options);
        self
    }

    /// Set the transport options from an optional value.
    #[must_use]
    pub fn with_optional_transport_options(mut self, options: Option<Arc<O>>) -> Self {
        self.transport_options = options;
        self
    }

    /// Enable or disable the subscription.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The effective event type.
    pub fn event_type(&self) -> &str {
        self.event_type.as_deref().unwrap_or(DEFAULT_EVENT_TYPE)
    }

    /// The dependency key used for change detection.
    pub(crate) fn dependency_key(&self) -> DependencyKey<O> {
        DependencyKey {
            locator: self.locator.clone(),
            event_type: self.event_type().to_string(),
            transport_options: self.transport_options.clone(),
            enabled: self.enabled,
        }
    }
}

impl<O> Clone for SubscriptionConfig<O> {
    fn clone(&self) -> Self {
        Self {
            locator: self.locator.clone(),
            event_type: self.event_type.clone(),
            transport_options: self.transport_options.clone(),
            enabled: self.enabled,
        }
    }
}

impl<O> fmt::Debug for SubscriptionConfig<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionConfig")
            .field("locator", &self.locator)
            .field("event_type", &self.event_type())
            .field("has_transport_options", &self.transport_options.is_some())
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Inputs that trigger a release/acquire cycle when they change.
pub(crate) struct DependencyKey<O> {
    pub(crate) locator: String,
    pub(crate) event_type: String,
    pub(crate) transport_options: Option<Arc<O>>,
    pub(crate) enabled: bool,
}

impl<O> DependencyKey<O> {
    /// Whether `other` differs in any input that forces reconfiguration.
    pub(crate) fn differs_from(&self, other: &Self) -> bool {
        let same_options = match (&self.transport_options, &other.transport_options) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };

        self.locator != other.locator
            || self.event_type != other.event_type
            || !same_options
            || self.enabled != other.enabled
    }
}
