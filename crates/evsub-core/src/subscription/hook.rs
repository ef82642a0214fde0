//! The subscription hook: one connection, one listener, one latest payload.
//!
//! A host calls [`SubscriptionHook::subscribe`] every time it re-evaluates
//! its inputs. When the dependency key changed, the hook releases the current
//! connection and (if enabled) acquires a new one, resetting the payload.
//! Events update the payload asynchronously through a `watch` channel.
//!
//! # Stale deliveries
//!
//! Transports may still be dispatching an event when the hook closes the
//! connection. Each acquisition is tagged with a generation; the listener
//! publishes only while its generation is current, and the check happens
//! under the same lock release uses to retire it.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::ports::{ConnectionId, EventListener, ListenerId, StreamEvent, StreamTransport};

use super::config::{DependencyKey, SubscriptionConfig};
use super::error::SubscriptionError;
use super::payload::payload_from_data;

/// Connection state of a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookState {
    /// No connection is open.
    #[default]
    Disconnected,
    /// One connection is open with a listener registered.
    Connected,
}

impl HookState {
    /// Check if a connection is open.
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for HookState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}

/// Latest payload plus the generation allowed to write it.
struct PayloadSlot {
    generation: Mutex<u64>,
    latest: watch::Sender<Option<String>>,
}

impl PayloadSlot {
    fn new() -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            generation: Mutex::new(0),
            latest,
        }
    }

    /// Start a new generation and clear the payload.
    fn begin(&self) -> u64 {
        let mut generation = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        *generation += 1;
        self.latest.send_replace(None);
        *generation
    }

    /// Invalidate the current generation without touching the payload.
    fn retire(&self) {
        *self.generation.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }

    /// Publish `payload` if `generation` is still current.
    fn publish(&self, generation: u64, payload: String) -> bool {
        let current = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != generation {
            return false;
        }
        self.latest.send_replace(Some(payload));
        true
    }
}

/// The connection owned by the current acquisition.
struct ActiveConnection {
    connection: ConnectionId,
    listener: ListenerId,
    locator: String,
    event_type: String,
}

/// Binds the latest event of one stream to host-visible state.
///
/// At most one connection is open per hook. Dropping the hook releases it.
///
/// # Example
///
/// ```ignore
/// // FakeTransport needs the `test-utils` feature.
/// use std::sync::Arc;
/// use evsub_core::{SubscriptionConfig, SubscriptionHook};
/// use evsub_core::testing::FakeTransport;
///
/// let transport = Arc::new(FakeTransport::new());
/// let mut hook = SubscriptionHook::new(transport.clone());
///
/// assert_eq!(hook.subscribe(&SubscriptionConfig::new("/stream")), None);
/// transport.emit_latest("message", "hello");
/// assert_eq!(hook.latest().as_deref(), Some("hello"));
/// ```
pub struct SubscriptionHook<T: StreamTransport> {
    transport: Arc<T>,
    applied: Option<DependencyKey<T::Options>>,
    active: Option<ActiveConnection>,
    slot: Arc<PayloadSlot>,
    state: watch::Sender<HookState>,
    last_error: watch::Sender<Option<SubscriptionError>>,
}

impl<T: StreamTransport> SubscriptionHook<T> {
    /// Create a disconnected hook over `transport`.
    pub fn new(transport: Arc<T>) -> Self {
        let (state, _) = watch::channel(HookState::Disconnected);
        let (last_error, _) = watch::channel(None);
        Self {
            transport,
            applied: None,
            active: None,
            slot: Arc::new(PayloadSlot::new()),
            state,
            last_error,
        }
    }

    /// Apply `config` and return the latest payload.
    ///
    /// Runs the release/acquire cycle only when the locator, event type,
    /// options identity or enabled flag differ from the last applied
    /// configuration (or on the first call).
    pub fn subscribe(&mut self, config: &SubscriptionConfig<T::Options>) -> Option<String> {
        let key = config.dependency_key();
        let changed = self
            .applied
            .as_ref()
            .is_none_or(|previous| previous.differs_from(&key));

        if changed {
            self.release();
            if config.enabled {
                self.acquire(config);
            } else {
                debug!(locator = %config.locator, "Subscription disabled");
            }
            self.applied = Some(key);
        }

        self.latest()
    }

    /// Release the connection, as on unmount.
    ///
    /// A later [`subscribe`](Self::subscribe) starts over as if the hook were
    /// new, except that the payload is kept until that call resets it.
    pub fn teardown(&mut self) {
        self.release();
        self.applied = None;
    }

    /// The most recent payload.
    pub fn latest(&self) -> Option<String> {
        self.slot.latest.borrow().clone()
    }

    /// Receiver notified on every payload change, resets included.
    pub fn watch(&self) -> watch::Receiver<Option<String>> {
        self.slot.latest.subscribe()
    }

    /// Current connection state.
    pub fn state(&self) -> HookState {
        *self.state.borrow()
    }

    /// Receiver notified on every state change.
    pub fn watch_state(&self) -> watch::Receiver<HookState> {
        self.state.subscribe()
    }

    /// Error from the last failed acquisition, cleared by a successful one.
    pub fn last_error(&self) -> Option<SubscriptionError> {
        self.last_error.borrow().clone()
    }

    /// Receiver notified whenever the last error changes.
    pub fn errors(&self) -> watch::Receiver<Option<SubscriptionError>> {
        self.last_error.subscribe()
    }

    /// The open connection, if any.
    pub fn connection(&self) -> Option<ConnectionId> {
        self.active.as_ref().map(|active| active.connection)
    }

    /// The transport this hook drives.
    pub const fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    fn acquire(&mut self, config: &SubscriptionConfig<T::Options>) {
        let locator = config.locator.clone();
        let event_type = config.event_type().to_string();

        // Reset before the new listener exists so no event can precede it.
        let generation = self.slot.begin();

        let connection = match self
            .transport
            .open(&locator, config.transport_options.as_deref())
        {
            Ok(connection) => connection,
            Err(source) => {
                self.record_failure(SubscriptionError::Open { locator, source });
                return;
            }
        };

        let slot = Arc::clone(&self.slot);
        let listener: EventListener = Arc::new(move |event: &StreamEvent| {
            if !slot.publish(generation, payload_from_data(&event.data)) {
                trace!(generation, "Dropped event from released subscription");
            }
        });

        let listener = match self.transport.add_listener(connection, &event_type, listener) {
            Ok(listener) => listener,
            Err(source) => {
                self.transport.close(connection);
                self.record_failure(SubscriptionError::Listen {
                    locator,
                    event_type,
                    source,
                });
                return;
            }
        };

        debug!(
            %connection,
            locator = %locator,
            event_type = %event_type,
            generation,
            "Subscription connected"
        );

        self.active = Some(ActiveConnection {
            connection,
            listener,
            locator,
            event_type,
        });
        self.state.send_replace(HookState::Connected);
        self.last_error.send_replace(None);
    }

    fn release(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        self.slot.retire();
        self.transport
            .remove_listener(active.connection, &active.event_type, active.listener);
        self.transport.close(active.connection);
        self.state.send_replace(HookState::Disconnected);

        debug!(
            connection = %active.connection,
            locator = %active.locator,
            "Subscription released"
        );
    }

    fn record_failure(&self, error: SubscriptionError) {
        warn!(error = %error, "Subscription could not be established");
        self.last_error.send_replace(Some(error));
    }
}

impl<T: StreamTransport> Drop for SubscriptionHook<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: StreamTransport> fmt::Debug for SubscriptionHook<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHook")
            .field("state", &self.state())
            .field("connection", &self.connection())
            .field("latest", &self.latest())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::TransportError;
    use crate::subscription::payload::UNKNOWN_EVENT_DATA;
    use crate::testing::{FakeOptions, FakeTransport};
    use std::time::Duration;

    fn hook() -> (Arc<FakeTransport>, SubscriptionHook<FakeTransport>) {
        let transport = Arc::new(FakeTransport::new());
        let hook = SubscriptionHook::new(transport.clone());
        (transport, hook)
    }

    fn options(pairs: &[(&str, &str)]) -> Arc<FakeOptions> {
        Arc::new(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_default_message_event_sets_payload() {
        let (transport, mut hook) = hook();

        assert_eq!(hook.subscribe(&SubscriptionConfig::new("/stream")), None);

        let opened = transport.opened();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].locator, "/stream");
        assert!(opened[0].options.is_none());
        assert_eq!(transport.listener_count(opened[0].connection, "message"), 1);
        assert_eq!(hook.state(), HookState::Connected);

        transport.emit_latest("message", "hello");
        assert_eq!(hook.latest().as_deref(), Some("hello"));
    }

    #[test]
    fn test_empty_data_becomes_sentinel() {
        let (transport, mut hook) = hook();
        hook.subscribe(&SubscriptionConfig::new("/stream"));

        transport.emit_latest("message", "");
        assert_eq!(hook.latest().as_deref(), Some(UNKNOWN_EVENT_DATA));
    }

    #[test]
    fn test_payload_tracks_most_recent_event() {
        let (transport, mut hook) = hook();
        let config = SubscriptionConfig::new("/stream");
        hook.subscribe(&config);

        for data in ["one", "two", "three"] {
            transport.emit_latest("message", data);
        }
        assert_eq!(hook.subscribe(&config).as_deref(), Some("three"));
    }

    #[test]
    fn test_other_event_types_are_ignored() {
        let (transport, mut hook) = hook();
        hook.subscribe(&SubscriptionConfig::new("/stream").with_event_type("ping"));

        assert_eq!(transport.emit_latest("message", "hello"), 0);
        assert_eq!(hook.latest(), None);

        transport.emit_latest("ping", "pong");
        transport.emit_latest("message", "ignored");
        assert_eq!(hook.latest().as_deref(), Some("pong"));
    }

    #[test]
    fn test_identical_config_does_not_reconnect() {
        let (transport, mut hook) = hook();
        let shared = options(&[("mode", "include")]);
        let config = SubscriptionConfig::new("/stream").with_transport_options(shared.clone());

        hook.subscribe(&config);
        transport.emit_latest("message", "kept");

        let again = SubscriptionConfig::new("/stream").with_transport_options(shared);
        assert_eq!(hook.subscribe(&again).as_deref(), Some("kept"));
        assert_eq!(transport.opened().len(), 1);
        assert!(transport.closed().is_empty());
    }

    #[test]
    fn test_new_options_identity_reconnects_and_resets() {
        let (transport, mut hook) = hook();
        hook.subscribe(
            &SubscriptionConfig::new("/stream").with_transport_options(options(&[("k", "v")])),
        );
        transport.emit_latest("message", "before");

        let payload = hook.subscribe(
            &SubscriptionConfig::new("/stream").with_transport_options(options(&[("k", "v")])),
        );

        assert_eq!(payload, None);
        assert_eq!(transport.opened().len(), 2);
        assert_eq!(transport.closed().len(), 1);
        assert_eq!(
            transport.opened()[1].options.as_ref().and_then(|o| o.get("k")),
            Some(&"v".to_string())
        );
    }

    #[test]
    fn test_locator_change_resets_and_reconnects() {
        let (transport, mut hook) = hook();
        hook.subscribe(&SubscriptionConfig::new("/a"));
        let old = transport.last_connection().unwrap();
        let old_listeners = transport.listeners(old, "message");
        transport.emit_latest("message", "from-a");

        assert_eq!(hook.subscribe(&SubscriptionConfig::new("/b")), None);

        assert_eq!(transport.closed(), vec![old]);
        let removed = transport.removed_listeners();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].connection, old);
        assert_eq!(removed[0].event_type, "message");

        let opened = transport.opened();
        assert_eq!(opened.len(), 2);
        assert_eq!(opened[1].locator, "/b");
        assert_eq!(transport.open_connections(), vec![opened[1].connection]);

        // A delivery still in flight on the old connection is dropped.
        for listener in &old_listeners {
            listener(&StreamEvent::new("message", "late-a"));
        }
        assert_eq!(hook.latest(), None);

        transport.emit_latest("message", "from-b");
        assert_eq!(hook.latest().as_deref(), Some("from-b"));
    }

    #[test]
    fn test_event_type_change_reconnects() {
        let (transport, mut hook) = hook();
        hook.subscribe(&SubscriptionConfig::new("/stream"));
        hook.subscribe(&SubscriptionConfig::new("/stream").with_event_type("ping"));

        assert_eq!(transport.opened().len(), 2);
        let conn = transport.last_connection().unwrap();
        assert_eq!(transport.listener_count(conn, "ping"), 1);
        assert_eq!(transport.listener_count(conn, "message"), 0);
    }

    #[test]
    fn test_initially_disabled_opens_nothing() {
        let (transport, mut hook) = hook();
        let disabled = SubscriptionConfig::new("/stream").with_enabled(false);

        assert_eq!(hook.subscribe(&disabled), None);
        assert_eq!(hook.subscribe(&disabled), None);
        assert!(transport.opened().is_empty());
        assert_eq!(hook.state(), HookState::Disconnected);

        hook.subscribe(&SubscriptionConfig::new("/stream"));
        assert_eq!(transport.opened().len(), 1);
        assert!(hook.state().is_connected());
    }

    #[test]
    fn test_disable_closes_and_ignores_in_flight_events() {
        let (transport, mut hook) = hook();
        hook.subscribe(&SubscriptionConfig::new("/stream"));
        let conn = transport.last_connection().unwrap();
        let in_flight = transport.listeners(conn, "message");
        transport.emit_latest("message", "last");

        let payload = hook.subscribe(&SubscriptionConfig::new("/stream").with_enabled(false));

        assert_eq!(payload.as_deref(), Some("last"));
        assert_eq!(transport.closed(), vec![conn]);
        assert_eq!(transport.removed_listeners().len(), 1);
        assert_eq!(hook.state(), HookState::Disconnected);
        assert_eq!(hook.connection(), None);

        for listener in &in_flight {
            listener(&StreamEvent::new("message", "after-close"));
        }
        assert_eq!(hook.latest().as_deref(), Some("last"));
    }

    #[test]
    fn test_reenable_resets_payload() {
        let (transport, mut hook) = hook();
        hook.subscribe(&SubscriptionConfig::new("/stream"));
        transport.emit_latest("message", "old");
        hook.subscribe(&SubscriptionConfig::new("/stream").with_enabled(false));

        assert_eq!(hook.subscribe(&SubscriptionConfig::new("/stream")), None);
        assert_eq!(transport.opened().len(), 2);
    }

    #[test]
    fn test_drop_releases_connection() {
        let (transport, mut hook) = hook();
        hook.subscribe(&SubscriptionConfig::new("/stream"));
        let conn = transport.last_connection().unwrap();

        drop(hook);

        assert_eq!(transport.closed(), vec![conn]);
        assert_eq!(transport.removed_listeners().len(), 1);
        assert!(transport.open_connections().is_empty());
    }

    #[test]
    fn test_teardown_then_subscribe_reconnects() {
        let (transport, mut hook) = hook();
        let config = SubscriptionConfig::new("/stream");
        hook.subscribe(&config);

        hook.teardown();
        hook.teardown();
        assert_eq!(transport.closed().len(), 1);
        assert_eq!(hook.state(), HookState::Disconnected);

        hook.subscribe(&config);
        assert_eq!(transport.opened().len(), 2);
    }

    #[test]
    fn test_teardown_while_disconnected_is_noop() {
        let (transport, mut hook) = hook();
        hook.subscribe(&SubscriptionConfig::new("/stream").with_enabled(false));
        hook.teardown();
        drop(hook);

        assert!(transport.closed().is_empty());
        assert!(transport.removed_listeners().is_empty());
    }

    #[test]
    fn test_open_failure_is_reported() {
        let (transport, mut hook) = hook();
        transport.fail_next_open(TransportError::NoRuntime);

        assert_eq!(hook.subscribe(&SubscriptionConfig::new("/stream")), None);
        assert_eq!(hook.state(), HookState::Disconnected);
        assert_eq!(
            hook.last_error(),
            Some(SubscriptionError::Open {
                locator: "/stream".to_string(),
                source: TransportError::NoRuntime,
            })
        );

        hook.subscribe(&SubscriptionConfig::new("/other"));
        assert!(hook.state().is_connected());
        assert_eq!(hook.last_error(), None);
    }

    #[test]
    fn test_listen_failure_closes_connection() {
        let (transport, mut hook) = hook();
        transport.fail_next_listen(TransportError::Connect("refused".to_string()));

        hook.subscribe(&SubscriptionConfig::new("/stream").with_event_type("ping"));

        let opened = transport.opened();
        assert_eq!(transport.closed(), vec![opened[0].connection]);
        assert!(matches!(
            hook.last_error(),
            Some(SubscriptionError::Listen { ref event_type, .. }) if event_type == "ping"
        ));
        assert_eq!(hook.connection(), None);
    }

    #[test]
    fn test_failed_open_still_resets_payload() {
        let (transport, mut hook) = hook();
        hook.subscribe(&SubscriptionConfig::new("/a"));
        transport.emit_latest("message", "stale");

        transport.fail_next_open(TransportError::Connect("down".to_string()));
        assert_eq!(hook.subscribe(&SubscriptionConfig::new("/b")), None);
    }

    #[tokio::test]
    async fn test_watch_receiver_sees_updates_from_other_threads() {
        let (transport, mut hook) = hook();
        let mut rx = hook.watch();
        hook.subscribe(&SubscriptionConfig::new("/stream"));
        rx.borrow_and_update();

        let emitter = transport.clone();
        std::thread::spawn(move || {
            emitter.emit_latest("message", "threaded");
        });

        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("no update within timeout")
            .unwrap();
        assert_eq!(rx.borrow().as_deref(), Some("threaded"));
    }

    #[tokio::test]
    async fn test_state_watch_follows_lifecycle() {
        let (_transport, mut hook) = hook();
        let mut states = hook.watch_state();

        hook.subscribe(&SubscriptionConfig::new("/stream"));
        states.changed().await.unwrap();
        assert_eq!(*states.borrow_and_update(), HookState::Connected);

        hook.teardown();
        states.changed().await.unwrap();
        assert_eq!(*states.borrow_and_update(), HookState::Disconnected);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(HookState::Connected.to_string(), "Connected");
        assert_eq!(HookState::default().to_string(), "Disconnected");
    }
}
