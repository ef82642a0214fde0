//! In-memory transport for tests.
//!
//! `FakeTransport` records every port call and lets a test push events into
//! open connections synchronously, so hook behavior can be asserted without
//! a network or a runtime.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use crate::ports::{
    ConnectionId, EventListener, ListenerId, ListenerRegistry, StreamEvent, StreamTransport,
    TransportError,
};

/// Options accepted by [`FakeTransport`].
pub type FakeOptions = BTreeMap<String, String>;

/// A recorded `open` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRecord {
    /// Id handed back to the caller.
    pub connection: ConnectionId,
    /// Locator as passed in.
    pub locator: String,
    /// Copy of the options as passed in.
    pub options: Option<FakeOptions>,
}

/// A recorded `remove_listener` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedListener {
    /// Connection the listener belonged to.
    pub connection: ConnectionId,
    /// Event type it was removed from.
    pub event_type: String,
    /// The listener id.
    pub listener: ListenerId,
}

#[derive(Default)]
struct FakeState {
    next_id: u64,
    connections: HashMap<ConnectionId, Arc<ListenerRegistry>>,
    opened: Vec<OpenRecord>,
    closed: Vec<ConnectionId>,
    removed: Vec<RemovedListener>,
    fail_next_open: Option<TransportError>,
    fail_next_listen: Option<TransportError>,
}

/// Transport double that keeps everything in memory.
#[derive(Default)]
pub struct FakeTransport {
    state: Mutex<FakeState>,
}

impl FakeTransport {
    /// Create an empty fake.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next `open` call fail with `error`.
    pub fn fail_next_open(&self, error: TransportError) {
        self.lock().fail_next_open = Some(error);
    }

    /// Make the next `add_listener` call fail with `error`.
    pub fn fail_next_listen(&self, error: TransportError) {
        self.lock().fail_next_listen = Some(error);
    }

    /// Deliver an event on `connection`.
    ///
    /// Returns the number of listeners reached. Closed or unknown connections
    /// reach nobody.
    pub fn emit(&self, connection: ConnectionId, event: &StreamEvent) -> usize {
        let registry = self.lock().connections.get(&connection).cloned();
        registry.map_or(0, |registry| registry.dispatch(event))
    }

    /// Deliver `data` as event `event_type` on the most recently opened
    /// connection, if it is still open.
    pub fn emit_latest(&self, event_type: &str, data: &str) -> usize {
        self.last_connection()
            .map_or(0, |conn| self.emit(conn, &StreamEvent::new(event_type, data)))
    }

    /// Listeners currently registered on `connection` for `event_type`.
    ///
    /// A test can hold on to these to simulate a delivery that was already
    /// in flight when the connection was closed.
    pub fn listeners(&self, connection: ConnectionId, event_type: &str) -> Vec<EventListener> {
        self.lock()
            .connections
            .get(&connection)
            .map(|registry| registry.snapshot(event_type))
            .unwrap_or_default()
    }

    /// Number of listeners on `connection` for `event_type`.
    pub fn listener_count(&self, connection: ConnectionId, event_type: &str) -> usize {
        self.lock()
            .connections
            .get(&connection)
            .map_or(0, |registry| registry.count(event_type))
    }

    /// Every `open` call so far.
    pub fn opened(&self) -> Vec<OpenRecord> {
        self.lock().opened.clone()
    }

    /// Every `close` call so far, including repeats.
    pub fn closed(&self) -> Vec<ConnectionId> {
        self.lock().closed.clone()
    }

    /// Every `remove_listener` call so far.
    pub fn removed_listeners(&self) -> Vec<RemovedListener> {
        self.lock().removed.clone()
    }

    /// Connections that are open right now.
    pub fn open_connections(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<_> = self.lock().connections.keys().copied().collect();
        ids.sort();
        ids
    }

    /// The most recently opened connection, if still open.
    pub fn last_connection(&self) -> Option<ConnectionId> {
        let state = self.lock();
        state
            .opened
            .last()
            .map(|record| record.connection)
            .filter(|conn| state.connections.contains_key(conn))
    }
}

impl StreamTransport for FakeTransport {
    type Options = FakeOptions;

    fn open(
        &self,
        locator: &str,
        options: Option<&Self::Options>,
    ) -> Result<ConnectionId, TransportError> {
        let mut state = self.lock();
        if let Some(error) = state.fail_next_open.take() {
            return Err(error);
        }

        state.next_id += 1;
        let connection = ConnectionId::new(state.next_id);
        state
            .connections
            .insert(connection, Arc::new(ListenerRegistry::new()));
        state.opened.push(OpenRecord {
            connection,
            locator: locator.to_string(),
            options: options.cloned(),
        });
        Ok(connection)
    }

    fn add_listener(
        &self,
        connection: ConnectionId,
        event_type: &str,
        listener: EventListener,
    ) -> Result<ListenerId, TransportError> {
        let mut state = self.lock();
        if let Some(error) = state.fail_next_listen.take() {
            return Err(error);
        }

        let registry = state
            .connections
            .get(&connection)
            .ok_or(TransportError::UnknownConnection(connection))?;
        Ok(registry.add(event_type, listener))
    }

    fn remove_listener(&self, connection: ConnectionId, event_type: &str, listener: ListenerId) {
        let mut state = self.lock();
        if let Some(registry) = state.connections.get(&connection) {
            registry.remove(event_type, listener);
        }
        state.removed.push(RemovedListener {
            connection,
            event_type: event_type.to_string(),
            listener,
        });
    }

    fn close(&self, connection: ConnectionId) {
        let mut state = self.lock();
        if let Some(registry) = state.connections.remove(&connection) {
            registry.clear();
        }
        state.closed.push(connection);
    }
}
