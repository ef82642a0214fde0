//! [`StreamTransport`] over HTTP Server-Sent Events.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use evsub_core::{
    ConnectionId, EventListener, ListenerId, ListenerRegistry, StreamTransport, TransportError,
};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::config::SseClientConfig;
use crate::error::{SseError, SseResult};
use crate::locator::resolve_locator;
use crate::options::{SseTransportOptions, request_headers};
use crate::stream::drive_stream;

struct ConnectionEntry {
    registry: Arc<ListenerRegistry>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
    url: Url,
}

/// SSE client that serves many independent connections.
///
/// `open` must be called from within a tokio runtime; each connection is a
/// spawned task that decodes the response body and dispatches events to the
/// listeners registered on it.
pub struct SseTransport {
    client: reqwest::Client,
    base_url: Option<Url>,
    connections: Mutex<HashMap<ConnectionId, ConnectionEntry>>,
    next_id: AtomicU64,
}

impl SseTransport {
    /// Build a transport from configuration.
    pub fn new(config: SseClientConfig) -> SseResult<Self> {
        let base_url = config
            .base_url
            .map(|url| Url::parse(&url).map_err(|source| SseError::InvalidBaseUrl { url, source }))
            .transpose()?;

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(SseError::Client)?;

        Ok(Self {
            client,
            base_url,
            connections: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        })
    }

    /// Whether `connection` is open and its task still running.
    pub fn is_active(&self, connection: ConnectionId) -> bool {
        self.lock()
            .get(&connection)
            .is_some_and(|entry| !entry.task.is_finished())
    }

    /// Number of connections that have been opened and not closed.
    pub fn connection_count(&self) -> usize {
        self.lock().len()
    }

    /// The resolved URL of an open connection.
    pub fn connection_url(&self, connection: ConnectionId) -> Option<Url> {
        self.lock().get(&connection).map(|entry| entry.url.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ConnectionId, ConnectionEntry>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl StreamTransport for SseTransport {
    type Options = SseTransportOptions;

    fn open(
        &self,
        locator: &str,
        options: Option<&Self::Options>,
    ) -> Result<ConnectionId, TransportError> {
        let url = resolve_locator(self.base_url.as_ref(), locator)?;
        let headers = request_headers(options)?;
        let runtime = Handle::try_current().map_err(|_| TransportError::NoRuntime)?;

        let connection = ConnectionId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let registry = Arc::new(ListenerRegistry::new());
        let cancel = CancellationToken::new();
        let request = self.client.get(url.clone()).headers(headers);

        let task = runtime.spawn(drive_stream(
            connection,
            request,
            registry.clone(),
            cancel.clone(),
        ));
        self.lock().insert(
            connection,
            ConnectionEntry {
                registry,
                cancel,
                task,
                url: url.clone(),
            },
        );

        debug!(%connection, url = %url, "SSE connection opened");
        Ok(connection)
    }

    fn add_listener(
        &self,
        connection: ConnectionId,
        event_type: &str,
        listener: EventListener,
    ) -> Result<ListenerId, TransportError> {
        let registry = self
            .lock()
            .get(&connection)
            .map(|entry| entry.registry.clone())
            .ok_or(TransportError::UnknownConnection(connection))?;
        Ok(registry.add(event_type, listener))
    }

    fn remove_listener(&self, connection: ConnectionId, event_type: &str, listener: ListenerId) {
        let registry = self
            .lock()
            .get(&connection)
            .map(|entry| entry.registry.clone());
        if let Some(registry) = registry {
            registry.remove(event_type, listener);
        }
    }

    fn close(&self, connection: ConnectionId) {
        let Some(entry) = self.lock().remove(&connection) else {
            return;
        };
        entry.cancel.cancel();
        entry.registry.clear();
        debug!(%connection, url = %entry.url, "SSE connection close requested");
    }
}

impl Drop for SseTransport {
    fn drop(&mut self) {
        let connections = self
            .connections
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        for (_, entry) in connections.drain() {
            entry.cancel.cancel();
            entry.registry.clear();
        }
    }
}

impl std::fmt::Debug for SseTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SseTransport")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("connections", &self.connection_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let err = SseTransport::new(SseClientConfig::new().with_base_url("::nope::")).unwrap_err();
        assert!(matches!(err, SseError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn test_open_without_runtime() {
        let transport = SseTransport::new(SseClientConfig::new()).unwrap();
        let err = transport.open("http://127.0.0.1:1/stream", None).unwrap_err();
        assert_eq!(err, TransportError::NoRuntime);
        assert_eq!(transport.connection_count(), 0);
    }

    #[test]
    fn test_open_rejects_bad_locator_before_runtime_check() {
        let transport = SseTransport::new(SseClientConfig::new()).unwrap();
        let err = transport.open("/stream", None).unwrap_err();
        assert!(matches!(err, TransportError::InvalidLocator { .. }));
    }

    #[test]
    fn test_unknown_connection_handling() {
        let transport = SseTransport::new(SseClientConfig::new()).unwrap();
        let conn = ConnectionId::new(99);
        let listener: EventListener = Arc::new(|_: &evsub_core::StreamEvent| {});

        assert_eq!(
            transport.add_listener(conn, "message", listener).unwrap_err(),
            TransportError::UnknownConnection(conn)
        );
        transport.remove_listener(conn, "message", ListenerId::new(1));
        transport.close(conn);
        transport.close(conn);
    }

    #[tokio::test]
    async fn test_open_and_close_bookkeeping() {
        let transport = SseTransport::new(
            SseClientConfig::new().with_base_url("http://127.0.0.1:1"),
        )
        .unwrap();

        let conn = transport.open("/stream", None).unwrap();
        assert_eq!(transport.connection_count(), 1);
        assert_eq!(
            transport.connection_url(conn).unwrap().as_str(),
            "http://127.0.0.1:1/stream"
        );

        let listener: EventListener = Arc::new(|_: &evsub_core::StreamEvent| {});
        transport.add_listener(conn, "message", listener).unwrap();

        transport.close(conn);
        assert_eq!(transport.connection_count(), 0);
        assert!(!transport.is_active(conn));
        assert!(transport.connection_url(conn).is_none());
    }
}
