//! Connection task: one HTTP request, decoded into events.
//!
//! The task runs until the connection is cancelled, the server ends the
//! stream, or something fails. It never reconnects.

use std::sync::Arc;

use eventsource_stream::Eventsource;
use evsub_core::{ConnectionId, DEFAULT_EVENT_TYPE, ListenerRegistry, StreamEvent};
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::{SseError, SseResult};

/// Why a connection task stopped without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StreamEnd {
    /// The connection was closed by the caller.
    Cancelled,
    /// The server finished the response body.
    Finished,
}

/// Drive one connection to completion, logging how it ended.
pub(crate) async fn drive_stream(
    connection: ConnectionId,
    request: reqwest::RequestBuilder,
    registry: Arc<ListenerRegistry>,
    cancel: CancellationToken,
) {
    let outcome = tokio::select! {
        () = cancel.cancelled() => Ok(StreamEnd::Cancelled),
        result = pump_events(connection, request, &registry, &cancel) => result,
    };

    match outcome {
        Ok(StreamEnd::Cancelled) => debug!(%connection, "SSE connection closed"),
        Ok(StreamEnd::Finished) => debug!(%connection, "SSE stream ended by server"),
        Err(e) => warn!(%connection, error = %e, "SSE connection failed"),
    }
}

async fn pump_events(
    connection: ConnectionId,
    request: reqwest::RequestBuilder,
    registry: &ListenerRegistry,
    cancel: &CancellationToken,
) -> SseResult<StreamEnd> {
    let response = request.send().await?;
    let url = response.url().to_string();

    let status = response.status();
    if !status.is_success() {
        return Err(SseError::Status {
            status: status.as_u16(),
            url,
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !is_event_stream(&content_type) {
        return Err(SseError::ContentType { content_type, url });
    }

    debug!(%connection, url = %url, "SSE stream open");

    let mut events = response.bytes_stream().eventsource();
    while let Some(item) = events.next().await {
        let event = item.map_err(|e| SseError::Decode(e.to_string()))?;

        // Close may have landed while this event was being decoded.
        if cancel.is_cancelled() {
            return Ok(StreamEnd::Cancelled);
        }

        let event = to_stream_event(event);
        let delivered = registry.dispatch(&event);
        trace!(
            %connection,
            event_type = %event.event_type,
            delivered,
            "SSE event dispatched"
        );
    }

    Ok(StreamEnd::Finished)
}

fn is_event_stream(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("text/event-stream"))
}

fn to_stream_event(event: eventsource_stream::Event) -> StreamEvent {
    let event_type = if event.event.is_empty() {
        DEFAULT_EVENT_TYPE.to_string()
    } else {
        event.event
    };

    StreamEvent {
        event_type,
        data: event.data,
        last_event_id: (!event.id.is_empty()).then_some(event.id),
    }
}
