//! SSE feed of committed ledger events.

use super::AppState;
use axum::{
    extract::State,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
};
use futures::Stream;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{error, warn};

/// Handler for `GET /v1/events`.
///
/// Each SSE message carries the event name and the event as JSON. Only
/// transitions committed after the client connects are sent.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let stream = BroadcastStream::new(state.medium.subscribe()).filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(data) => Some(Ok(SseEvent::default().event(event.name()).data(data))),
            Err(e) => {
                error!("Failed to serialize ledger event: {}", e);
                None
            }
        },
        Err(e) => {
            warn!(error = %e, "Event subscriber lagged, events were dropped");
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
