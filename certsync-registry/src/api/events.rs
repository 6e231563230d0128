//! Server-Sent Events endpoint
//!
//! Streams pipeline events (issuance, import commits, sync completions,
//! per-tenant notifications) to external consumers.

use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

use crate::AppState;

/// GET /events - SSE stream of all pipeline events
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    certsync_common::sse::create_event_sse_stream(&state.event_bus, "certsync-registry")
}
