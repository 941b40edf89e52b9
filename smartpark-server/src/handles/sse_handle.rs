use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::Sse;
use axum::response::sse::{Event, KeepAlive};
use axum::routing::get;
use axum::Router;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::services::BroadcastSubscriber;

#[derive(Clone)]
pub struct SSEState {
    pub broadcast: Arc<BroadcastSubscriber>,
}

pub fn sse_router(state: SSEState) -> Router {
    Router::new().route("/events", get(sse_handler)).with_state(state)
}

/// Live notifications only. Lagging clients silently skip what they missed
/// and should re-read `/devices` for current state.
pub async fn sse_handler(State(state): State<SSEState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.broadcast.subscribe();

    let stream = BroadcastStream::new(receiver).filter_map(|result| {
        let notification = result.ok()?;

        Event::default()
            .event(notification.kind())
            .json_data(&notification)
            .ok()
            .map(Ok)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
