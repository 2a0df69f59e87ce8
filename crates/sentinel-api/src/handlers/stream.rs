//! SSE notification stream endpoint.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, Sse};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use sentinel_realtime::{DeliverySession, StreamMessage};

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for the stream endpoint. The token is optional —
/// anonymous sessions receive every user's events, which operators use
/// for smoke-testing the pipeline.
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Access token; when present the stream is scoped to its user.
    pub token: Option<String>,
}

/// GET /api/alerts/stream
///
/// Sends one `connected` event, then a `notification` event per bus
/// publish matching the session's user filter, interleaved with heartbeat
/// comments. The session tears its bus subscription down when the client
/// disconnects and the response stream drops.
pub async fn notification_stream(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let user_id = match query.token.as_deref() {
        Some(token) => Some(state.auth.decode(token)?.sub),
        None => None,
    };

    info!(user_id = ?user_id, "SSE client connected");

    let session = DeliverySession::connect(
        Arc::clone(&state.bus),
        user_id,
        Duration::from_secs(state.config.realtime.heartbeat_interval_seconds),
    );

    let (tx, rx) = mpsc::channel(state.config.realtime.channel_buffer_size);
    tokio::spawn(session.run(tx));

    let stream = ReceiverStream::new(rx).map(|msg| {
        let event = match &msg {
            StreamMessage::Heartbeat => Event::default().comment("heartbeat"),
            StreamMessage::Connected { .. } => Event::default()
                .event("connected")
                .data(serde_json::to_string(&msg).unwrap_or_default()),
            StreamMessage::Notification { .. } => Event::default()
                .event("notification")
                .data(serde_json::to_string(&msg).unwrap_or_default()),
        };
        Ok(event)
    });

    Ok(Sse::new(stream))
}
