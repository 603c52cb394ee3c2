//! Server-Sent Events (SSE) for workflow progress streaming

use axum::{
    extract::{Path, State},
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use sahayak_common::events::WorkflowEvent;
use sahayak_common::sse::{heartbeat_keep_alive, HEARTBEAT_INTERVAL};
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /events - heartbeat-only stream for connection status
pub async fn event_stream(
    State(_state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    sahayak_common::sse::create_heartbeat_sse_stream("sahayak-planner")
}

/// GET /sessions/:session_id/events - workflow events for one session
///
/// Streams:
/// - PhaseChanged
/// - ExtractionCompleted
/// - GenerationCompleted
/// - WorkflowFailed
/// - StaleResponseDiscarded
/// - SessionClosed (then the stream ends)
pub async fn session_event_stream(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    if state.sessions.get(session_id).await.is_none() {
        return Err(ApiError::NotFound(format!("Session not found: {}", session_id)));
    }

    info!(session_id = %session_id, "New SSE client connected to session events");
    let mut rx = state.event_bus.subscribe();

    let stream = async_stream::stream! {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(HEARTBEAT_INTERVAL) => {
                    debug!("SSE: Sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }

                received = rx.recv() => {
                    let event = match received {
                        Ok(event) => event,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(
                                session_id = %session_id,
                                skipped,
                                "SSE: client lagged, events dropped"
                            );
                            continue;
                        }
                        Err(RecvError::Closed) => break,
                    };

                    if event.session_id() != session_id {
                        continue;
                    }

                    let closed = matches!(event, WorkflowEvent::SessionClosed { .. });
                    let event_type = event.event_type();
                    match serde_json::to_string(&event) {
                        Ok(event_json) => {
                            debug!("SSE: Broadcasting workflow event: {}", event_type);
                            yield Ok(Event::default().event(event_type).data(event_json));
                        }
                        Err(e) => {
                            warn!("SSE: Failed to serialize event {}: {}", event_type, e);
                        }
                    }

                    if closed {
                        break;
                    }
                }
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(heartbeat_keep_alive()))
}
