use crate::error::{AppError, LoggedJson};
use crate::ingest::normalize::{normalize, RequestContext};
use crate::storage::events::insert_all;
use crate::storage::sqlite::with_conn;
use crate::types::{EventPayload, NewEvent};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use deadpool_sqlite::Pool;
use std::sync::Arc;

pub struct IngestState {
    pub pool: Pool,
}

/// Turn a parsed payload into rows, all stamped with the same `timestamp`.
pub fn prepare_events(payload: EventPayload, ctx: &RequestContext, timestamp: i64) -> Vec<NewEvent> {
    payload
        .into_events()
        .into_iter()
        .map(|event| normalize(event, ctx, timestamp))
        .collect()
}

/// POST /events - Record one event or a batch of events.
///
/// Fire-and-forget: the response carries no body and does not report how
/// many rows were stored. A body that does not parse is logged and dropped
/// with the same empty 200.
pub async fn record_events(
    State(state): State<Arc<IngestState>>,
    ctx: RequestContext,
    payload: Result<LoggedJson<EventPayload>, AppError>,
) -> Response {
    let payload = match payload {
        Ok(LoggedJson(payload)) => payload,
        // Already logged by the extractor.
        Err(AppError::MalformedPayload(_)) => return StatusCode::OK.into_response(),
        Err(e) => return e.into_response(),
    };

    let timestamp = chrono::Utc::now().timestamp();
    let events = prepare_events(payload, &ctx, timestamp);
    if events.is_empty() {
        return StatusCode::OK.into_response();
    }

    let submitted = events.len();
    match with_conn(&state.pool, move |conn| Ok(insert_all(conn, &events))).await {
        Ok(summary) => {
            tracing::debug!(
                submitted,
                stored = summary.stored,
                failed = summary.failed,
                "events recorded"
            );
        }
        Err(e) => {
            tracing::error!(submitted, error = %e, "events dropped, store unavailable");
        }
    }

    StatusCode::OK.into_response()
}
