use crate::error::{AppError, AppResult};
use crate::storage::events::{count_hits, count_unique};
use crate::storage::sqlite::with_conn;
use crate::types::{HealthResponse, StatsParams, StatsResponse};
use axum::extract::{RawQuery, State};
use axum::Json;
use deadpool_sqlite::Pool;
use rusqlite::Connection;
use std::sync::Arc;

pub const DAY_SECS: i64 = 86_400;
pub const MONTH_SECS: i64 = 30 * DAY_SECS;

pub struct QueryState {
    pub pool: Pool,
}

/// Log a failed statistic and report it as zero.
fn or_zero(result: rusqlite::Result<i64>, stat: &'static str, property: &str) -> i64 {
    result.unwrap_or_else(|e| {
        tracing::warn!(stat, property = %property, error = %e, "stat query failed, reporting 0");
        0
    })
}

/// Compute both windows for `property` relative to `now` (seconds).
///
/// Each count is independent; one failing query does not affect the others.
/// Call it inside a transaction (see [`snapshot_stats`]) so all four counts
/// see the same rows.
pub fn window_stats(conn: &Connection, property: &str, now: i64) -> StatsResponse {
    let month_since = now - MONTH_SECS;
    let day_since = now - DAY_SECS;

    StatsResponse {
        last_month_unique_hits: or_zero(
            count_unique(conn, property, month_since),
            "last_month_unique_hits",
            property,
        ),
        last_day_unique_hits: or_zero(
            count_unique(conn, property, day_since),
            "last_day_unique_hits",
            property,
        ),
        last_month_hits: or_zero(
            count_hits(conn, property, month_since),
            "last_month_hits",
            property,
        ),
        last_day_hits: or_zero(
            count_hits(conn, property, day_since),
            "last_day_hits",
            property,
        ),
        ..StatsResponse::default()
    }
}

/// Run [`window_stats`] in one read transaction so concurrent inserts can't
/// make the day window count more than the month window.
pub fn snapshot_stats(
    conn: &mut Connection,
    property: &str,
    now: i64,
) -> rusqlite::Result<StatsResponse> {
    let tx = conn.transaction()?;
    let stats = window_stats(&tx, property, now);
    tx.commit()?;
    Ok(stats)
}

/// GET /stats?property=<name> - Hit and unique-visitor counts for the last day and month.
pub async fn stats(
    State(state): State<Arc<QueryState>>,
    RawQuery(query): RawQuery,
) -> AppResult<Json<StatsResponse>> {
    let params = StatsParams::from_query(query.as_deref());
    let property = match params.property {
        Some(p) if !p.is_empty() => p,
        _ => return Err(AppError::Validation("property is required".to_string())),
    };

    let now = chrono::Utc::now().timestamp();
    let lookup = property.clone();
    let response = with_conn(&state.pool, move |conn| snapshot_stats(conn, &lookup, now))
        .await
        .unwrap_or_else(|e| {
            tracing::error!(property = %property, error = %e, "stats unavailable, reporting zeros");
            StatsResponse::default()
        });

    Ok(Json(response))
}

/// GET /health - Database connectivity check.
pub async fn health(State(state): State<Arc<QueryState>>) -> Json<HealthResponse> {
    let db_ok = with_conn(&state.pool, |conn| conn.query_row("SELECT 1", [], |_| Ok(())))
        .await
        .is_ok();

    Json(HealthResponse {
        status: if db_ok {
            "ok".into()
        } else {
            "degraded".into()
        },
        db_ok,
    })
}
