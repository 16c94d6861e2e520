use crate::config::AppConfig;
use crate::ingest::handler::{self as ingest_handler, IngestState};
use crate::query::handler::{self as query_handler, QueryState};
use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use deadpool_sqlite::Pool;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the HTTP router.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()` so
/// ingested events without an `ip` can fall back to the peer address.
pub fn build_app(pool: Pool, config: &AppConfig) -> Router {
    let ingest_state = Arc::new(IngestState { pool: pool.clone() });
    let query_state = Arc::new(QueryState { pool });

    // Events are posted from tracked pages on any origin.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let ingest_routes = Router::new()
        .route(
            "/events",
            post(ingest_handler::record_events).fallback(ignore_method),
        )
        .layer(DefaultBodyLimit::max(config.ingest.max_payload_bytes))
        .with_state(ingest_state);

    let query_routes = Router::new()
        .route(
            "/stats",
            get(query_handler::stats).fallback(ignore_method),
        )
        .route("/health", get(query_handler::health))
        .with_state(query_state);

    Router::new()
        .merge(ingest_routes)
        .merge(query_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Unsupported methods on `/events` and `/stats` are accepted and do nothing.
async fn ignore_method() -> StatusCode {
    StatusCode::OK
}
