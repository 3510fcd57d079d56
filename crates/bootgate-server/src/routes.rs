// ABOUTME: Route definitions for the bootgate HTTP server.
// ABOUTME: Assembles status, health, and export routes behind the setup gate and request tracing.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::api;
use crate::app_state::SharedState;
use crate::gate::{EXPORT_PATH, SetupGateLayer};

/// Build the complete Axum router with the setup gate in front of every route.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(api::status::status))
        .route("/index.html", get(api::status::status))
        .route("/health", get(api::status::health))
        .route(EXPORT_PATH, get(api::export::export_backup))
        .fallback(not_found)
        .layer(SetupGateLayer::new(state.clone()))
        .layer(TraceLayer::new_for_http().make_span_with(make_span))
        .with_state(state)
}

/// Request span carrying only method and path. The query string can hold
/// `?token=` or `?password=` credentials, so the full URI stays out of logs.
fn make_span(request: &Request<Body>) -> Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
    )
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}
