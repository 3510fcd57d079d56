// ABOUTME: Operational status and health endpoints served once the gate lets requests through.
// ABOUTME: Reports whether setup has completed without exposing any configuration values.

use axum::Json;
use axum::extract::State;
use bootgate_core::is_configured;
use serde_json::{Value, json};

use crate::app_state::SharedState;

/// GET / and /index.html - Gateway status.
pub async fn status(State(state): State<SharedState>) -> Json<Value> {
    let config = state.current_config().await;
    Json(json!({
        "ok": true,
        "configured": is_configured(&config),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Health check handler. Returns 200 OK with a simple JSON body.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
