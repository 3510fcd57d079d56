// ABOUTME: Handlers for /setup, /setup/auth and /setup/complete, dispatched by the setup gate.
// ABOUTME: Verifies the setup secret, serves the wizard pages, and runs the setup commit.

use axum::Json;
use axum::body::Body;
use axum::http::{Method, Request, header};
use axum::response::{IntoResponse, Response};
use bootgate_core::SetupRequest;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::gate::GateState;
use crate::pages::{SetupAuthPage, SetupWizardPage};

/// Largest request body the setup endpoints will buffer.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

async fn read_json<T: DeserializeOwned>(req: Request<Body>) -> Result<T, ApiError> {
    let bytes = axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|_| ApiError::BadRequest)?;
    serde_json::from_slice(&bytes).map_err(|_| ApiError::BadRequest)
}

/// POST /setup/auth - Exchange the setup secret for a session cookie.
pub async fn setup_auth(state: &AppState, req: Request<Body>) -> Result<Response, ApiError> {
    if *req.method() != Method::POST {
        return Err(ApiError::MethodNotAllowed { allow: "POST" });
    }

    let body: Value = read_json(req).await?;

    let Some(cookie) = state.gate.session_cookie() else {
        return Ok(Json(json!({ "ok": true })).into_response());
    };

    let supplied = body.get("password").and_then(Value::as_str).unwrap_or_default();
    if !state.gate.check_secret(supplied) {
        tracing::warn!("setup auth rejected");
        return Err(ApiError::unauthorized("Invalid setup password"));
    }

    tracing::info!("setup auth accepted");
    Ok(([(header::SET_COOKIE, cookie)], Json(json!({ "ok": true }))).into_response())
}

/// GET /setup - The secret-entry page while locked, the wizard otherwise.
pub fn setup_page(method: &Method, gate_state: GateState) -> Result<Response, ApiError> {
    if *method != Method::GET {
        return Err(ApiError::MethodNotAllowed { allow: "GET" });
    }

    let page = match gate_state {
        GateState::Locked => SetupAuthPage::default().into_response(),
        _ => SetupWizardPage::default().into_response(),
    };
    Ok(([(header::CACHE_CONTROL, "no-store")], page).into_response())
}

/// POST /setup/complete - Validate the wizard submission, commit it, and schedule a restart.
pub async fn setup_complete(
    state: &AppState,
    gate_state: GateState,
    req: Request<Body>,
) -> Result<Response, ApiError> {
    if *req.method() != Method::POST {
        return Err(ApiError::MethodNotAllowed { allow: "POST" });
    }
    if gate_state == GateState::Locked {
        return Err(ApiError::unauthorized("Not authenticated"));
    }

    let request: SetupRequest = read_json(req).await?;
    let mut setup = request.validate()?;
    let generated_token = setup.ensure_gateway_token();

    let receipt = state.committer.commit(&setup).await.map_err(|e| {
        tracing::error!("setup commit failed: {}", e);
        e
    })?;

    tracing::info!(profile = %receipt.profile_id, "setup completed, restart scheduled");
    state.publish_config(receipt.config).await;
    state.schedule_restart().await;

    let mut body = json!({ "ok": true });
    if let Some(token) = generated_token {
        body["token"] = Value::String(token);
    }
    Ok(Json(body).into_response())
}
