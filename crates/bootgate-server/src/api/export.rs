// ABOUTME: Handler for GET /setup/export, the authenticated backup download.
// ABOUTME: Checks the connection authorizer, then streams the bundle as a JSON attachment.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use bootgate_store::build_export;
use chrono::Utc;

use crate::app_state::SharedState;
use crate::connect_auth::{ConnectQuery, extract_connect_auth};
use crate::error::ApiError;

/// Version stamped into every export bundle.
pub const EXPORT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// GET /setup/export - Download config, credentials, and session indexes.
pub async fn export_backup(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let auth = extract_connect_auth(&headers, &ConnectQuery::from_pairs(pairs));
    let config = state.current_config().await;

    let verdict = state.authorizer.authorize(&auth, &config).await;
    if !verdict.ok {
        tracing::warn!(reason = ?verdict.reason, "export denied");
        return Err(ApiError::Unauthorized {
            error: "Unauthorized",
            reason: verdict.reason,
        });
    }

    let layout = state.layout.clone();
    let bundle = tokio::task::spawn_blocking(move || build_export(&layout, EXPORT_VERSION))
        .await
        .map_err(|e| ApiError::Export(e.to_string()))??;

    let body = serde_json::to_string_pretty(&bundle).map_err(|e| ApiError::Export(e.to_string()))?;
    let disposition = format!(
        "attachment; filename=\"bootgate-backup-{}.json\"",
        Utc::now().timestamp_millis()
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
