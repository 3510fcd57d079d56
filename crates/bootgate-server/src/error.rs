// ABOUTME: Request-boundary error type for the setup and export endpoints.
// ABOUTME: Every failure becomes an `{ok:false,error}` JSON body (plain text for 405) with a fixed status.

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use bootgate_core::SetupValidationError;
use bootgate_store::{CommitError, ExportError};
use thiserror::Error;

/// Errors surfaced to HTTP clients by the setup gate and export handler.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Body missing, too large, or not valid JSON.
    #[error("Invalid request")]
    BadRequest,

    #[error(transparent)]
    Validation(#[from] SetupValidationError),

    #[error("{error}")]
    Unauthorized {
        error: &'static str,
        reason: Option<String>,
    },

    #[error("Method Not Allowed")]
    MethodNotAllowed { allow: &'static str },

    /// Commit failures are reported as a client-facing 400 with the cause.
    #[error(transparent)]
    Commit(#[from] CommitError),

    /// Export failures are a generic 500; the cause is only logged.
    #[error("export failed: {0}")]
    Export(String),
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        ApiError::Export(err.to_string())
    }
}

impl ApiError {
    pub fn unauthorized(error: &'static str) -> Self {
        ApiError::Unauthorized {
            error,
            reason: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest | ApiError::Validation(_) | ApiError::Commit(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::MethodNotAllowed { allow } => {
                (status, [(header::ALLOW, allow)], "Method Not Allowed").into_response()
            }
            ApiError::Unauthorized { error, reason } => {
                let mut body = serde_json::json!({ "ok": false, "error": error });
                if let Some(reason) = reason {
                    body["reason"] = serde_json::Value::String(reason);
                }
                (status, Json(body)).into_response()
            }
            ApiError::Export(detail) => {
                tracing::error!("export failed: {}", detail);
                (
                    status,
                    Json(serde_json::json!({ "ok": false, "error": "Export failed" })),
                )
                    .into_response()
            }
            other => {
                let body = serde_json::json!({ "ok": false, "error": other.to_string() });
                (status, Json(body)).into_response()
            }
        }
    }
}
