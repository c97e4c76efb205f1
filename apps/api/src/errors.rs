use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::tenant::TenantError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Tenant error: {0}")]
    Tenant(#[from] TenantError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Tenant(TenantError::NoActiveTenant) => (
                StatusCode::CONFLICT,
                "NO_ACTIVE_TENANT",
                "No tenant selected".to_string(),
            ),
            AppError::Tenant(TenantError::InvalidIdentifier(id)) => (
                StatusCode::BAD_REQUEST,
                "INVALID_TENANT",
                format!("Invalid tenant identifier '{id}'"),
            ),
            AppError::Tenant(e) => {
                tracing::error!("Tenant backend error: {e}");
                (StatusCode::BAD_GATEWAY, "TENANT_ERROR", e.to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
