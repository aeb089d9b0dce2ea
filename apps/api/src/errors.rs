use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::templates::session::ReviewError;
use crate::webhook_client::WebhookError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::UnknownTemplate(id) => AppError::NotFound(format!("Template {id} not found")),
            ReviewError::SaveInFlight | ReviewError::GenerationInFlight => {
                AppError::Conflict(err.to_string())
            }
            ReviewError::Webhook(e) => AppError::Webhook(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Webhook(e) => {
                tracing::error!("Webhook error: {e}");
                match e {
                    WebhookError::Timeout(_) => {
                        (StatusCode::GATEWAY_TIMEOUT, "UPSTREAM_TIMEOUT", e.to_string())
                    }
                    WebhookError::Network { .. } => {
                        (StatusCode::BAD_GATEWAY, "UPSTREAM_UNREACHABLE", e.to_string())
                    }
                    WebhookError::CrossOrigin { .. } => {
                        (StatusCode::BAD_GATEWAY, "UPSTREAM_CORS", e.to_string())
                    }
                    WebhookError::Http { .. } | WebhookError::Decode { .. } => {
                        (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", e.to_string())
                    }
                }
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
