//! Error handling utilities for API responses.
//!
//! Converts service-layer errors into HTTP responses. Bodies are deliberately
//! small and never carry internal detail:
//! - `400` / `401` / `409`: `{"error": <message>}`
//! - `403`: `{"forbidden": "forbidden"}`
//! - `500`: `{"error": "error"}`, with the cause logged server-side
//!
//! Every `401` carries a `WWW-Authenticate: Bearer` challenge (RFC 6750);
//! rejected tokens add `error="invalid_token"`.

use crate::auth::middleware::INVALID_TOKEN_MESSAGE;
use crate::errors::ServiceError;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use serde_json::json;

const BEARER_CHALLENGE: &str = r#"Bearer realm="api""#;
const INVALID_TOKEN_CHALLENGE: &str = r#"Bearer realm="api", error="invalid_token""#;

/// Error type returned by handlers.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        service_error_to_http(self.0)
    }
}

/// Converts ServiceError to appropriate HTTP response with standard format
pub fn service_error_to_http(error: ServiceError) -> Response {
    match error {
        ServiceError::Validation { message } => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
        }
        ServiceError::Authentication { message } => {
            let challenge = if message == INVALID_TOKEN_MESSAGE {
                INVALID_TOKEN_CHALLENGE
            } else {
                BEARER_CHALLENGE
            };
            (
                StatusCode::UNAUTHORIZED,
                [(WWW_AUTHENTICATE, HeaderValue::from_static(challenge))],
                Json(json!({ "error": message })),
            )
                .into_response()
        }
        ServiceError::PermissionDenied { message } => {
            tracing::debug!("Permission denied: {}", message);
            (
                StatusCode::FORBIDDEN,
                Json(json!({ "forbidden": "forbidden" })),
            )
                .into_response()
        }
        ServiceError::AlreadyExists { entity, identifier } => (
            StatusCode::CONFLICT,
            Json(json!({ "error": format!("{} '{}' already exists", entity, identifier) })),
        )
            .into_response(),
        ServiceError::Storage { source } => {
            tracing::error!("Storage error: {:#}", source);
            internal_error()
        }
        ServiceError::Dependency { message } => {
            tracing::error!("Dependency error: {}", message);
            internal_error()
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "error" })),
    )
        .into_response()
}
