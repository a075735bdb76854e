//! Handler functions for the token lifecycle endpoints.
//!
//! Login accepts either a JSON or a urlencoded form body. The body is read
//! untyped and sanitized into a `LoginRequest`, so unexpected shapes end up as
//! validation failures rather than extractor rejections.

use crate::api::common::{ApiError, ApiResult};
use crate::auth::middleware::CurrentUser;
use crate::auth::models::{LoginRequest, LoginResponse};
use crate::errors::ServiceError;
use crate::state::AppState;
use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, Request, State},
    http::header::CONTENT_TYPE,
};
use serde_json::{Map, Value, json};
use std::collections::HashMap;

/// Login credentials read from a JSON or form body.
pub struct LoginCredentials(pub LoginRequest);

fn is_form(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| {
            mime.trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
}

impl<S> FromRequest<S> for LoginCredentials
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let form = is_form(&request);
        let bytes = Bytes::from_request(request, state)
            .await
            .map_err(|e| ServiceError::validation(format!("Unreadable body: {}", e)))?;

        let body = if form {
            let fields: HashMap<String, String> = serde_urlencoded::from_bytes(&bytes)
                .map_err(|e| ServiceError::validation(format!("Malformed form body: {}", e)))?;
            Value::Object(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, Value::String(value)))
                    .collect::<Map<String, Value>>(),
            )
        } else if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .map_err(|e| ServiceError::validation(format!("Malformed JSON body: {}", e)))?
        };

        Ok(LoginCredentials(LoginRequest::from_value(&body)))
    }
}

/// Handle user login request
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    LoginCredentials(payload): LoginCredentials,
) -> ApiResult<Json<LoginResponse>> {
    let response = state.auth_service.login(payload).await?;
    Ok(Json(response))
}

/// Handle logout request; revokes the token that authenticated it.
#[axum::debug_handler]
pub async fn logout(State(state): State<AppState>, current: CurrentUser) -> ApiResult<Json<Value>> {
    state
        .auth_service
        .logout(&current.user, current.bearer.as_deref())
        .await?;
    Ok(Json(json!({})))
}
