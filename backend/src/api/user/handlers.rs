//! Handler functions for identity endpoints.

use crate::auth::middleware::CurrentUser;
use crate::auth::models::{AuthContext, AuthUser};
use axum::Json;
use serde_json::{Value, json};

/// Returns the authenticated user; 403 without one.
#[axum::debug_handler]
pub async fn me(current: CurrentUser) -> Json<AuthUser> {
    Json(current.user)
}

/// Reports the identity of the request, `null` when anonymous.
#[axum::debug_handler]
pub async fn whoami(context: AuthContext) -> Json<Value> {
    Json(json!({ "user": context.user }))
}
