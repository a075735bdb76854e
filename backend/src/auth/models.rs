//! Data structures for authentication-related entities.
//!
//! This module defines the login payload and its sanitizing rules, the
//! responses of the token lifecycle endpoints, and the per-request identity
//! produced by the bearer middleware.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Login request payload, after sanitizing the untyped body.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl LoginRequest {
    /// Builds a request from an arbitrary JSON body.
    ///
    /// Strings are trimmed, numbers are rendered as strings and anything else
    /// (missing, null, objects, arrays, booleans) becomes an empty string, so a
    /// hostile body can only ever fail validation.
    pub fn from_value(body: &Value) -> Self {
        Self {
            username: sanitize_string(body.get("username")),
            password: sanitize_string(body.get("password")),
        }
    }
}

fn sanitize_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Login response carrying the freshly issued bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub bearer: String,
}

/// The canonical user record as seen by the API layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
}

/// Identity decision for a single request under the API prefix.
///
/// Produced by the bearer middleware and read by handlers. `user` is set only
/// when a presented bearer token resolved to a live user; `bearer` holds that
/// token so logout can revoke exactly it.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub user: Option<AuthUser>,
    pub bearer: Option<String>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn bearer(user: AuthUser, token: String) -> Self {
        Self {
            user: Some(user),
            bearer: Some(token),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}
