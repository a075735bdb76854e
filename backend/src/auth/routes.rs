//! Defines the HTTP routes for the token lifecycle.
//!
//! Mounted under the API prefix only when bearer tokens are enabled.

use crate::auth::handlers::{login, logout};
use crate::state::AppState;
use axum::{Router, routing::post};

/// Creates the authentication router with the login and logout routes
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
}
