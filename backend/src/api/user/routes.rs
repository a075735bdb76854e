//! Defines the HTTP routes for identity lookup.

use super::handlers::{me, whoami};
use crate::state::AppState;
use axum::{Router, routing::get};

pub fn user_router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/whoami", get(whoami))
}
