//! Bearer token authentication for the API.
//!
//! Token issue and revocation, the per-request authentication middleware, the
//! CSRF guard for tokenless requests, and the seams to the user system.

pub mod csrf;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
pub mod store;
