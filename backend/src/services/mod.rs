//! Module for core business logic services.
//!
//! The user service backs credential checks and token owner resolution; the
//! token purge job runs in the background for the lifetime of the server.

pub mod token_purge;
pub mod user_service;
