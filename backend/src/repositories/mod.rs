//! Database repositories, one per table.

pub mod token_repository;
pub mod user_repository;
