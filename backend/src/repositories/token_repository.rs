//! Database repository for bearer token operations.
//!
//! Provides insert, lookup, revocation and expiry purge for issued tokens.
//! Every read applies the expiry filter in SQL so an expired row is never
//! returned, whether or not the purge job has already removed it.

use crate::database::models::{BearerToken, CreateBearerToken};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Repository for bearer token database operations.
pub struct TokenRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> TokenRepository<'a> {
    /// Creates a new TokenRepository instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Stores a freshly issued token.
    ///
    /// # Arguments
    /// * `token` - CreateBearerToken DTO with the generated id, owner and expiry
    /// * `now` - Issuance time, recorded as `created_at`
    pub async fn create_token(
        &self,
        token: CreateBearerToken,
        now: DateTime<Utc>,
    ) -> Result<BearerToken> {
        let token = sqlx::query_as::<_, BearerToken>(
            r#"
            INSERT INTO bearer_tokens (id, user_id, expires_at, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, user_id, expires_at, created_at
            "#,
        )
        .bind(token.id)
        .bind(token.user_id)
        .bind(token.expires_at.timestamp_millis())
        .bind(now.timestamp_millis())
        .fetch_one(self.pool)
        .await?;

        Ok(token)
    }

    /// Retrieves a token only if it has not expired at `now`.
    ///
    /// # Returns
    /// `Some(BearerToken)` if found and `expires_at` is strictly after `now`, `None` otherwise
    pub async fn get_active_token(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<BearerToken>> {
        let token = sqlx::query_as::<_, BearerToken>(
            r#"
            SELECT id, user_id, expires_at, created_at
            FROM bearer_tokens
            WHERE id = ? AND expires_at > ?
            "#,
        )
        .bind(id)
        .bind(now.timestamp_millis())
        .fetch_optional(self.pool)
        .await?;

        Ok(token)
    }

    /// Deletes the token matching both the owner and the id.
    ///
    /// # Returns
    /// Number of rows removed (0 or 1)
    pub async fn delete_token(&self, user_id: &str, id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM bearer_tokens WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes every token whose expiry is at or before `now`.
    ///
    /// # Returns
    /// Number of rows removed
    pub async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM bearer_tokens WHERE expires_at <= ?")
            .bind(now.timestamp_millis())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
