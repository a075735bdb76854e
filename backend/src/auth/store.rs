//! Bearer token persistence.
//!
//! `TokenStore` is the contract the middleware and the lifecycle endpoints
//! depend on. `SqliteTokenStore` implements it over `TokenRepository`, bounding
//! every call with an explicit deadline so a stalled datastore surfaces as a
//! storage error instead of hanging the request.

use crate::database::models::CreateBearerToken;
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::token_repository::TokenRepository;
use crate::utils::deadline::with_deadline;
use crate::utils::generate_random_string::generate_random_string;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::future::Future;
use std::time::Duration;

/// Length of generated token ids.
pub const TOKEN_LENGTH: usize = 40;

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persists a new token for `user_id` expiring after `lifetime` and returns its id.
    async fn issue(&self, user_id: &str, lifetime: Duration) -> ServiceResult<String>;

    /// Returns the owner of `token` if it exists and has not expired.
    async fn lookup(&self, token: &str) -> ServiceResult<Option<String>>;

    /// Deletes `token` if it belongs to `user_id`. Succeeds when nothing matches.
    async fn revoke(&self, user_id: &str, token: &str) -> ServiceResult<()>;

    /// Removes expired tokens and returns how many were deleted.
    async fn purge_expired(&self) -> ServiceResult<u64>;
}

/// Token store backed by the `bearer_tokens` table.
#[derive(Clone)]
pub struct SqliteTokenStore {
    pool: SqlitePool,
    timeout: Duration,
}

impl SqliteTokenStore {
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn with_deadline<T, F>(&self, operation: &str, fut: F) -> ServiceResult<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        with_deadline(self.timeout, &format!("token store {}", operation), fut).await
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn issue(&self, user_id: &str, lifetime: Duration) -> ServiceResult<String> {
        let now = Utc::now();
        // Configured lifetimes are checked at startup; this only guards other callers.
        let expires_at = chrono::Duration::from_std(lifetime)
            .ok()
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                ServiceError::storage(format!(
                    "token lifetime of {}s is out of range",
                    lifetime.as_secs()
                ))
            })?;

        let token = CreateBearerToken {
            id: generate_random_string(TOKEN_LENGTH),
            user_id: user_id.to_string(),
            expires_at,
        };

        let repo = TokenRepository::new(&self.pool);
        let created = self
            .with_deadline("issue", repo.create_token(token, now))
            .await?;
        Ok(created.id)
    }

    async fn lookup(&self, token: &str) -> ServiceResult<Option<String>> {
        let repo = TokenRepository::new(&self.pool);
        let now = Utc::now();
        let found = self
            .with_deadline("lookup", repo.get_active_token(token, now))
            .await?;
        Ok(found.filter(|t| !t.is_expired_at(now)).map(|t| t.user_id))
    }

    async fn revoke(&self, user_id: &str, token: &str) -> ServiceResult<()> {
        let repo = TokenRepository::new(&self.pool);
        let removed = self
            .with_deadline("revoke", repo.delete_token(user_id, token))
            .await?;
        if removed == 0 {
            tracing::debug!(user_id, "revoke matched no token");
        }
        Ok(())
    }

    async fn purge_expired(&self) -> ServiceResult<u64> {
        let repo = TokenRepository::new(&self.pool);
        self.with_deadline("purge", repo.delete_expired_tokens(Utc::now()))
            .await
    }
}
