//! Seams to the host's user system.
//!
//! The bearer layer never reads the user table itself: it verifies login
//! credentials and resolves token owners through these traits, which the
//! composition root wires to a concrete implementation.

use crate::auth::models::AuthUser;
use crate::errors::ServiceResult;
use async_trait::async_trait;

/// Checks a username/password pair.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Returns the user on a match, `None` on bad credentials.
    ///
    /// Errors are reserved for failures of the verifier itself.
    async fn verify_login(&self, username: &str, password: &str) -> ServiceResult<Option<AuthUser>>;
}

/// Resolves a stored user id to the current user record.
#[async_trait]
pub trait UserDeserializer: Send + Sync {
    /// Returns `None` when the user was deleted or disabled since the token was issued.
    async fn deserialize_user(&self, user_id: &str) -> ServiceResult<Option<AuthUser>>;
}
