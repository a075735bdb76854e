//! Core business logic for the token lifecycle.

use crate::auth::identity::CredentialVerifier;
use crate::auth::models::{AuthUser, LoginRequest, LoginResponse};
use crate::auth::store::TokenStore;
use crate::errors::{ServiceError, ServiceResult};
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

/// Issues tokens on login and revokes them on logout.
pub struct AuthService {
    verifier: Arc<dyn CredentialVerifier>,
    tokens: Arc<dyn TokenStore>,
    lifetime: Duration,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(
        verifier: Arc<dyn CredentialVerifier>,
        tokens: Arc<dyn TokenStore>,
        lifetime: Duration,
    ) -> Self {
        Self {
            verifier,
            tokens,
            lifetime,
        }
    }

    /// Verifies credentials and issues a new bearer token.
    ///
    /// # Errors
    /// - `Validation` when either field is empty
    /// - `Authentication` when the credentials do not match a user
    /// - `Storage` / `Dependency` when the verifier or the store fails
    pub async fn login(&self, login_request: LoginRequest) -> ServiceResult<LoginResponse> {
        if let Err(validation_errors) = login_request.validate() {
            let error_messages: Vec<String> = validation_errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, errors)| {
                    errors.iter().map(move |error| {
                        format!(
                            "{}: {}",
                            field,
                            error.message.as_ref().unwrap_or(&"Invalid value".into())
                        )
                    })
                })
                .collect();
            return Err(ServiceError::validation(error_messages.join(", ")));
        }

        let user = self
            .verifier
            .verify_login(&login_request.username, &login_request.password)
            .await?
            .ok_or_else(|| ServiceError::authentication("invalid credentials"))?;

        let bearer = self.tokens.issue(&user.id, self.lifetime).await?;
        tracing::info!(user_id = %user.id, "issued bearer token");

        Ok(LoginResponse { bearer })
    }

    /// Revokes the token that authenticated `user`.
    ///
    /// A request authenticated without a token has nothing to revoke and
    /// succeeds, as does revoking a token that is already gone.
    pub async fn logout(&self, user: &AuthUser, bearer: Option<&str>) -> ServiceResult<()> {
        if let Some(token) = bearer {
            self.tokens.revoke(&user.id, token).await?;
            tracing::info!(user_id = %user.id, "revoked bearer token");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct OneUser;

    #[async_trait]
    impl CredentialVerifier for OneUser {
        async fn verify_login(&self, username: &str, password: &str) -> ServiceResult<Option<AuthUser>> {
            match (username, password) {
                ("alice", "secret") => Ok(Some(AuthUser {
                    id: "alice-id".to_string(),
                    username: "alice".to_string(),
                })),
                ("crash", _) => Err(ServiceError::dependency("verifier down")),
                _ => Ok(None),
            }
        }
    }

    /// Records issued and revoked tokens.
    #[derive(Default)]
    struct RecordingStore {
        issued: Mutex<Vec<(String, Duration)>>,
        revoked: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl TokenStore for RecordingStore {
        async fn issue(&self, user_id: &str, lifetime: Duration) -> ServiceResult<String> {
            let mut issued = self.issued.lock().unwrap();
            issued.push((user_id.to_string(), lifetime));
            Ok(format!("token-{}", issued.len()))
        }

        async fn lookup(&self, _token: &str) -> ServiceResult<Option<String>> {
            Ok(None)
        }

        async fn revoke(&self, user_id: &str, token: &str) -> ServiceResult<()> {
            self.revoked
                .lock()
                .unwrap()
                .push((user_id.to_string(), token.to_string()));
            Ok(())
        }

        async fn purge_expired(&self) -> ServiceResult<u64> {
            Ok(0)
        }
    }

    fn service(store: Arc<RecordingStore>) -> AuthService {
        AuthService::new(Arc::new(OneUser), store, Duration::from_secs(1_209_600))
    }

    fn login_request(username: &str, password: &str) -> LoginRequest {
        LoginRequest::from_value(&json!({ "username": username, "password": password }))
    }

    #[tokio::test]
    async fn test_login_issues_one_token_with_configured_lifetime() {
        let store = Arc::new(RecordingStore::default());
        let response = service(store.clone())
            .login(login_request("alice", "secret"))
            .await
            .unwrap();

        assert_eq!(response.bearer, "token-1");
        let issued = store.issued.lock().unwrap();
        assert_eq!(issued.as_slice(), &[("alice-id".to_string(), Duration::from_secs(1_209_600))]);
    }

    #[tokio::test]
    async fn test_login_rejects_empty_fields_before_verifying() {
        let store = Arc::new(RecordingStore::default());
        let err = service(store.clone())
            .login(login_request("", "x"))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation { .. }));
        assert!(store.issued.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_bad_credentials() {
        let store = Arc::new(RecordingStore::default());
        let err = service(store.clone())
            .login(login_request("alice", "wrong"))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Authentication { .. }));
        assert!(store.issued.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_verifier_failure_is_internal() {
        let store = Arc::new(RecordingStore::default());
        let err = service(store)
            .login(login_request("crash", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Dependency { .. }));
    }

    #[tokio::test]
    async fn test_logout_revokes_presented_token_only() {
        let store = Arc::new(RecordingStore::default());
        let user = AuthUser {
            id: "alice-id".to_string(),
            username: "alice".to_string(),
        };

        let service = service(store.clone());
        service.logout(&user, Some("token-7")).await.unwrap();
        service.logout(&user, None).await.unwrap();

        let revoked = store.revoked.lock().unwrap();
        assert_eq!(revoked.as_slice(), &[("alice-id".to_string(), "token-7".to_string())]);
    }
}
