//! User business logic service.
//!
//! Backs the bearer layer's credential verification and user resolution with
//! the local `users` table, and creates users for the CLI.

use crate::auth::identity::{CredentialVerifier, UserDeserializer};
use crate::auth::models::AuthUser;
use crate::database::models::{CreateNewUser, CreateUser, User};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::user_repository::UserRepository;
use crate::utils::deadline::with_deadline;
use async_trait::async_trait;
use bcrypt::{DEFAULT_COST, hash, verify};
use sqlx::SqlitePool;
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct UserService {
    /// Shared database connection pool
    pool: SqlitePool,
    /// Deadline for each user lookup
    timeout: Duration,
    cost: u32,
}

impl UserService {
    /// Creates a new UserService instance using the default bcrypt cost.
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        Self {
            pool,
            timeout,
            cost: DEFAULT_COST,
        }
    }

    /// Overrides the bcrypt cost used for new password hashes.
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    /// Creates a new user with full validation.
    ///
    /// # Arguments
    /// * `create_user` - User creation data transfer object
    ///
    /// # Returns
    /// The newly created User with all fields populated
    ///
    /// # Errors
    /// Returns `ServiceError` for:
    /// - Validation failures
    /// - Duplicate usernames
    /// - Hashing or database failures
    pub async fn create_user(&self, create_user: CreateNewUser) -> ServiceResult<User> {
        let create_user = CreateNewUser {
            username: create_user.username.trim().to_string(),
            ..create_user
        };
        if let Err(validation_errors) = create_user.validate() {
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

        let username = create_user.username;
        let user_repo = UserRepository::new(&self.pool);
        if with_deadline(
            self.timeout,
            "username check",
            user_repo.username_exists(&username),
        )
        .await?
        {
            return Err(ServiceError::already_exists("User", &username));
        }

        let password = create_user.password;
        let cost = self.cost;
        let password_hash = tokio::task::spawn_blocking(move || hash(password, cost))
            .await
            .map_err(|e| ServiceError::dependency(format!("Hashing task failed: {}", e)))?
            .map_err(|e| ServiceError::dependency(format!("Failed to hash password: {}", e)))?;

        let new_user = CreateUser {
            id: Uuid::now_v7().to_string(),
            username,
            password_hash,
            email: create_user.email,
        };
        let user = with_deadline(self.timeout, "user insert", user_repo.create_user(new_user)).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "created user");
        Ok(user)
    }
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        AuthUser {
            id: user.id,
            username: user.username,
        }
    }
}

#[async_trait]
impl CredentialVerifier for UserService {
    async fn verify_login(&self, username: &str, password: &str) -> ServiceResult<Option<AuthUser>> {
        let user_repo = UserRepository::new(&self.pool);
        let found = with_deadline(
            self.timeout,
            "user lookup by username",
            user_repo.get_user_by_username(username),
        )
        .await?;
        let Some(user) = found else {
            return Ok(None);
        };

        if !user.is_usable() {
            return Ok(None);
        }

        let password = password.to_string();
        let password_hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify(password, &password_hash))
            .await
            .map_err(|e| ServiceError::dependency(format!("Verification task failed: {}", e)))?
            .map_err(|e| ServiceError::dependency(format!("Password verification error: {}", e)))?;

        Ok(matches.then(|| user.into()))
    }
}

#[async_trait]
impl UserDeserializer for UserService {
    async fn deserialize_user(&self, user_id: &str) -> ServiceResult<Option<AuthUser>> {
        let user_repo = UserRepository::new(&self.pool);
        let user = with_deadline(
            self.timeout,
            "user lookup by id",
            user_repo.get_user_by_id(user_id),
        )
        .await?;
        Ok(user.filter(User::is_usable).map(AuthUser::from))
    }
}
