//! Global application error types and handlers.
//!
//! This module defines the error type shared by the services, the token store
//! and the authentication middleware. The mapping to HTTP status codes and
//! response bodies lives in `api::common`.

use thiserror::Error;

/// Generic service error that can be used across all entities
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing input.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Bad credentials or an invalid/expired bearer token.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// No identity where one is required, or a failed CSRF check.
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("{entity} already exists: {identifier}")]
    AlreadyExists { entity: String, identifier: String },

    /// Datastore failure, including an elapsed store deadline.
    #[error("Storage error: {source}")]
    Storage {
        #[from]
        source: anyhow::Error,
    },

    /// Failure inside a collaborator such as the user deserializer.
    #[error("Dependency error: {message}")]
    Dependency { message: String },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    // Helper constructors for common patterns

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    pub fn already_exists(entity: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity: entity.into(),
            identifier: identifier.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            source: anyhow::anyhow!(message.into()),
        }
    }

    pub fn dependency(message: impl Into<String>) -> Self {
        Self::Dependency {
            message: message.into(),
        }
    }
}
