//! Bearer token authentication for the API prefix.
//!
//! `BearerAuthenticator::authenticate` decides, for one request, whether it is
//! outside our concern, token-authenticated, or a session/anonymous request
//! that must clear the CSRF guard. `bearer_auth` runs that decision as axum
//! middleware and threads the resulting `AuthContext` to the handlers.
//!
//! A presented token that does not resolve is a failed authentication (401),
//! never a silent downgrade to the CSRF path.

use crate::api::common::service_error_to_http;
use crate::auth::csrf::CsrfGuard;
use crate::auth::identity::UserDeserializer;
use crate::auth::models::{AuthContext, AuthUser};
use crate::auth::store::TokenStore;
use crate::errors::{ServiceError, ServiceResult};
use axum::{
    extract::{FromRequestParts, OriginalUri, Query, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Public message for tokens that are unknown, expired or revoked.
pub const INVALID_TOKEN_MESSAGE: &str = "bearer token invalid";

/// Where bearer tokens may be read from, per RFC 6750.
#[derive(Debug, Clone)]
pub struct TokenTransport {
    /// Query parameter accepted as a fallback to the `Authorization` header.
    pub query_key: Option<String>,
}

impl TokenTransport {
    /// Extracts the token from `Authorization: Bearer <token>`, then from the
    /// query string when a query key is configured.
    pub fn extract(&self, parts: &Parts) -> Option<String> {
        if let Some(token) = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .and_then(parse_bearer_header)
        {
            return Some(token);
        }

        let key = self.query_key.as_deref()?;
        let Query(params) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri).ok()?;
        params
            .get(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

/// Parses an `Authorization` value; the scheme is case-insensitive.
fn parse_bearer_header(value: &str) -> Option<String> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Per-request authentication decision engine.
pub struct BearerAuthenticator {
    prefix: String,
    bearer_enabled: bool,
    transport: TokenTransport,
    tokens: Arc<dyn TokenStore>,
    users: Arc<dyn UserDeserializer>,
    csrf: Arc<dyn CsrfGuard>,
}

impl BearerAuthenticator {
    pub fn new(
        prefix: impl Into<String>,
        bearer_enabled: bool,
        transport: TokenTransport,
        tokens: Arc<dyn TokenStore>,
        users: Arc<dyn UserDeserializer>,
        csrf: Arc<dyn CsrfGuard>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            bearer_enabled,
            transport,
            tokens,
            users,
            csrf,
        }
    }

    fn login_path(&self) -> String {
        format!("{}/login", self.prefix)
    }

    fn is_under_prefix(&self, path: &str) -> bool {
        path.strip_prefix(self.prefix.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Decides the identity for one request.
    ///
    /// # Returns
    /// - `Ok(None)` when the request is outside the prefix or is the login
    ///   endpoint, and must pass through untouched
    /// - `Ok(Some(context))` when the request may proceed with `context`
    ///
    /// # Errors
    /// - `PermissionDenied` when the CSRF guard rejects a tokenless request
    /// - `Authentication` when a presented token is unknown or expired
    /// - `Storage` / `Dependency` when the store or the deserializer fails
    pub async fn authenticate(&self, path: &str, parts: &Parts) -> ServiceResult<Option<AuthContext>> {
        if !self.is_under_prefix(path) {
            return Ok(None);
        }

        if !self.bearer_enabled {
            self.csrf.check(parts)?;
            return Ok(Some(AuthContext::anonymous()));
        }

        if path == self.login_path() {
            return Ok(None);
        }

        let Some(token) = self.transport.extract(parts) else {
            self.csrf.check(parts)?;
            return Ok(Some(AuthContext::anonymous()));
        };

        let Some(user_id) = self.tokens.lookup(&token).await? else {
            return Err(ServiceError::authentication(INVALID_TOKEN_MESSAGE));
        };

        match self.users.deserialize_user(&user_id).await? {
            Some(user) => Ok(Some(AuthContext::bearer(user, token))),
            None => {
                tracing::warn!(user_id = %user_id, "bearer token owner no longer resolvable");
                Ok(Some(AuthContext::anonymous()))
            }
        }
    }
}

/// Bearer authentication middleware.
///
/// Uses the original URI so the decision is the same whether the layer sits on
/// the top-level router or on the router nested under the prefix.
pub async fn bearer_auth(
    State(authenticator): State<Arc<BearerAuthenticator>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let path = parts
        .extensions
        .get::<OriginalUri>()
        .map(|uri| uri.0.path().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());

    match authenticator.authenticate(&path, &parts).await {
        Ok(None) => next.run(Request::from_parts(parts, body)).await,
        Ok(Some(context)) => {
            tracing::debug!(path = %path, authenticated = context.is_authenticated(), "request admitted");
            parts.extensions.insert(context);
            next.run(Request::from_parts(parts, body)).await
        }
        Err(error) => {
            match &error {
                ServiceError::Authentication { .. } => {
                    tracing::warn!(path = %path, "rejected invalid bearer token")
                }
                ServiceError::PermissionDenied { message } => {
                    tracing::warn!(path = %path, reason = %message, "CSRF check failed")
                }
                _ => {}
            }
            service_error_to_http(error)
        }
    }
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    /// Reads the context set by `bearer_auth`; anonymous if the layer did not run.
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Extractor for routes that require an identity.
///
/// Rejects with 403, matching the logout contract.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: AuthUser,
    pub bearer: Option<String>,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .unwrap_or_default();
        match context.user {
            Some(user) => Ok(CurrentUser {
                user,
                bearer: context.bearer,
            }),
            None => Err(service_error_to_http(ServiceError::permission_denied(
                "authentication required",
            ))),
        }
    }
}
