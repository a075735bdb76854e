//! CSRF protection for requests that do not authenticate with a bearer token.
//!
//! Such requests may ride on the browser's ambient session cookie, so a
//! state-changing request carrying that cookie must also prove it came from
//! our own pages: the `X-XSRF-TOKEN` header has to echo the CSRF cookie.

use crate::errors::{ServiceError, ServiceResult};
use axum::http::{HeaderName, Method, request::Parts};
use axum_extra::extract::CookieJar;
use subtle::ConstantTimeEq;

pub const XSRF_HEADER: HeaderName = HeaderName::from_static("x-xsrf-token");

pub trait CsrfGuard: Send + Sync {
    /// Succeeds when the request may proceed on its ambient credentials.
    fn check(&self, parts: &Parts) -> ServiceResult<()>;
}

/// Double-submit cookie guard.
#[derive(Debug, Clone)]
pub struct DoubleSubmitCsrf {
    session_cookie: String,
    csrf_cookie: String,
}

impl DoubleSubmitCsrf {
    pub fn new(session_cookie: impl Into<String>, csrf_cookie: impl Into<String>) -> Self {
        Self {
            session_cookie: session_cookie.into(),
            csrf_cookie: csrf_cookie.into(),
        }
    }
}

fn is_safe_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

impl CsrfGuard for DoubleSubmitCsrf {
    fn check(&self, parts: &Parts) -> ServiceResult<()> {
        if is_safe_method(&parts.method) {
            return Ok(());
        }

        let jar = CookieJar::from_headers(&parts.headers);

        // Without a session there is no ambient credential to forge with.
        if jar.get(&self.session_cookie).is_none() {
            return Ok(());
        }

        let expected = jar
            .get(&self.csrf_cookie)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ServiceError::permission_denied("missing CSRF cookie"))?;

        let presented = parts
            .headers
            .get(&XSRF_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ServiceError::permission_denied("missing CSRF header"))?;

        if bool::from(expected.as_bytes().ct_eq(presented.as_bytes())) {
            Ok(())
        } else {
            Err(ServiceError::permission_denied("CSRF token mismatch"))
        }
    }
}
