//! Central module for organizing the application's HTTP surface.
//!
//! Everything under the API prefix shares one stack: permissive CORS on the
//! outside, then the bearer middleware, then the routes. The banner at `/`
//! sits outside that stack.

pub mod common;
pub mod user;

use crate::auth::middleware::bearer_auth;
use crate::auth::routes::auth_router;
use crate::state::AppState;
use axum::{Json, Router, middleware, routing::get};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Routes mounted under the API prefix, with CORS and bearer auth applied.
pub fn api_router(state: AppState) -> Router {
    let mut router = Router::new().merge(user::routes::user_router());
    if state.config.bearer_tokens_enabled {
        router = router.merge(auth_router());
    }

    router
        .layer(middleware::from_fn_with_state(
            state.authenticator.clone(),
            bearer_auth,
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The complete application router.
pub fn app(state: AppState) -> Router {
    let prefix = state.config.api_prefix();
    Router::new()
        .route("/", get(root_handler))
        .nest(&prefix, api_router(state))
        .layer(TraceLayer::new_for_http())
}

async fn root_handler() -> Json<Value> {
    Json(json!({
        "service": "headless",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::csrf::{DoubleSubmitCsrf, XSRF_HEADER};
    use crate::auth::middleware::{BearerAuthenticator, TokenTransport};
    use crate::auth::service::AuthService;
    use crate::auth::store::SqliteTokenStore;
    use crate::config::Config;
    use crate::database::models::CreateNewUser;
    use crate::database::test_support::memory_database;
    use crate::services::user_service::UserService;
    use axum::{
        body::Body,
        http::{
            Method, Request, StatusCode,
            header::{ACCESS_CONTROL_ALLOW_ORIGIN, AUTHORIZATION, CONTENT_TYPE, COOKIE, ORIGIN, WWW_AUTHENTICATE},
        },
        response::Response,
    };
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_app(bearer_tokens_enabled: bool) -> Router {
        let config = Config {
            bearer_tokens_enabled,
            ..Config::for_tests()
        };
        let db = memory_database().await;
        let pool = db.pool().clone();

        let users = Arc::new(UserService::new(pool.clone(), config.store_timeout()).with_cost(4));
        users
            .create_user(CreateNewUser {
                username: "alice".to_string(),
                password: "secret".to_string(),
                email: None,
            })
            .await
            .unwrap();

        let tokens = Arc::new(SqliteTokenStore::new(pool, config.store_timeout()));
        let authenticator = BearerAuthenticator::new(
            config.api_prefix(),
            config.bearer_tokens_enabled,
            TokenTransport {
                query_key: config.bearer_query_key.clone(),
            },
            tokens.clone(),
            users.clone(),
            Arc::new(DoubleSubmitCsrf::new(&config.session_cookie, &config.csrf_cookie)),
        );
        let auth_service = AuthService::new(users, tokens, config.token_lifetime());

        app(AppState {
            config: Arc::new(config),
            auth_service: Arc::new(auth_service),
            authenticator: Arc::new(authenticator),
        })
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login(app: &Router) -> String {
        let response = send(
            app,
            post_json("/api/v1/login", None, json!({ "username": "alice", "password": "secret" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["bearer"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_login_use_logout_cycle() {
        let app = test_app(true).await;
        let token = login(&app).await;

        let me = send(&app, get("/api/v1/me", Some(&token))).await;
        assert_eq!(me.status(), StatusCode::OK);
        assert_eq!(body_json(me).await["username"], "alice");

        let logout = send(&app, post_json("/api/v1/logout", Some(&token), json!({}))).await;
        assert_eq!(logout.status(), StatusCode::OK);
        assert_eq!(body_json(logout).await, json!({}));

        let after = send(&app, get("/api/v1/me", Some(&token))).await;
        assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
        assert!(after.headers().contains_key(WWW_AUTHENTICATE));
        assert_eq!(body_json(after).await, json!({ "error": "bearer token invalid" }));
    }

    #[tokio::test]
    async fn test_logout_only_revokes_its_own_token() {
        let app = test_app(true).await;
        let first = login(&app).await;
        let second = login(&app).await;
        assert_ne!(first, second);

        let logout = send(&app, post_json("/api/v1/logout", Some(&first), json!({}))).await;
        assert_eq!(logout.status(), StatusCode::OK);

        let still = send(&app, get("/api/v1/me", Some(&second))).await;
        assert_eq!(still.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_rejects_empty_username() {
        let app = test_app(true).await;
        let response = send(
            &app,
            post_json("/api/v1/login", None, json!({ "username": "", "password": "x" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_rejects_non_string_fields() {
        let app = test_app(true).await;
        let response = send(
            &app,
            post_json("/api/v1/login", None, json!({ "username": { "$ne": null }, "password": [1] })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_rejects_malformed_json() {
        let app = test_app(true).await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/login")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_bad_password_is_401() {
        let app = test_app(true).await;
        let response = send(
            &app,
            post_json("/api/v1/login", None, json!({ "username": "alice", "password": "nope" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert!(body.get("bearer").is_none());
    }

    #[tokio::test]
    async fn test_login_accepts_form_body() {
        let app = test_app(true).await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/login")
            .header(CONTENT_TYPE, "Application/x-www-form-urlencoded")
            .body(Body::from("username=+alice+&password=secret"))
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await["bearer"].is_string());
    }

    #[tokio::test]
    async fn test_login_ignores_stale_token() {
        let app = test_app(true).await;
        let response = send(
            &app,
            post_json(
                "/api/v1/login",
                Some("stale"),
                json!({ "username": "alice", "password": "secret" }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_logout_requires_identity() {
        let app = test_app(true).await;
        let response = send(&app, post_json("/api/v1/logout", None, json!({}))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await, json!({ "forbidden": "forbidden" }));
    }

    #[tokio::test]
    async fn test_logout_twice_second_is_rejected_token() {
        let app = test_app(true).await;
        let token = login(&app).await;

        let first = send(&app, post_json("/api/v1/logout", Some(&token), json!({}))).await;
        assert_eq!(first.status(), StatusCode::OK);

        let second = send(&app, post_json("/api/v1/logout", Some(&token), json!({}))).await;
        assert_eq!(second.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_token_rejected_on_anonymous_route() {
        let app = test_app(true).await;

        let anonymous = send(&app, get("/api/v1/whoami", None)).await;
        assert_eq!(anonymous.status(), StatusCode::OK);
        assert_eq!(body_json(anonymous).await, json!({ "user": null }));

        let forged = send(&app, get("/api/v1/whoami", Some("forged"))).await;
        assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_query_token_identifies_request() {
        let app = test_app(true).await;
        let token = login(&app).await;
        let response = send(&app, get(&format!("/api/v1/whoami?access_token={token}"), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["user"]["username"], "alice");
    }

    #[tokio::test]
    async fn test_me_without_identity_is_403() {
        let app = test_app(true).await;
        let response = send(&app, get("/api/v1/me", None)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_cors_only_under_prefix() {
        let app = test_app(true).await;

        let mut api = get("/api/v1/whoami", None);
        api.headers_mut().insert(ORIGIN, "https://site.example".parse().unwrap());
        let response = send(&app, api).await;
        assert!(response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));

        let mut root = get("/", Some("forged"));
        root.headers_mut().insert(ORIGIN, "https://site.example".parse().unwrap());
        let response = send(&app, root).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn test_middleware_errors_carry_cors_headers() {
        let app = test_app(true).await;
        let mut request = get("/api/v1/whoami", Some("forged"));
        request.headers_mut().insert(ORIGIN, "https://site.example".parse().unwrap());
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn test_disabled_bearer_tokens() {
        let app = test_app(false).await;

        let response = send(
            &app,
            post_json("/api/v1/login", None, json!({ "username": "alice", "password": "secret" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // Tokens are never consulted, so even a forged one is harmless.
        let response = send(&app, get("/api/v1/whoami", Some("forged"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "user": null }));

        let proven = Request::builder()
            .method(Method::GET)
            .uri("/api/v1/whoami")
            .header(COOKIE, "session=s; csrf_token=t")
            .header(XSRF_HEADER, "t")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, proven).await.status(), StatusCode::OK);
    }
}
