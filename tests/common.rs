//! Shared helpers for the Mobile Master integration tests
//!
//! Everything goes through the public router, so tests sign in with real
//! passwords and read the `{success, data}` envelope like a client would.
#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode},
};
use mobile_master::{
    auth::hash_password,
    config::{Config, RateLimitBackend, RateLimitPolicy, base_config},
    create_app,
    db::{DbPool, init_pool},
    models::{Role, User},
    repo, run_migrations,
    state::AppState,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct-horse-battery";

/// Creates a fresh named in-memory database with migrations applied
pub fn setup_pool() -> Arc<DbPool> {
    let url = format!("file:it_{}?mode=memory&cache=shared", uuid::Uuid::new_v4());
    let pool = init_pool(&url).unwrap();
    run_migrations(&mut pool.get().unwrap()).unwrap();
    Arc::new(pool)
}

/// In-memory rate limits, generous enough to stay out of the way
pub fn test_config() -> Config {
    Config {
        jwt_secret: "integration-secret".to_string(),
        rate_limit_backend: RateLimitBackend::Memory,
        login_rate_limit: RateLimitPolicy { max_requests: 1_000, window_secs: 60 },
        api_rate_limit: RateLimitPolicy { max_requests: 10_000, window_secs: 60 },
        ..base_config(None)
    }
}

pub fn app(pool: Arc<DbPool>, config: &Config) -> Router {
    create_app(AppState::new(pool, config))
}

/// Inserts an account through the repository with [`PASSWORD`]
pub fn create_account(pool: &DbPool, name: &str, email: &str, role: Role) -> User {
    repo::create_user(pool, name.to_string(), email, hash_password(PASSWORD).unwrap(), role).unwrap()
}

/// Sends a request and returns the status, headers, and decoded body
pub async fn request(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, json)
}

pub async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let (status, _, body) = request(app, method, uri, token, body).await;
    (status, body)
}

/// Signs in and returns the bearer token
pub async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": email, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["data"]["token"].as_str().unwrap().to_string()
}
