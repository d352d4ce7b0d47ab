//! Rate limiting through the real router, with hits counted in the database

mod common;

use axum::http::{Method, StatusCode, header};
use common::{PASSWORD, app, create_account, login, request, setup_pool, test_config};
use mobile_master::config::{Config, RateLimitBackend, RateLimitPolicy};
use mobile_master::models::Role;

fn database_limited(max_requests: u32) -> Config {
    Config {
        rate_limit_backend: RateLimitBackend::Database,
        api_rate_limit: RateLimitPolicy { max_requests, window_secs: 60 },
        ..test_config()
    }
}

#[tokio::test]
async fn test_api_limit_returns_429_with_retry_after() {
    let pool = setup_pool();
    let app = app(pool.clone(), &database_limited(3));
    create_account(&pool, "Bilal", "bilal@example.pk", Role::Owner);
    let token = login(&app, "bilal@example.pk", PASSWORD).await;

    for expected_remaining in ["2", "1", "0"] {
        let (status, headers, _) = request(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers.get("x-ratelimit-remaining").unwrap(), expected_remaining);
    }

    let (status, headers, body) = request(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], false);
    let retry_after: u64 = headers.get(header::RETRY_AFTER).unwrap().to_str().unwrap().parse().unwrap();
    assert!((1..=60).contains(&retry_after));

    // Probes are never limited
    let (status, _, _) = request(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_database_hits_are_shared_between_instances() {
    let pool = setup_pool();
    let config = database_limited(2);
    let first = app(pool.clone(), &config);
    let second = app(pool.clone(), &config);
    create_account(&pool, "Bilal", "bilal@example.pk", Role::Owner);
    let token = login(&first, "bilal@example.pk", PASSWORD).await;

    let (status, _, _) = request(&first, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = request(&second, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = request(&first, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_memory_limits_are_per_instance() {
    let pool = setup_pool();
    let config = Config {
        api_rate_limit: RateLimitPolicy { max_requests: 1, window_secs: 60 },
        ..test_config()
    };
    let first = app(pool.clone(), &config);
    let second = app(pool.clone(), &config);
    create_account(&pool, "Bilal", "bilal@example.pk", Role::Owner);
    let token = login(&first, "bilal@example.pk", PASSWORD).await;

    let (status, _, _) = request(&first, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = request(&second, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = request(&first, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}
