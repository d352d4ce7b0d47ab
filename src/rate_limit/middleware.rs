use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::info;

use super::RateLimiter;
use crate::errors::ApiError;
use crate::state::AppState;

pub const LOGIN_SCOPE: &str = "login";
pub const API_SCOPE: &str = "api";

/// Identifies the client for rate limiting
///
/// Uses the first `X-Forwarded-For` entry, then `X-Real-IP`, then `"unknown"`.
pub fn client_key(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

async fn enforce(limiter: &RateLimiter, scope: &str, req: Request, next: Next) -> Response {
    let client = client_key(req.headers());
    let decision = limiter.check(scope, &client);

    if !decision.allowed {
        info!(scope, client = %client, "Rate limit exceeded");
        return ApiError::RateLimited(decision.retry_after_secs).into_response();
    }

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&decision.remaining.to_string()) {
        response.headers_mut().insert("x-ratelimit-remaining", value);
    }
    response
}

/// Applies the sign-in policy
pub async fn login_rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    enforce(&state.login_limiter, LOGIN_SCOPE, req, next).await
}

/// Applies the general API policy
pub async fn api_rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    enforce(&state.api_limiter, API_SCOPE, req, next).await
}
