use axum::extract::State;
use tracing::{info, instrument, warn};

use super::{ApiResult, JsonBody, ok};
use crate::auth::{AuthUser, create_token, verify_password};
use crate::dto::{LoginDto, LoginResponse};
use crate::errors::ApiError;
use crate::models::User;
use crate::repo;
use crate::state::AppState;

const BAD_CREDENTIALS: &str = "Invalid email or password";

/// Handler for signing in
///
/// This function handles POST requests to `/api/auth/login`. Unknown emails,
/// wrong passwords, and deactivated accounts all get the same 401 so the
/// response does not reveal which accounts exist.
///
/// ### Returns
///
/// A bearer token, its expiry, and the signed-in user
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn login_handler(State(state): State<AppState>, JsonBody(payload): JsonBody<LoginDto>) -> ApiResult<LoginResponse> {
    let user = repo::get_user_by_email(&state.pool, &payload.email)?
        .filter(|user| user.active)
        .ok_or_else(|| ApiError::Unauthorized(BAD_CREDENTIALS.to_string()))?;

    // Argon2 is CPU-bound, keep it off the async workers
    let hash = user.password_hash().to_string();
    let password = payload.password;
    let valid = tokio::task::spawn_blocking(move || verify_password(&hash, &password))
        .await
        .map_err(anyhow::Error::from)?
        .unwrap_or_else(|e| {
            warn!(user_id = %user.id, "Stored password hash is unreadable: {}", e);
            false
        });
    if !valid {
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.to_string()));
    }

    let (token, expires_at) = create_token(&state.auth.jwt_secret, state.auth.token_ttl_hours, &user.id)?;

    info!(user_id = %user.id, "User signed in");
    ok(LoginResponse { token, expires_at, user })
}

/// Handler for `GET /api/auth/me`
pub async fn me_handler(AuthUser(user): AuthUser) -> ApiResult<User> {
    ok(user)
}
