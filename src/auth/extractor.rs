use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::debug;

use super::token::verify_token;
use crate::errors::ApiError;
use crate::models::User;
use crate::repo;
use crate::state::AppState;

/// The signed-in user, loaded fresh from the database on every request
///
/// A deactivated account is rejected even while its token is still valid.
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Invalid authorization header format".to_string()))?;

        let claims = verify_token(&state.auth.jwt_secret, token)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

        let user = repo::get_user(&state.pool, &claims.sub)?
            .filter(|user| user.active)
            .ok_or_else(|| ApiError::Unauthorized("Account is not active".to_string()))?;

        debug!(user_id = %user.id, role = %user.role, "Authenticated request");
        Ok(AuthUser(user))
    }
}
