use axum::extract::{Path, State};
use axum_extra::extract::Query;
use tracing::{debug, info, instrument};

use super::{ApiResult, CreatedResult, JsonBody, created, ok};
use crate::auth::{AuthUser, hash_password, require_super_admin};
use crate::dto::{CreateUserDto, ListUsersQuery, UpdateUserStatusDto, validate_account_fields};
use crate::errors::ApiError;
use crate::models::{Role, User};
use crate::repo;
use crate::state::AppState;

/// Handler for creating an owner or super admin account
///
/// This function handles POST requests to `/api/users`. Workers are created
/// through their shop so they are always linked to one.
#[instrument(skip(state, actor, payload), fields(email = %payload.email, role = %payload.role))]
pub async fn create_user_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    JsonBody(payload): JsonBody<CreateUserDto>,
) -> CreatedResult<User> {
    require_super_admin(&actor)?;
    if payload.role == Role::Worker {
        return Err(ApiError::validation("Workers are added through their shop"));
    }
    validate_account_fields(&payload.name, &payload.email, &payload.password).map_err(ApiError::Validation)?;

    let password = payload.password.clone();
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(anyhow::Error::from)??;
    let user = repo::create_user(&state.pool, payload.name.trim().to_string(), &payload.email, hash, payload.role)?;

    info!("Created user {}", user.id);
    created(user)
}

/// Handler for listing accounts, optionally by role
#[instrument(skip(state, actor))]
pub async fn list_users_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Vec<User>> {
    require_super_admin(&actor)?;
    let users = repo::list_users(&state.pool, query.role)?;
    debug!("Retrieved {} users", users.len());
    ok(users)
}

/// Handler for activating or deactivating an account
///
/// This function handles PATCH requests to `/api/users/{id}/status`.
#[instrument(skip(state, actor, payload))]
pub async fn update_user_status_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(user_id): Path<String>,
    JsonBody(payload): JsonBody<UpdateUserStatusDto>,
) -> ApiResult<User> {
    require_super_admin(&actor)?;
    if user_id == actor.id && !payload.active {
        return Err(ApiError::validation("You cannot deactivate your own account"));
    }

    let user = repo::set_user_active(&state.pool, &user_id, payload.active)?;
    info!("Set user {} active={}", user.id, user.active);
    ok(user)
}
