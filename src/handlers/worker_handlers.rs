use axum::extract::{Path, State};
use tracing::{info, instrument};

use super::{ApiResult, CreatedResult, JsonBody, created, ok};
use crate::auth::{AuthUser, ensure_shop_owner, hash_password};
use crate::dto::{CreateWorkerDto, validate_account_fields};
use crate::errors::ApiError;
use crate::models::WorkerWithUser;
use crate::repo;
use crate::state::AppState;

/// Handler for hiring a worker
///
/// This function handles POST requests to `/api/shops/{id}/workers`. The
/// WORKER account and its link to the shop are created together.
#[instrument(skip(state, actor, payload), fields(email = %payload.email))]
pub async fn add_worker_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(shop_id): Path<String>,
    JsonBody(payload): JsonBody<CreateWorkerDto>,
) -> CreatedResult<WorkerWithUser> {
    ensure_shop_owner(&state.pool, &actor, &shop_id)?;
    validate_account_fields(&payload.name, &payload.email, &payload.password).map_err(ApiError::Validation)?;

    let password = payload.password.clone();
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(anyhow::Error::from)??;
    let worker = repo::add_worker(
        &state.pool,
        &shop_id,
        payload.name.trim().to_string(),
        &payload.email,
        hash,
        &actor.id,
    )?;

    info!("Added worker {} to shop {}", worker.user.id, shop_id);
    created(worker)
}

#[instrument(skip(state, actor))]
pub async fn list_workers_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(shop_id): Path<String>,
) -> ApiResult<Vec<WorkerWithUser>> {
    ensure_shop_owner(&state.pool, &actor, &shop_id)?;
    ok(repo::list_workers(&state.pool, &shop_id)?)
}

/// Handler for letting a worker go; the account is kept but loses access to the shop
#[instrument(skip(state, actor))]
pub async fn remove_worker_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path((shop_id, user_id)): Path<(String, String)>,
) -> ApiResult<()> {
    ensure_shop_owner(&state.pool, &actor, &shop_id)?;
    repo::remove_worker(&state.pool, &shop_id, &user_id, &actor.id)?;
    ok(())
}
