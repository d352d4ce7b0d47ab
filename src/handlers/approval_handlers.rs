use axum::extract::{Path, State};
use axum_extra::extract::Query;
use tracing::{debug, info, instrument};

use super::{ApiResult, CreatedResult, JsonBody, created, ok};
use crate::auth::{AuthUser, ensure_shop_access, ensure_shop_owner};
use crate::db::DbPool;
use crate::dto::{ApprovalQuery, CreateApprovalRequestDto, ReviewApprovalDto};
use crate::errors::ApiError;
use crate::models::{ApprovalRequest, Role, User};
use crate::repo;
use crate::state::AppState;

/// Handler for a worker asking the owner to sign off on a change
///
/// This function handles POST requests to `/api/approvals/request`. Owners
/// and super admins already have the direct endpoints, so they get a 400
/// pointing them there.
#[instrument(skip(state, actor, payload), fields(request_type = %payload.request_type))]
pub async fn request_approval_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    JsonBody(payload): JsonBody<CreateApprovalRequestDto>,
) -> CreatedResult<ApprovalRequest> {
    ensure_shop_access(&state.pool, &actor, &payload.shop_id)?;
    if actor.role != Role::Worker {
        return Err(ApiError::validation(
            "Only workers need approval; apply the change directly instead",
        ));
    }

    let request = repo::create_approval_request(&state.pool, &payload, &actor.id)?;
    info!("Worker {} filed approval request {}", actor.id, request.id);
    created(request)
}

/// Handler for listing a shop's approval requests
///
/// Workers only see the requests they filed themselves.
#[instrument(skip(state, actor, query))]
pub async fn list_approvals_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(shop_id): Path<String>,
    Query(query): Query<ApprovalQuery>,
) -> ApiResult<Vec<ApprovalRequest>> {
    ensure_shop_access(&state.pool, &actor, &shop_id)?;
    let own_only = (actor.role == Role::Worker).then_some(actor.id.as_str());

    let requests = repo::list_approvals(&state.pool, &shop_id, query.status, own_only)?;
    debug!("Retrieved {} approval requests", requests.len());
    ok(requests)
}

/// Loads a request and checks the caller manages its shop
fn request_for_review(pool: &DbPool, actor: &User, id: &str) -> Result<ApprovalRequest, ApiError> {
    let request = repo::get_approval(pool, id)?.ok_or_else(|| ApiError::not_found("Approval request"))?;
    ensure_shop_owner(pool, actor, &request.shop_id)?;
    Ok(request)
}

/// Handler for approving a request and applying its change
///
/// The body is `{"note": ...}`; send `{}` to approve without a note. If the
/// change can no longer be applied the request stays `PENDING` and the error
/// is returned to the owner.
#[instrument(skip(state, actor, payload))]
pub async fn approve_request_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(request_id): Path<String>,
    JsonBody(payload): JsonBody<ReviewApprovalDto>,
) -> ApiResult<ApprovalRequest> {
    request_for_review(&state.pool, &actor, &request_id)?;
    ok(repo::approve_request(&state.pool, &request_id, &actor.id, payload.note)?)
}

#[instrument(skip(state, actor, payload))]
pub async fn reject_request_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(request_id): Path<String>,
    JsonBody(payload): JsonBody<ReviewApprovalDto>,
) -> ApiResult<ApprovalRequest> {
    request_for_review(&state.pool, &actor, &request_id)?;
    ok(repo::reject_request(&state.pool, &request_id, &actor.id, payload.note)?)
}
