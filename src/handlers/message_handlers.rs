use axum::extract::{Path, State};
use tracing::{debug, instrument};

use super::{ApiResult, CreatedResult, JsonBody, created, ok};
use crate::auth::{AuthUser, ensure_shop_access};
use crate::dto::SendMessageDto;
use crate::errors::ApiError;
use crate::models::Message;
use crate::repo;
use crate::state::AppState;

/// Handler for sending a message to a colleague, or to the whole shop when
/// `recipient_id` is omitted
#[instrument(skip(state, actor, payload))]
pub async fn send_message_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(shop_id): Path<String>,
    JsonBody(payload): JsonBody<SendMessageDto>,
) -> CreatedResult<Message> {
    ensure_shop_access(&state.pool, &actor, &shop_id)?;
    let message = repo::send_message(
        &state.pool,
        &shop_id,
        &actor.id,
        payload.recipient_id.as_deref(),
        &payload.body,
    )?;
    created(message)
}

#[instrument(skip(state, actor))]
pub async fn list_messages_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(shop_id): Path<String>,
) -> ApiResult<Vec<Message>> {
    ensure_shop_access(&state.pool, &actor, &shop_id)?;
    let messages = repo::list_messages_for(&state.pool, &shop_id, &actor.id)?;
    debug!("Retrieved {} messages", messages.len());
    ok(messages)
}

/// Handler for `POST /api/messages/{id}/read`; only the recipient may mark a message
#[instrument(skip(state, actor))]
pub async fn mark_message_read_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(message_id): Path<String>,
) -> ApiResult<Message> {
    let message = repo::get_message(&state.pool, &message_id)?.ok_or_else(|| ApiError::not_found("Message"))?;
    ensure_shop_access(&state.pool, &actor, &message.shop_id)?;
    ok(repo::mark_read(&state.pool, &message_id, &actor.id)?)
}
