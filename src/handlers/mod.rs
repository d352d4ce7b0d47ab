/// Web API Handlers
///
/// This module contains the handlers for the RESTful API endpoints.
/// Each handler authenticates the caller through [`AuthUser`](crate::auth::AuthUser),
/// checks role and shop membership, calls the repository, and wraps the
/// result in the `{ "success": true, "data": ... }` envelope.

mod approval_handlers;
mod audit_handlers;
mod auth_handlers;
mod catalog_handlers;
mod closing_handlers;
mod health;
mod inventory_handlers;
mod message_handlers;
mod purchase_handlers;
mod sale_handlers;
mod shop_handlers;
mod user_handlers;
mod worker_handlers;

// Re-export all handlers
pub use approval_handlers::*;
pub use audit_handlers::*;
pub use auth_handlers::*;
pub use catalog_handlers::*;
pub use closing_handlers::*;
pub use health::*;
pub use inventory_handlers::*;
pub use message_handlers::*;
pub use purchase_handlers::*;
pub use sale_handlers::*;
pub use shop_handlers::*;
pub use user_handlers::*;
pub use worker_handlers::*;

use axum::{
    Json,
    extract::{FromRequest, Request},
    http::StatusCode,
};
use serde::de::DeserializeOwned;

use crate::dto::ApiResponse;
use crate::errors::ApiError;

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;
pub type CreatedResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

pub(crate) fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

pub(crate) fn created<T>(data: T) -> CreatedResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(data))))
}

/// JSON body extractor whose rejections use the error envelope
///
/// Malformed or mistyped bodies become a 400 with the deserializer's message
/// instead of axum's plain-text rejection.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}
