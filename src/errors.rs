use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

/// Business-rule failures raised by the repository layer
///
/// These travel inside `anyhow::Error` and are recovered by
/// `From<anyhow::Error> for ApiError`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(String),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(anyhow::Error),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Too many requests, retry in {0}s")]
    RateLimited(u64),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound(format!("{} not found", what))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn forbidden() -> Self {
        ApiError::Forbidden("You do not have permission to perform this action".to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(domain) = err.downcast_ref::<DomainError>() {
            return match domain.clone() {
                DomainError::NotFound(msg) => ApiError::NotFound(msg),
                DomainError::Conflict(msg) => ApiError::Conflict(msg),
                DomainError::Validation(msg) => ApiError::Validation(msg),
                DomainError::Forbidden(msg) => ApiError::Forbidden(msg),
            };
        }

        if let Some(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) =
            err.downcast_ref::<DieselError>()
        {
            return ApiError::Conflict(format!("Duplicate value: {}", info.message()));
        }

        ApiError::Database(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Database(err) => {
                tracing::error!("Internal error: {:#}", err);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(serde_json::json!({
            "success": false,
            "error": message,
        }));

        let mut response = (status, body).into_response();
        if let ApiError::RateLimited(retry_after) = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
