use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::validation::{TypeError, ValidationError};

pub type AppResult<T> = Result<T, AppError>;

const FORBIDDEN_MESSAGE: &str = "you do not have permission to perform this action";
const INTERNAL_MESSAGE: &str = "internal server error";

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Carries no detail so the checked permission never reaches the caller.
    #[error("forbidden")]
    Forbidden,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("database error")]
    Database(#[from] sqlx::Error),
    #[error("internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::BadRequest(_) => "bad_request",
            AppError::Validation(_) => "validation",
            AppError::Configuration(_) | AppError::Database(_) | AppError::Internal(_) => "internal",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing_fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    invalid_fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    type_errors: Option<Vec<TypeError>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.kind();

        let payload = match self {
            AppError::Validation(err) => ErrorResponse {
                error,
                message: err.to_string(),
                missing_fields: Some(err.missing_fields),
                invalid_fields: Some(err.invalid_fields),
                type_errors: Some(err.type_errors),
            },
            AppError::Forbidden => ErrorResponse::plain(error, FORBIDDEN_MESSAGE),
            AppError::Database(ref err) => {
                tracing::error!(error = %err, "store failure");
                ErrorResponse::plain(error, INTERNAL_MESSAGE)
            }
            AppError::Configuration(ref detail) | AppError::Internal(ref detail) => {
                tracing::error!(detail = %detail, "internal error");
                ErrorResponse::plain(error, INTERNAL_MESSAGE)
            }
            other => ErrorResponse::plain(error, other.to_string()),
        };

        (status, Json(payload)).into_response()
    }
}

impl ErrorResponse {
    fn plain(error: &'static str, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
            missing_fields: None,
            invalid_fields: None,
            type_errors: None,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value.to_string())
    }
}
