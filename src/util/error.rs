use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::repository::repository_error::RepositoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HandlerErrorKind {
    NotFound,
    BadRequest,
    Unauthorized,
    Conflict,
    Internal,
}

impl std::fmt::Display for HandlerErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HandlerErrorKind::NotFound => "NotFound",
            HandlerErrorKind::BadRequest => "BadRequest",
            HandlerErrorKind::Unauthorized => "Unauthorized",
            HandlerErrorKind::Conflict => "Conflict",
            HandlerErrorKind::Internal => "Internal",
        };
        write!(f, "{}", s)
    }
}

/// JSON error body returned by the `/api` routes.
#[derive(Debug, Serialize)]
pub struct HandlerError {
    pub error: HandlerErrorKind,
    pub message: String,
    pub details: Option<String>,
}

impl HandlerError {
    pub fn new(error: HandlerErrorKind, message: impl Into<String>) -> Self {
        HandlerError {
            error,
            message: message.into(),
            details: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        HandlerError::new(HandlerErrorKind::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        match self.error {
            HandlerErrorKind::NotFound => StatusCode::NOT_FOUND,
            HandlerErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            HandlerErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            HandlerErrorKind::Conflict => StatusCode::CONFLICT,
            HandlerErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for HandlerError {}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, axum::Json(self)).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("Mobile number already registered")]
    DuplicateUser,
    #[error("Invalid mobile number or password")]
    InvalidCredentials,
    #[error("Invalid {0} ID")]
    InvalidId(&'static str),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid Input: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Internal Error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => ServiceError::NotFound(msg),
            RepositoryError::AlreadyExists(_) => ServiceError::DuplicateUser,
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<ServiceError> for HandlerError {
    fn from(err: ServiceError) -> Self {
        let kind = match &err {
            ServiceError::DuplicateUser => HandlerErrorKind::Conflict,
            ServiceError::InvalidCredentials => HandlerErrorKind::Unauthorized,
            ServiceError::InvalidId(_) | ServiceError::InvalidDate(_) | ServiceError::InvalidInput(_) => {
                HandlerErrorKind::BadRequest
            }
            ServiceError::NotFound(_) => HandlerErrorKind::NotFound,
            ServiceError::Internal(detail) => {
                // storage details stay in the logs
                error!("Internal error: {}", detail);
                return HandlerError::internal("Internal server error");
            }
        };
        HandlerError::new(kind, err.to_string())
    }
}
