use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use shared::models::ErrorResponse;

use crate::{
    auth::credentials::CredentialError,
    services::{
        chat_service::ChatServiceError, thread_store::StoreError, user_service::UserServiceError,
    },
};

pub type AppResult<T> = Result<T, ApiError>;

/// Handler-boundary error. Everything a handler can fail with is mapped here
/// and serialized as the generic JSON error body; upstream internals are
/// never forwarded to clients.
#[derive(Debug, Error)]
#[error("{status}: {message}")]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(ErrorResponse::new(self.message))).into_response()
    }
}

impl From<ChatServiceError> for ApiError {
    fn from(err: ChatServiceError) -> Self {
        match err {
            ChatServiceError::Validation(message) => Self::bad_request(message),
            ChatServiceError::NotFound(message) => Self::not_found(message),
            ChatServiceError::Upstream(_) => {
                Self::internal_server_error("assistant service unavailable")
            }
            ChatServiceError::Store(_) => Self::internal_server_error("internal server error"),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::not_found("Thread not found"),
            StoreError::DuplicateId(_) | StoreError::Database(_) => {
                Self::internal_server_error("internal server error")
            }
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::DuplicateEmail => Self::bad_request("User already exists"),
            UserServiceError::InvalidCredentials => Self::unauthorized("Invalid credentials"),
            UserServiceError::UnknownEmail => Self::not_found("User not found"),
            UserServiceError::InvalidResetToken => Self::bad_request("Invalid or expired token"),
            UserServiceError::Validation(message) => Self::bad_request(message),
            UserServiceError::Mailer(_) | UserServiceError::Store(_) | UserServiceError::Hash => {
                Self::internal_server_error("Server error")
            }
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(_: CredentialError) -> Self {
        Self::unauthorized("Invalid token")
    }
}
