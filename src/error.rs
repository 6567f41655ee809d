use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    auth::AuthError, images::ImageHostError, repository::RepoError, response::ApiResponse,
    storage::StorageError, validation::FieldError,
};

/// AppError
///
/// The HTTP boundary of the error taxonomy. Handlers return `Result<_, AppError>` and
/// every lower-layer error is mapped into one of these variants, so nothing reaches the
/// transport layer unhandled. `Internal` never exposes its cause to the client.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// No usable credential on the request.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Credentials were presented and rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// `public` goes to the client, `cause` only to the log.
    #[error("internal error: {cause}")]
    Internal { public: String, cause: String },
}

pub type ApiResult<T> = Result<T, AppError>;

impl AppError {
    pub fn internal(public: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Internal {
            public: public.into(),
            cause: cause.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) | Self::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthenticated(_) | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Validation(errors) => ApiResponse::failure("Validation failed", Some(errors)),
            Self::BadRequest(message)
            | Self::Unauthenticated(message)
            | Self::Unauthorized(message)
            | Self::NotFound(message)
            | Self::Conflict(message) => ApiResponse::failure(message, None),
            Self::Internal { public, cause } => {
                tracing::error!(error = %cause, "{}", public);
                ApiResponse::failure(public, None)
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => {
                Self::Unauthenticated("Authorization header required".into())
            }
            AuthError::InvalidScheme => {
                Self::Unauthenticated("Invalid authorization format".into())
            }
            AuthError::Expired | AuthError::Malformed => {
                Self::Unauthenticated("Invalid or expired token".into())
            }
            AuthError::Signing(cause) => Self::internal("Failed to generate token", cause),
            AuthError::Hashing(cause) => Self::internal("Failed to hash password", cause),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Conflict(message) => Self::Conflict(message),
            RepoError::MissingParent(message) => Self::NotFound(message),
            RepoError::Database(cause) => Self::internal("Database error", cause),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::TooLarge { .. } | StorageError::UnsupportedType(_) => {
                Self::BadRequest(err.to_string())
            }
            StorageError::Io(cause) => Self::internal("Failed to store file", cause),
        }
    }
}

impl From<ImageHostError> for AppError {
    fn from(err: ImageHostError) -> Self {
        Self::internal("Failed to upload image", err)
    }
}
