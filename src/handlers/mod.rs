//! HTTP handlers. Each submodule owns one resource; the helpers here are the request
//! side of the envelope contract (body parsing, validation, path ids).

use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{error::AppError, repository::RepoError, validation::collect_field_errors};

pub mod auth;
pub mod contact;
pub mod gallery;
pub mod health;
pub mod portfolio;
pub mod upload;

/// JsonBody
///
/// `axum::Json` with the rejection mapped into the envelope: any body that is not
/// well-formed JSON of the expected shape is a 400 "Invalid request body".
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(reason = %rejection.body_text(), "rejected request body");
                Err(AppError::BadRequest("Invalid request body".into()))
            }
        }
    }
}

/// ValidatedJson
///
/// `JsonBody` followed by the payload's `validator` rules. Field errors are aggregated
/// into a single 400 response.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let JsonBody(value) = JsonBody::<T>::from_request(req, state).await?;
        validate_payload(&value)?;
        Ok(Self(value))
    }
}

/// Runs the payload's rules, for handlers that must normalize a body before checking it.
pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload
        .validate()
        .map_err(|errors| AppError::Validation(collect_field_errors(&errors)))
}

/// Parses a numeric path id, answering 400 with `message` when it is not one.
pub fn parse_id(raw: &str, message: &str) -> Result<i32, AppError> {
    raw.parse::<i32>()
        .map_err(|_| AppError::BadRequest(message.to_string()))
}

/// Maps a repository failure for one endpoint: conflicts and missing parents keep their
/// own status, database errors become a 500 carrying `public`.
pub fn repo_failure(public: &'static str) -> impl Fn(RepoError) -> AppError {
    move |err| match err {
        RepoError::Database(cause) => AppError::internal(public, cause),
        other => other.into(),
    }
}
