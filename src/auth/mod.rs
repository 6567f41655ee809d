//! Admin authentication: token issuing and verification, password hashing, and the
//! `AdminIdentity` extractor that guards every `/api/admin` route.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use thiserror::Error;

use crate::error::AppError;

pub mod password;
pub mod token;

pub use password::{Argon2Hasher, DUMMY_HASH, PasswordHasher};
pub use token::{Claims, Identity, IssuedToken, TokenService};

/// Shared handle to the token service, pulled out of `AppState` via `FromRef`.
pub type TokenState = Arc<TokenService>;

/// Shared handle to the password hasher.
pub type PasswordState = Arc<dyn PasswordHasher>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingCredentials,

    #[error("authorization header is not a bearer token")]
    InvalidScheme,

    #[error("token expired")]
    Expired,

    #[error("token malformed or signature invalid")]
    Malformed,

    #[error("failed to sign token: {0}")]
    Signing(String),

    #[error("failed to hash password: {0}")]
    Hashing(String),
}

/// AdminIdentity
///
/// The resolved identity of an authenticated admin request. Taking it as a handler
/// argument is enough to protect the handler; the admin router also runs it as a
/// route layer so no admin route can be added unguarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub user_id: i32,
    pub email: String,
}

impl From<Identity> for AdminIdentity {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.user_id,
            email: identity.email,
        }
    }
}

/// AdminIdentity Extractor Implementation
///
/// 1. Reads the `Authorization` header (missing -> 401 "Authorization header required").
/// 2. Requires the `Bearer ` prefix (otherwise 401 "Invalid authorization format").
/// 3. Verifies signature and expiry (otherwise 401 "Invalid or expired token").
///
/// The token alone is trusted: there is no per-request database lookup.
impl<S> FromRequestParts<S> for AdminIdentity
where
    S: Send + Sync,
    TokenState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<AdminIdentity>() {
            return Ok(identity.clone());
        }

        let tokens = TokenState::from_ref(state);
        let token = bearer_token(parts)?;
        let identity: AdminIdentity = tokens.verify(token)?.into();

        tracing::debug!(user_id = identity.user_id, "admin request authenticated");
        parts.extensions.insert(identity.clone());
        Ok(identity)
    }
}

/// require_admin
///
/// Route layer for the admin router (`middleware::from_fn_with_state`). Resolving
/// `AdminIdentity` is the whole check: when it fails the handler is never invoked.
pub async fn require_admin(_admin: AdminIdentity, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// Pulls the raw token out of `Authorization: Bearer <token>`.
pub fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidScheme)?;

    header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidScheme)
}
