use axum::{extract::State, http::StatusCode};

use crate::{
    AppState,
    auth::{AdminIdentity, DUMMY_HASH},
    error::{AppError, ApiResult},
    models::{LoginRequest, LoginResponse, MeResponse, RegisterRequest, UserInfo},
    repository::NewAdminUser,
    response::{Reply, reply},
};

use super::ValidatedJson;

/// The single answer for every rejected login, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// login
///
/// [Public Route] Exchanges admin credentials for a bearer token.
///
/// An unknown email and a wrong password are indistinguishable to the caller, in the
/// logs and in response time. The last-login touch happens before responding; if it
/// fails the login still succeeds.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Invalid request body or field errors"),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Reply<LoginResponse>> {
    let user = state.repo.find_user_by_email(&req.email).await?;

    // Unknown emails still pay for one verification.
    let stored_hash = user.as_ref().map_or(DUMMY_HASH, |u| u.password_hash.as_str());
    let verified = state.passwords.verify(&req.password, stored_hash);

    let Some(user) = user.filter(|_| verified) else {
        tracing::info!("login rejected");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    };

    let issued = state.tokens.issue(user.id, &user.email)?;

    if let Err(e) = state.repo.touch_last_login(user.id).await {
        tracing::warn!(user_id = user.id, error = %e, "failed to record last login");
    }

    tracing::info!(user_id = user.id, "admin logged in");
    Ok(reply(
        StatusCode::OK,
        "Login successful",
        LoginResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            user: UserInfo::from(&user),
        },
    ))
}

/// register
///
/// [Public Route] Creates a new admin account. Only routed when registration is
/// enabled in configuration.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Admin created", body = UserInfo),
        (status = 400, description = "Field errors or email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<Reply<UserInfo>> {
    if state.repo.email_exists(&req.email).await? {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = state.passwords.hash(&req.password)?;
    let user = state
        .repo
        .create_user(NewAdminUser {
            email: req.email,
            password_hash,
            name: req.name,
        })
        .await?;

    tracing::info!(user_id = user.id, "admin registered");
    Ok(reply(
        StatusCode::CREATED,
        "User created successfully",
        UserInfo::from(&user),
    ))
}

/// me
///
/// [Admin Route] Echoes the identity carried by the bearer token.
#[utoipa::path(
    get,
    path = "/api/admin/me",
    responses(
        (status = 200, description = "Current admin", body = MeResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(admin: AdminIdentity) -> ApiResult<Reply<MeResponse>> {
    Ok(reply(
        StatusCode::OK,
        "Authenticated",
        MeResponse {
            user_id: admin.user_id,
            email: admin.email,
        },
    ))
}
