/// Authentication endpoints
///
/// - `POST /v1/auth/register` - create an account and receive tokens
/// - `POST /v1/auth/login` - exchange credentials for tokens
/// - `POST /v1/auth/refresh` - exchange a refresh token for a new pair
///
/// Tokens are HS256 JWTs. The access token (24h) goes in
/// `Authorization: Bearer <token>`; the refresh token (30d) is only accepted
/// here.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidJson,
    validation::not_blank,
};
use axum::{extract::State, http::StatusCode, Json};
use chorely_shared::{
    auth::{
        jwt::{self, TokenPair},
        password,
        session::AuthError,
    },
    models::user::{CreateUser, User, UserRole},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"),
        custom(function = "not_blank")
    )]
    pub name: String,

    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,

    #[validate(length(min = 6, max = 100, message = "Password must be between 6 and 100 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Account plus a fresh token pair
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,

    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Registers a new account
///
/// Emails listed in `ADMIN_EMAILS` receive the admin role.
///
/// # Errors
///
/// - `400 Bad Request`: validation failed
/// - `409 Conflict`: email already registered (case-insensitive)
pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let email = req.email.trim().to_string();
    let role = if state.config.auth.is_admin_email(&email) {
        UserRole::Admin
    } else {
        UserRole::User
    };

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name.trim().to_string(),
            email,
            password_hash,
            role,
        },
    )
    .await?;

    let tokens = jwt::issue_token_pair(user.id, user.role, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "User registered");
    Ok((StatusCode::CREATED, Json(AuthResponse { user, tokens })))
}

/// Verifies credentials and issues tokens
///
/// Unknown emails and wrong passwords produce the same 401 and take the same
/// time.
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let user = User::find_by_email(&state.db, req.email.trim()).await?;

    let valid = match &user {
        Some(user) => password::verify_password(&req.password, &user.password_hash)?,
        None => password::verify_without_account(&req.password)?,
    };

    let user = match user {
        Some(user) if valid => user,
        _ => {
            tracing::debug!("Login rejected");
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    let tokens = jwt::issue_token_pair(user.id, user.role, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(AuthResponse { user, tokens }))
}

/// Exchanges a refresh token for a new token pair
///
/// The account is reloaded, so a role change made by an admin is reflected in
/// the new tokens.
pub async fn refresh(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    let tokens = jwt::issue_token_pair(user.id, user.role, state.jwt_secret())?;

    tracing::debug!(user_id = %user.id, "Tokens refreshed");
    Ok(Json(tokens))
}
