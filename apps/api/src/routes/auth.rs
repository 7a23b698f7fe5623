//! # Auth Routes
//!
//! Registration, login, token verification, and account management.
//! Password hashes never leave the backend; the `User` type skips the hash
//! during serialization.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use aurum_core::validation::{validate_email, validate_password, validate_user_name};
use aurum_core::{Role, User};

use crate::auth::{hash_password, verify_password, AuthUser};
use crate::error::{ApiError, ApiJson};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub message: String,
    pub token: String,
    pub user: User,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Serialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    debug!(email = %body.email, "register");

    validate_user_name(&body.name)?;
    validate_email(&body.email)?;
    validate_password(&body.password)?;

    let email = body.email.trim().to_lowercase();

    if state.db.users().email_exists(&email).await? {
        return Err(ApiError::conflict("Email is already registered"));
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: body.name.trim().to_string(),
        email,
        password_hash: hash_password(&body.password)?,
        role: body.role.unwrap_or_default(),
        last_login: None,
        created_at: now,
        updated_at: now,
    };

    state.db.users().insert(&user).await?;

    let token = state.jwt.issue(&user.id, &user.email, user.role)?;

    info!(id = %user.id, email = %user.email, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            message: "User registered successfully".to_string(),
            token,
            user,
        }),
    ))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    debug!(email = %body.email, "login");

    let email = body.email.trim().to_lowercase();

    // A missing user and a bad password answer identically so the endpoint
    // cannot be used to probe for registered emails.
    let user = state
        .db
        .users()
        .get_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    if !verify_password(&body.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    state.db.users().touch_last_login(&user.id).await?;

    let token = state.jwt.issue(&user.id, &user.email, user.role)?;

    info!(id = %user.id, "User logged in");

    Ok(Json(TokenResponse {
        message: "Login successful".to_string(),
        token,
        user,
    }))
}

/// `GET /api/auth/verify` - returns the current user for a valid token.
pub async fn verify(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .users()
        .get_by_id(&auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", &auth.id))?;

    Ok(Json(UserResponse { user }))
}

/// `POST /api/auth/logout`
///
/// Tokens are stateless; logout is an acknowledgement, the client discards
/// the token.
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Logged out".to_string(),
    })
}

/// `POST /api/auth/change-password`
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    debug!(id = %auth.id, "change_password");

    validate_password(&body.new_password)?;

    let user = state
        .db
        .users()
        .get_by_id(&auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", &auth.id))?;

    if !verify_password(&body.current_password, &user.password_hash) {
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }

    let hash = hash_password(&body.new_password)?;
    state.db.users().update_password(&user.id, &hash).await?;

    info!(id = %user.id, "Password changed");

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}

/// `GET /api/auth/users` - ADMIN only.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UsersResponse>, ApiError> {
    if auth.role != Role::Admin {
        return Err(ApiError::forbidden("Administrator access required"));
    }

    let users = state.db.users().list().await?;
    Ok(Json(UsersResponse { users }))
}
