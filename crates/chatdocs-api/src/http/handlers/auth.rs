//! Registration, login and user administration.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Serialize;

use chatdocs_types::user::{LoginRequest, RegisterUserRequest, User, UserDeleted, UserId};

use crate::http::error::AppError;
use crate::http::extractors::auth::{Caller, RequireAdmin};
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub revoked: u64,
}

/// POST /auth/register - Self-service signup. Always creates a plain `USER`.
pub async fn register(
    State(state): State<AppState>,
    Json(mut body): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), AppError> {
    let start = Instant::now();
    body.role = None;
    let user = state.users.register(body).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user, start))))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let start = Instant::now();
    let issued = state.users.login(body).await?;
    Ok(Json(ApiResponse::success(
        LoginResponse {
            access_token: issued.token,
            token_type: "Bearer",
            user: issued.user,
        },
        start,
    )))
}

/// POST /auth/logout - Revoke every token of the caller.
pub async fn logout(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ApiResponse<LogoutResponse>>, AppError> {
    let start = Instant::now();
    let revoked = state.users.revoke_tokens(caller.user_id).await?;
    Ok(Json(ApiResponse::success(LogoutResponse { revoked }, start)))
}

/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let start = Instant::now();
    let user = state.users.find_user(caller.user_id).await?;
    Ok(Json(ApiResponse::success(user, start)))
}

/// GET /auth/users (admin)
pub async fn list_users(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<ApiResponse<Vec<User>>>, AppError> {
    let start = Instant::now();
    let users = state.users.list_users().await?;
    Ok(Json(ApiResponse::success(users, start)))
}

/// POST /auth/users (admin) - Like register, but honours `role`.
pub async fn add_user(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(body): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), AppError> {
    let start = Instant::now();
    let user = state.users.register(body).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user, start))))
}

/// DELETE /auth/users/{id} (admin) - Cascades over the user's chatbots.
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserDeleted>>, AppError> {
    let start = Instant::now();
    let user_id: UserId = id
        .parse()
        .map_err(|_| AppError::Validation(format!("invalid user id '{id}'")))?;
    tracing::info!(admin_id = %admin.user_id, user_id = %user_id, "Admin requested user deletion");

    let cascade = state.user_deletion.clone();
    let deleted = tokio::spawn(async move { cascade.delete_user(user_id).await })
        .await
        .map_err(|e| AppError::Internal(format!("user deletion task failed: {e}")))??;

    Ok(Json(ApiResponse::success(deleted, start)))
}
