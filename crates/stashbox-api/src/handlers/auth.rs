//! Registration, login and account handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use validator::Validate;

use stashbox_core::error::AppError;
use stashbox_entity::user::User;
use stashbox_service::user::{LoginResponse, RegisterRequest};

use crate::dto::request::{ChangePasswordRequest, LoginRequest};
use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiResult;
use crate::extractors::{AppJson, AuthUser, Client};
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<User>>)> {
    let user = state.identity_service.register(req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(user))))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Client(client): Client,
    AppJson(req): AppJson<LoginRequest>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    req.validate()
        .map_err(|e| AppError::validation(format!("Invalid login request: {e}")))?;

    let response = state
        .identity_service
        .login(&req.email, &req.password, &client)
        .await?;
    Ok(Json(ApiResponse::ok(response)))
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<ApiResponse<User>>> {
    let user = state.identity_service.current_user(&auth).await?;
    Ok(Json(ApiResponse::ok(user)))
}

/// PUT /api/auth/password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(req): AppJson<ChangePasswordRequest>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    req.validate()
        .map_err(|e| AppError::validation(format!("Invalid password change: {e}")))?;

    state
        .identity_service
        .change_password(
            &auth,
            &req.current_password,
            &req.new_password,
            &req.confirm_password,
        )
        .await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Password changed"))))
}
