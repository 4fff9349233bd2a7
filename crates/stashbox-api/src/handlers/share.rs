//! Share link management for the owning user.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use stashbox_service::share::{IssueShareRequest, IssuedShare};

use crate::dto::response::{ApiResponse, DeletedResponse};
use crate::error::ApiResult;
use crate::extractors::{AppJson, AppPath, AuthUser};
use crate::state::AppState;

/// GET /api/shares
pub async fn list_shares(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<IssuedShare>>>> {
    let shares = state.share_service.list_for_owner(&auth).await?;
    Ok(Json(ApiResponse::ok(shares)))
}

/// POST /api/shares
pub async fn create_share(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(req): AppJson<IssueShareRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<IssuedShare>>)> {
    let share = state.share_service.issue(&auth, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(share))))
}

/// DELETE /api/shares/{token}
pub async fn revoke_share(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(token): AppPath<String>,
) -> ApiResult<Json<ApiResponse<DeletedResponse>>> {
    let deleted = state.share_service.revoke(&auth, &token).await?;
    Ok(Json(ApiResponse::ok(DeletedResponse { deleted })))
}
