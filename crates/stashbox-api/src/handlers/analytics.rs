//! Analytics read endpoints. Every report is scoped to the caller.

use axum::Json;
use axum::extract::State;
use uuid::Uuid;

use stashbox_entity::analytics::{DailyCount, FileStats};
use stashbox_service::analytics::{ShareReport, StorageUsage, UserDashboard};

use crate::dto::request::TimelineQuery;
use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::extractors::{AppPath, AppQuery, AuthUser};
use crate::state::AppState;

/// GET /api/analytics/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<UserDashboard>>> {
    let dashboard = state.analytics_service.dashboard(auth.user_id).await?;
    Ok(Json(ApiResponse::ok(dashboard)))
}

/// GET /api/analytics/storage
pub async fn storage_usage(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<StorageUsage>>> {
    let usage = state.analytics_service.storage_usage(auth.user_id).await?;
    Ok(Json(ApiResponse::ok(usage)))
}

/// GET /api/analytics/shares/{id}
pub async fn share_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<ApiResponse<ShareReport>>> {
    let report = state.analytics_service.share_stats(id, auth.user_id).await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// GET /api/analytics/shares/{id}/timeline?days=7
pub async fn share_timeline(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppQuery(query): AppQuery<TimelineQuery>,
) -> ApiResult<Json<ApiResponse<Vec<DailyCount>>>> {
    let timeline = state
        .analytics_service
        .share_timeline(id, auth.user_id, query.days)
        .await?;
    Ok(Json(ApiResponse::ok(timeline)))
}

/// GET /api/analytics/files/{id}
pub async fn file_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<ApiResponse<FileStats>>> {
    let stats = state.analytics_service.file_stats(id, auth.user_id).await?;
    Ok(Json(ApiResponse::ok(stats)))
}
