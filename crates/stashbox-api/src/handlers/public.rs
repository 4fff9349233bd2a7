//! Anonymous share access. No bearer token; the link token is the credential.

use axum::Json;
use axum::extract::State;
use bytes::Bytes;

use stashbox_core::error::AppError;
use stashbox_service::share::SharePreview;

use crate::dto::request::ShareDownloadRequest;
use crate::dto::response::{ApiResponse, ShareDownloadResponse};
use crate::error::ApiResult;
use crate::extractors::{AppPath, Client};
use crate::state::AppState;

/// GET /api/s/{token}
pub async fn share_info(
    State(state): State<AppState>,
    AppPath(token): AppPath<String>,
) -> ApiResult<Json<ApiResponse<SharePreview>>> {
    let preview = state.access_service.inspect(&token).await?;
    Ok(Json(ApiResponse::ok(preview)))
}

/// POST /api/s/{token}/download
///
/// Body is optional JSON `{ "password": "..." }`.
pub async fn share_download(
    State(state): State<AppState>,
    AppPath(token): AppPath<String>,
    Client(client): Client,
    body: Bytes,
) -> ApiResult<Json<ApiResponse<ShareDownloadResponse>>> {
    let req: ShareDownloadRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ShareDownloadRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::validation(format!("Invalid request body: {e}")))?
    };

    let granted = state
        .access_service
        .download(&token, req.password.as_deref(), &client)
        .await?;

    Ok(Json(ApiResponse::ok(ShareDownloadResponse::new(
        granted.file,
        &granted.access,
        granted.download_count,
    ))))
}
