//! File catalog, upload, download and preview handlers.

use axum::Json;
use axum::extract::{Multipart, State};
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::Redirect;
use uuid::Uuid;

use stashbox_core::error::AppError;
use stashbox_entity::file::File;
use stashbox_service::file::{FilePreview, UploadItem, UploadReport};
use stashbox_service::share::IssuedShare;

use crate::dto::request::{ListFilesQuery, MoveFileRequest, RenameRequest, VisibilityRequest};
use crate::dto::response::{ApiResponse, DeletedResponse};
use crate::error::ApiResult;
use crate::extractors::{AppJson, AppPath, AppQuery, AuthUser};
use crate::state::AppState;

fn multipart_error(err: MultipartError) -> AppError {
    AppError::validation(format!("Malformed upload: {}", err.body_text()))
}

/// POST /api/files/upload
///
/// Multipart form with any number of `file` parts and an optional
/// `folder_id` text part. Each file is accepted or rejected on its own.
pub async fn upload_files(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ApiResponse<UploadReport>>)> {
    let mut folder_id: Option<Uuid> = None;
    let mut items = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("folder_id") => {
                let raw = field.text().await.map_err(multipart_error)?;
                let raw = raw.trim();
                if !raw.is_empty() {
                    let id = raw
                        .parse::<Uuid>()
                        .map_err(|_| AppError::validation("Invalid folder_id"))?;
                    folder_id = Some(id);
                }
            }
            Some("file") | Some("files") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(String::from);
                let data = field.bytes().await.map_err(multipart_error)?;
                items.push(UploadItem {
                    file_name,
                    content_type,
                    data,
                });
            }
            _ => {}
        }
    }

    let report = state
        .upload_service
        .upload_many(&auth, folder_id, items)
        .await?;

    if report.uploaded.is_empty() {
        let reasons: Vec<String> = report
            .failed
            .iter()
            .map(|f| format!("{}: {}", f.file_name, f.reason))
            .collect();
        return Err(AppError::validation(reasons.join("; ")).into());
    }

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(report))))
}

/// GET /api/files?folder_id=...&all=true
pub async fn list_files(
    State(state): State<AppState>,
    auth: AuthUser,
    AppQuery(query): AppQuery<ListFilesQuery>,
) -> ApiResult<Json<ApiResponse<Vec<File>>>> {
    let files = if query.all {
        state.file_service.list_all(&auth).await?
    } else {
        state.file_service.list(&auth, query.folder_id).await?
    };
    Ok(Json(ApiResponse::ok(files)))
}

/// GET /api/files/{id}
pub async fn get_file(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<ApiResponse<File>>> {
    let file = state.file_service.get(&auth, id).await?;
    Ok(Json(ApiResponse::ok(file)))
}

/// PUT /api/files/{id}
pub async fn rename_file(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<RenameRequest>,
) -> ApiResult<Json<ApiResponse<File>>> {
    let file = state.file_service.rename(&auth, id, &req.name).await?;
    Ok(Json(ApiResponse::ok(file)))
}

/// PUT /api/files/{id}/move
pub async fn move_file(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<MoveFileRequest>,
) -> ApiResult<Json<ApiResponse<File>>> {
    let file = state
        .file_service
        .move_to_folder(&auth, id, req.folder_id)
        .await?;
    Ok(Json(ApiResponse::ok(file)))
}

/// PUT /api/files/{id}/visibility
pub async fn set_visibility(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<VisibilityRequest>,
) -> ApiResult<Json<ApiResponse<File>>> {
    let file = state
        .file_service
        .set_public(&auth, id, req.is_public)
        .await?;
    Ok(Json(ApiResponse::ok(file)))
}

/// DELETE /api/files/{id}
pub async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<ApiResponse<DeletedResponse>>> {
    state.file_service.delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(DeletedResponse { deleted: true })))
}

/// GET /api/files/{id}/download
///
/// Redirects to a presigned URL or to the static local copy.
pub async fn download_file(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Redirect> {
    let result = state.download_service.download(&auth, id).await?;
    Ok(Redirect::temporary(result.access.url()))
}

/// GET /api/files/{id}/preview
pub async fn preview_file(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<ApiResponse<FilePreview>>> {
    let preview = state.preview_service.preview(&auth, id).await?;
    Ok(Json(ApiResponse::ok(preview)))
}

/// GET /api/files/{id}/shares
pub async fn list_file_shares(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<IssuedShare>>>> {
    let shares = state.share_service.list_for_file(&auth, id).await?;
    Ok(Json(ApiResponse::ok(shares)))
}
