//! Folder CRUD and hierarchy handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use uuid::Uuid;

use stashbox_entity::folder::{Folder, FolderTree};
use stashbox_service::folder::FolderContents;

use crate::dto::request::{CreateFolderRequest, MoveFolderRequest, RenameRequest};
use crate::dto::response::{ApiResponse, DeletedResponse};
use crate::error::ApiResult;
use crate::extractors::{AppJson, AppPath, AuthUser};
use crate::state::AppState;

/// GET /api/folders
pub async fn list_root_folders(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<Folder>>>> {
    let folders = state.folder_service.list_children(&auth, None).await?;
    Ok(Json(ApiResponse::ok(folders)))
}

/// POST /api/folders
pub async fn create_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(req): AppJson<CreateFolderRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Folder>>)> {
    let folder = state
        .folder_service
        .create(&auth, &req.name, req.parent_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(folder))))
}

/// GET /api/folders/tree
pub async fn get_tree(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<FolderTree>>> {
    let tree = state.folder_service.tree_of(&auth).await?;
    Ok(Json(ApiResponse::ok(tree)))
}

/// GET /api/folders/contents
pub async fn root_contents(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<FolderContents>>> {
    let contents = state.folder_service.contents(&auth, None).await?;
    Ok(Json(ApiResponse::ok(contents)))
}

/// GET /api/folders/{id}
pub async fn get_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<ApiResponse<Folder>>> {
    let folder = state.folder_service.get(&auth, id).await?;
    Ok(Json(ApiResponse::ok(folder)))
}

/// GET /api/folders/{id}/children
pub async fn list_children(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<Folder>>>> {
    let folders = state.folder_service.list_children(&auth, Some(id)).await?;
    Ok(Json(ApiResponse::ok(folders)))
}

/// GET /api/folders/{id}/contents
pub async fn folder_contents(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<ApiResponse<FolderContents>>> {
    let contents = state.folder_service.contents(&auth, Some(id)).await?;
    Ok(Json(ApiResponse::ok(contents)))
}

/// GET /api/folders/{id}/path
pub async fn get_path(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<Folder>>>> {
    let path = state.folder_service.path_of(&auth, id).await?;
    Ok(Json(ApiResponse::ok(path)))
}

/// PUT /api/folders/{id}
pub async fn rename_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<RenameRequest>,
) -> ApiResult<Json<ApiResponse<Folder>>> {
    let folder = state.folder_service.rename(&auth, id, &req.name).await?;
    Ok(Json(ApiResponse::ok(folder)))
}

/// PUT /api/folders/{id}/move
pub async fn move_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<MoveFolderRequest>,
) -> ApiResult<Json<ApiResponse<Folder>>> {
    let folder = state
        .folder_service
        .move_to(&auth, id, req.parent_id)
        .await?;
    Ok(Json(ApiResponse::ok(folder)))
}

/// DELETE /api/folders/{id}
///
/// Children are reparented to the root, not deleted.
pub async fn delete_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<ApiResponse<DeletedResponse>>> {
    let deleted = state.folder_service.delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(DeletedResponse { deleted })))
}
