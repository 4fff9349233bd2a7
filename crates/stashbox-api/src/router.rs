//! Route definitions for the Stashbox HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.
//! The router receives `AppState` and passes it to all handlers via Axum's `State` extractor.

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::services::ServeDir;

use crate::handlers;
use crate::state::AppState;

/// Build the routed application without the outer middleware layers.
///
/// The local fallback directory is served statically under
/// `storage.local.public_url_prefix`, so local access URLs resolve.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(folder_routes())
        .merge(file_routes())
        .merge(share_routes())
        .merge(public_routes())
        .merge(analytics_routes())
        .merge(health_routes());

    let static_prefix = state.config.storage.local.public_url_prefix.clone();
    let uploads = ServeDir::new(state.storage.local().root());

    Router::new()
        .nest("/api", api_routes)
        .nest_service(&static_prefix, uploads)
        .with_state(state)
}

/// Auth endpoints: register, login, me, password
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/password", put(handlers::auth::change_password))
}

/// Folder CRUD, contents and hierarchy
fn folder_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/folders",
            get(handlers::folder::list_root_folders).post(handlers::folder::create_folder),
        )
        .route("/folders/tree", get(handlers::folder::get_tree))
        .route("/folders/contents", get(handlers::folder::root_contents))
        .route(
            "/folders/{id}",
            get(handlers::folder::get_folder)
                .put(handlers::folder::rename_folder)
                .delete(handlers::folder::delete_folder),
        )
        .route("/folders/{id}/children", get(handlers::folder::list_children))
        .route("/folders/{id}/contents", get(handlers::folder::folder_contents))
        .route("/folders/{id}/path", get(handlers::folder::get_path))
        .route("/folders/{id}/move", put(handlers::folder::move_folder))
}

/// File catalog, upload, download, preview
fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/files", get(handlers::file::list_files))
        .route("/files/upload", post(handlers::file::upload_files))
        .route(
            "/files/{id}",
            get(handlers::file::get_file)
                .put(handlers::file::rename_file)
                .delete(handlers::file::delete_file),
        )
        .route("/files/{id}/move", put(handlers::file::move_file))
        .route("/files/{id}/visibility", put(handlers::file::set_visibility))
        .route("/files/{id}/download", get(handlers::file::download_file))
        .route("/files/{id}/preview", get(handlers::file::preview_file))
        .route("/files/{id}/shares", get(handlers::file::list_file_shares))
}

/// Share link management for owners
fn share_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/shares",
            get(handlers::share::list_shares).post(handlers::share::create_share),
        )
        .route(
            "/shares/{token}",
            axum::routing::delete(handlers::share::revoke_share),
        )
}

/// Anonymous share access
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/s/{token}", get(handlers::public::share_info))
        .route("/s/{token}/download", post(handlers::public::share_download))
}

/// Analytics reports
fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/analytics/dashboard", get(handlers::analytics::dashboard))
        .route("/analytics/storage", get(handlers::analytics::storage_usage))
        .route("/analytics/shares/{id}", get(handlers::analytics::share_stats))
        .route(
            "/analytics/shares/{id}/timeline",
            get(handlers::analytics::share_timeline),
        )
        .route("/analytics/files/{id}", get(handlers::analytics::file_stats))
}

/// Health check
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
