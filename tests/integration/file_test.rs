//! Uploads, catalog edits, owner downloads and deletes.

use axum::body::Body;
use http::{Request, StatusCode, header};
use serde_json::json;
use tower::ServiceExt;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_upload_accepts_and_rejects_per_file() {
    let app = TestApp::new().await;
    let token = app.register_and_login("uploader@example.com").await;

    let response = app
        .upload(
            &token,
            None,
            &[("notes.txt", &b"plain text"[..]), ("run.exe", &b"MZ..."[..])],
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

    let uploaded = response.data()["uploaded"].as_array().unwrap();
    let failed = response.data()["failed"].as_array().unwrap();
    assert_eq!(uploaded.len(), 1);
    assert_eq!(uploaded[0]["file_name"], "notes.txt");
    assert_eq!(uploaded[0]["size_bytes"], 10);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["file_name"], "run.exe");

    let listing = app.request("GET", "/api/files", None, Some(&token)).await;
    assert_eq!(listing.status, StatusCode::OK);
    assert_eq!(listing.data().as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_upload_with_only_rejected_files_fails() {
    let app = TestApp::new().await;
    let token = app.register_and_login("rejected@example.com").await;

    let response = app.upload(&token, None, &[("virus.exe", &b"MZ"[..])]).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION");

    let response = app.upload(&token, None, &[]).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_owner_download_redirects_to_served_copy() {
    let app = TestApp::new().await;
    let token = app.register_and_login("downloader@example.com").await;
    let file_id = app.upload_one(&token, None, "hello.txt").await;

    let response = app
        .request("GET", &format!("/api/files/{file_id}/download"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers[header::LOCATION].to_str().unwrap().to_string();
    assert!(location.starts_with("/static/uploads/"), "{location}");

    let served = app
        .router
        .clone()
        .oneshot(Request::builder().uri(&location).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(served.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(served.into_body(), 1024).await.unwrap();
    assert_eq!(&bytes[..], b"hello stashbox");
}

#[tokio::test]
async fn test_rename_move_and_visibility() {
    let app = TestApp::new().await;
    let token = app.register_and_login("editor@example.com").await;
    let folder = app.create_folder(&token, "Docs", None).await;
    let file_id = app.upload_one(&token, None, "draft.txt").await;

    let response = app
        .request(
            "PUT",
            &format!("/api/files/{file_id}"),
            Some(json!({ "name": "final.txt" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["file_name"], "final.txt");

    let response = app
        .request(
            "PUT",
            &format!("/api/files/{file_id}/move"),
            Some(json!({ "folder_id": folder })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["folder_id"], folder.as_str());

    let response = app
        .request(
            "PUT",
            &format!("/api/files/{file_id}/visibility"),
            Some(json!({ "is_public": true })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["is_public"], true);

    let in_folder = app
        .request("GET", &format!("/api/files?folder_id={folder}"), None, Some(&token))
        .await;
    assert_eq!(in_folder.data().as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_preview_reports_kind_and_size() {
    let app = TestApp::new().await;
    let token = app.register_and_login("preview@example.com").await;
    let file_id = app.upload_one(&token, None, "photo.png").await;

    let response = app
        .request("GET", &format!("/api/files/{file_id}/preview"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.data()["preview_available"], true);
    assert_eq!(response.data()["formatted_size"], "14.0 B");
}

#[tokio::test]
async fn test_delete_removes_file_and_its_links() {
    let app = TestApp::new().await;
    let token = app.register_and_login("deleter@example.com").await;
    let file_id = app.upload_one(&token, None, "old.txt").await;
    let share = app
        .issue_share(&token, json!({ "file_id": file_id }))
        .await;

    let response = app
        .request("DELETE", &format!("/api/files/{file_id}"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request("GET", &format!("/api/files/{file_id}"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app.request("GET", &format!("/api/s/{share}"), None, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .request("DELETE", &format!("/api/files/{file_id}"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_foreign_file_is_forbidden() {
    let app = TestApp::new().await;
    let owner = app.register_and_login("fileowner@example.com").await;
    let intruder = app.register_and_login("fileintruder@example.com").await;
    let file_id = app.upload_one(&owner, None, "secret.txt").await;

    for (method, path) in [
        ("GET", format!("/api/files/{file_id}")),
        ("GET", format!("/api/files/{file_id}/download")),
        ("DELETE", format!("/api/files/{file_id}")),
    ] {
        let response = app.request(method, &path, None, Some(&intruder)).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "{method} {path}");
    }
}
