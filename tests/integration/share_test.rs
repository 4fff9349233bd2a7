//! Share link issuance, public access and revocation.

use chrono::{Duration, Utc};
use http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use stashbox_entity::share::ShareLink;

use crate::helpers::TestApp;

async fn owner_with_file(app: &TestApp, email: &str) -> (String, String) {
    let token = app.register_and_login(email).await;
    let file_id = app.upload_one(&token, None, "report.pdf").await;
    (token, file_id)
}

fn seeded_link(file_id: &str, token: &str, expires_in: Duration, is_active: bool) -> ShareLink {
    ShareLink {
        id: Uuid::new_v4(),
        file_id: file_id.parse().unwrap(),
        token: token.to_string(),
        expires_at: Utc::now() + expires_in,
        password_hash: None,
        max_downloads: None,
        download_count: 0,
        is_active,
        created_at: Utc::now() - Duration::days(2),
    }
}

#[tokio::test]
async fn test_issue_then_resolve_returns_same_file() {
    let app = TestApp::new().await;
    let (token, file_id) = owner_with_file(&app, "sharer@example.com").await;

    let response = app
        .request("POST", "/api/shares", Some(json!({ "file_id": file_id })), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let share_token = response.data()["token"].as_str().unwrap().to_string();
    assert_eq!(share_token.len(), 32);
    assert!(share_token.chars().all(|c| c.is_ascii_alphanumeric()));
    let url = response.data()["url"].as_str().unwrap().to_string();
    assert_eq!(url, format!("https://stash.test/api/s/{share_token}"));

    let share_path = url.trim_start_matches("https://stash.test");
    let info = app.request("GET", share_path, None, None).await;
    assert_eq!(info.status, StatusCode::OK);
    assert_eq!(info.data()["file_name"], "report.pdf");
    assert_eq!(info.data()["password_required"], false);

    let download = app
        .request("POST", &format!("/api/s/{share_token}/download"), None, None)
        .await;
    assert_eq!(download.status, StatusCode::OK, "{:?}", download.body);
    assert_eq!(download.data()["file"]["id"], file_id.as_str());
    assert_eq!(download.data()["download_count"], 1);
    assert!(download.data()["url"].as_str().unwrap().starts_with("/static/uploads/"));
}

#[tokio::test]
async fn test_download_limit_is_enforced() {
    let app = TestApp::new().await;
    let (token, file_id) = owner_with_file(&app, "limits@example.com").await;
    let share = app
        .issue_share(&token, json!({ "file_id": file_id, "max_downloads": 2 }))
        .await;
    let path = format!("/api/s/{share}/download");

    for expected in 1..=2 {
        let response = app.request("POST", &path, None, None).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.data()["download_count"], expected);
    }

    let response = app.request("POST", &path, None, None).await;
    assert_eq!(response.status, StatusCode::GONE);
    assert_eq!(response.error_code(), "DOWNLOAD_LIMIT_REACHED");
}

#[tokio::test]
async fn test_password_protected_link() {
    let app = TestApp::new().await;
    let (token, file_id) = owner_with_file(&app, "locked@example.com").await;
    let share = app
        .issue_share(&token, json!({ "file_id": file_id, "password": "s3cret" }))
        .await;
    let path = format!("/api/s/{share}/download");

    let info = app.request("GET", &format!("/api/s/{share}"), None, None).await;
    assert_eq!(info.data()["password_required"], true);

    let response = app.request("POST", &path, None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "PASSWORD_REQUIRED");

    let response = app
        .request("POST", &path, Some(json!({ "password": "guess" })), None)
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), "WRONG_PASSWORD");

    let response = app
        .request("POST", &path, Some(json!({ "password": "s3cret" })), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_password_with_trailing_space_round_trips() {
    let app = TestApp::new().await;
    let (token, file_id) = owner_with_file(&app, "spaces@example.com").await;
    let share = app
        .issue_share(&token, json!({ "file_id": file_id, "password": "secret pass " }))
        .await;
    let path = format!("/api/s/{share}/download");

    let response = app
        .request("POST", &path, Some(json!({ "password": "secret pass " })), None)
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
}

#[tokio::test]
async fn test_expiry_wins_over_revocation() {
    let app = TestApp::new().await;
    let (_token, file_id) = owner_with_file(&app, "expired@example.com").await;

    app.memory.put_share_link(seeded_link(
        &file_id,
        "expiredAndRevoked0000000000000000",
        Duration::hours(-1),
        false,
    ));

    let response = app
        .request("POST", "/api/s/expiredAndRevoked0000000000000000/download", None, None)
        .await;
    assert_eq!(response.status, StatusCode::GONE);
    assert_eq!(response.error_code(), "EXPIRED");
}

#[tokio::test]
async fn test_revoke_is_idempotent_and_blocks_access() {
    let app = TestApp::new().await;
    let (token, file_id) = owner_with_file(&app, "revoker@example.com").await;
    let share = app.issue_share(&token, json!({ "file_id": file_id })).await;

    let response = app
        .request("DELETE", &format!("/api/shares/{share}"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["deleted"], true);

    let response = app
        .request("POST", &format!("/api/s/{share}/download"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::GONE);
    assert_eq!(response.error_code(), "REVOKED");

    let response = app
        .request("DELETE", &format!("/api/shares/{share}"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["deleted"], false);
}

#[tokio::test]
async fn test_only_the_owner_manages_links() {
    let app = TestApp::new().await;
    let (token, file_id) = owner_with_file(&app, "linkowner@example.com").await;
    let intruder = app.register_and_login("linkintruder@example.com").await;

    let response = app
        .request("POST", "/api/shares", Some(json!({ "file_id": file_id })), Some(&intruder))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let share = app.issue_share(&token, json!({ "file_id": file_id })).await;
    let response = app
        .request("DELETE", &format!("/api/shares/{share}"), None, Some(&intruder))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let mine = app.request("GET", "/api/shares", None, Some(&token)).await;
    assert_eq!(mine.data().as_array().unwrap().len(), 1);
    let theirs = app.request("GET", "/api/shares", None, Some(&intruder)).await;
    assert!(theirs.data().as_array().unwrap().is_empty());

    let for_file = app
        .request("GET", &format!("/api/files/{file_id}/shares"), None, Some(&token))
        .await;
    assert_eq!(for_file.data()[0]["token"], share.as_str());
}

#[tokio::test]
async fn test_issue_validates_limits() {
    let app = TestApp::new().await;
    let (token, file_id) = owner_with_file(&app, "validate@example.com").await;

    for body in [
        json!({ "file_id": file_id, "expiry_hours": 0 }),
        json!({ "file_id": file_id, "max_downloads": 0 }),
    ] {
        let response = app.request("POST", "/api/shares", Some(body), Some(&token)).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    let response = app
        .request("GET", "/api/s/doesNotExist", None, None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
