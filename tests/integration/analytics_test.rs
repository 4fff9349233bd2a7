//! Analytics read endpoints.

use http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_share_stats_count_public_downloads() {
    let app = TestApp::new().await;
    let token = app.register_and_login("stats@example.com").await;
    let file_id = app.upload_one(&token, None, "stats.txt").await;

    let issued = app
        .request("POST", "/api/shares", Some(json!({ "file_id": file_id })), Some(&token))
        .await;
    let share_id = issued.data()["id"].as_str().unwrap().to_string();
    let share_token = issued.data()["token"].as_str().unwrap().to_string();

    let download = app
        .request("POST", &format!("/api/s/{share_token}/download"), None, None)
        .await;
    assert_eq!(download.status, StatusCode::OK);

    let share_uuid = share_id.parse().unwrap();
    for _ in 0..50 {
        if app.memory.share_access_count(share_uuid) > 0 {
            break;
        }
        app.settle().await;
    }

    let stats = app
        .request("GET", &format!("/api/analytics/shares/{share_id}"), None, Some(&token))
        .await;
    assert_eq!(stats.status, StatusCode::OK, "{:?}", stats.body);
    assert_eq!(stats.data()["download_count"], 1);
    assert_eq!(stats.data()["stats"]["total_accesses"], 1);

    let timeline = app
        .request(
            "GET",
            &format!("/api/analytics/shares/{share_id}/timeline?days=7"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(timeline.status, StatusCode::OK);

    let bad_window = app
        .request(
            "GET",
            &format!("/api/analytics/shares/{share_id}/timeline?days=0"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(bad_window.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reports_are_owner_scoped() {
    let app = TestApp::new().await;
    let token = app.register_and_login("scoped@example.com").await;
    let intruder = app.register_and_login("peeker@example.com").await;
    let file_id = app.upload_one(&token, None, "mine.txt").await;

    let response = app
        .request("GET", &format!("/api/analytics/files/{file_id}"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request("GET", &format!("/api/analytics/files/{file_id}"), None, Some(&intruder))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_dashboard_and_storage_usage() {
    let app = TestApp::new().await;
    let token = app.register_and_login("dash@example.com").await;
    app.upload_one(&token, None, "usage.txt").await;
    app.settle().await;

    let dashboard = app
        .request("GET", "/api/analytics/dashboard", None, Some(&token))
        .await;
    assert_eq!(dashboard.status, StatusCode::OK, "{:?}", dashboard.body);
    assert!(dashboard.data()["recent_activity"].is_array());
    assert!(dashboard.data()["popular_files"].is_array());

    let usage = app
        .request("GET", "/api/analytics/storage", None, Some(&token))
        .await;
    assert_eq!(usage.status, StatusCode::OK);
    assert_eq!(usage.data()["quota_bytes"], 1024u64 * 1024 * 1024);
    assert_eq!(usage.data()["formatted_quota"], "1.0 GB");
}
