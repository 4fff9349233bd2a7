//! Registration, login and bearer-token handling.

use http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_register_login_and_me() {
    let app = TestApp::new().await;
    let token = app.register_and_login("Alice@Example.com").await;

    let response = app.request("GET", "/api/auth/me", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.data()["email"], "alice@example.com");
    assert!(response.data().get("password_hash").is_none());
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let app = TestApp::new().await;
    app.register_and_login("bob@example.com").await;

    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(json!({
                "name": "Bob Again",
                "email": "BOB@example.com",
                "password": "password123",
                "confirm_password": "password123",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.error_code(), "CONFLICT");
}

#[tokio::test]
async fn test_bad_credentials_are_rejected() {
    let app = TestApp::new().await;
    app.register_and_login("carol@example.com").await;

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "carol@example.com", "password": "nope-nope" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "AUTHENTICATION");
}

#[tokio::test]
async fn test_missing_or_forged_token() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/folders", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "AUTHENTICATION");

    let response = app
        .request("GET", "/api/folders", None, Some("not.a.jwt"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::new().await;
    let token = app.register_and_login("dave@example.com").await;

    let response = app
        .request(
            "PUT",
            "/api/auth/password",
            Some(json!({
                "current_password": "wrong-current",
                "new_password": "brand-new-pass",
                "confirm_password": "brand-new-pass",
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "PUT",
            "/api/auth/password",
            Some(json!({
                "current_password": "password123",
                "new_password": "brand-new-pass",
                "confirm_password": "brand-new-pass",
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);

    app.login("dave@example.com", "brand-new-pass").await;
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;
    let response = app.request("GET", "/api/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["storage"], "local");
}
