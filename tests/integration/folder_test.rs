//! Folder hierarchy over HTTP.

use http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_path_runs_root_to_leaf() {
    let app = TestApp::new().await;
    let token = app.register_and_login("paths@example.com").await;

    let a = app.create_folder(&token, "A", None).await;
    let b = app.create_folder(&token, "B", Some(&a)).await;
    let c = app.create_folder(&token, "C", Some(&b)).await;

    let response = app
        .request("GET", &format!("/api/folders/{c}/path"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let names: Vec<&str> = response
        .data()
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["A", "B", "C"]);
}

#[tokio::test]
async fn test_sibling_names_are_case_insensitive() {
    let app = TestApp::new().await;
    let token = app.register_and_login("dupes@example.com").await;
    app.create_folder(&token, "Reports", None).await;

    let response = app
        .request(
            "POST",
            "/api/folders",
            Some(json!({ "name": "reports" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.error_code(), "CONFLICT");
}

#[tokio::test]
async fn test_delete_reparents_children_to_root() {
    let app = TestApp::new().await;
    let token = app.register_and_login("reparent@example.com").await;

    let parent = app.create_folder(&token, "Projects", None).await;
    let child = app.create_folder(&token, "Drafts", Some(&parent)).await;
    app.upload_one(&token, Some(&parent), "one.txt").await;
    app.upload_one(&token, Some(&parent), "two.txt").await;

    let response = app
        .request("DELETE", &format!("/api/folders/{parent}"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["deleted"], true);

    let root = app
        .request("GET", "/api/folders/contents", None, Some(&token))
        .await;
    assert_eq!(root.status, StatusCode::OK);
    let folders = root.data()["folders"].as_array().unwrap();
    assert_eq!(folders.len(), 1);
    assert_eq!(folders[0]["id"], child.as_str());
    assert_eq!(root.data()["files"].as_array().unwrap().len(), 2);

    let gone = app
        .request("GET", &format!("/api/folders/{parent}"), None, Some(&token))
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_names_the_clashing_subfolder() {
    let app = TestApp::new().await;
    let token = app.register_and_login("clash@example.com").await;

    app.create_folder(&token, "Drafts", None).await;
    let parent = app.create_folder(&token, "Archive", None).await;
    app.create_folder(&token, "drafts", Some(&parent)).await;

    let response = app
        .request("DELETE", &format!("/api/folders/{parent}"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    let message = response.body["message"].as_str().unwrap();
    assert!(message.contains("'drafts'"), "{message}");

    let still = app
        .request("GET", &format!("/api/folders/{parent}"), None, Some(&token))
        .await;
    assert_eq!(still.status, StatusCode::OK);
}

#[tokio::test]
async fn test_move_into_descendant_is_rejected() {
    let app = TestApp::new().await;
    let token = app.register_and_login("cycles@example.com").await;

    let a = app.create_folder(&token, "A", None).await;
    let b = app.create_folder(&token, "B", Some(&a)).await;

    let response = app
        .request(
            "PUT",
            &format!("/api/folders/{a}/move"),
            Some(json!({ "parent_id": b })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "PUT",
            &format!("/api/folders/{b}/move"),
            Some(json!({ "parent_id": null })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.data()["parent_id"].is_null());
}

#[tokio::test]
async fn test_tree_and_rename() {
    let app = TestApp::new().await;
    let token = app.register_and_login("tree@example.com").await;

    let a = app.create_folder(&token, "alpha", None).await;
    app.create_folder(&token, "inner", Some(&a)).await;

    let response = app
        .request(
            "PUT",
            &format!("/api/folders/{a}"),
            Some(json!({ "name": "Alpha Renamed" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["name"], "Alpha Renamed");

    let tree = app.request("GET", "/api/folders/tree", None, Some(&token)).await;
    assert_eq!(tree.status, StatusCode::OK);
    assert!(tree.body.to_string().contains("Alpha Renamed"));
    assert!(tree.body.to_string().contains("inner"));
}

#[tokio::test]
async fn test_foreign_folder_is_forbidden() {
    let app = TestApp::new().await;
    let owner = app.register_and_login("owner@example.com").await;
    let intruder = app.register_and_login("intruder@example.com").await;

    let folder = app.create_folder(&owner, "Private", None).await;
    let response = app
        .request("GET", &format!("/api/folders/{folder}"), None, Some(&intruder))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request("DELETE", &format!("/api/folders/{folder}"), None, Some(&intruder))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_malformed_id_is_bad_request() {
    let app = TestApp::new().await;
    let token = app.register_and_login("badid@example.com").await;
    let response = app
        .request("GET", "/api/folders/not-a-uuid", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION");
}
