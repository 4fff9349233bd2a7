//! Shared test helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use stashbox_api::{AppState, build_app};
use stashbox_core::config::AppConfig;
use stashbox_database::{MemoryStore, Stores};
use stashbox_storage::StorageManager;

const BOUNDARY: &str = "stashbox-test-boundary";

/// Test application context
pub struct TestApp {
    /// The Axum app for making test requests
    pub router: Router,
    /// Direct handle on the in-memory state, for seeding and inspection
    pub memory: MemoryStore,
    /// Application config
    pub config: AppConfig,
    /// Local storage root; removed on drop
    pub storage_dir: TempDir,
}

/// Status and parsed JSON body of a response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: http::HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The `data` member of a success envelope.
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// The `error` code of an error envelope.
    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

impl TestApp {
    /// Create a new test application
    pub async fn new() -> Self {
        let storage_dir = TempDir::new().expect("Failed to create storage dir");

        let mut config = AppConfig::default();
        config.database.url = String::new();
        config.worker.enabled = false;
        config.storage.local.root_path = storage_dir.path().to_string_lossy().into_owned();
        config.share.public_base_url = "https://stash.test".to_string();
        config.auth.jwt_secret = "integration-test-secret".to_string();

        let memory = MemoryStore::new();
        let stores = Stores::from_memory(memory.clone());
        let storage = Arc::new(
            StorageManager::from_config(&config.storage)
                .await
                .expect("Failed to init storage"),
        );

        let state = AppState::build(config.clone(), &stores, storage);
        let router = build_app(state);

        Self {
            router,
            memory,
            config,
            storage_dir,
        }
    }

    /// Register a user and return their access token
    pub async fn register_and_login(&self, email: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/auth/register",
                Some(json!({
                    "name": "Test User",
                    "email": email,
                    "password": "password123",
                    "confirm_password": "password123",
                })),
                None,
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Register failed: {:?}",
            response.body
        );
        self.login(email, "password123").await
    }

    /// Login and return JWT access token
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/auth/login",
                Some(json!({ "email": email, "password": password })),
                None,
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::OK,
            "Login failed: {:?}",
            response.body
        );
        response.data()["access_token"]
            .as_str()
            .expect("No access_token in login response")
            .to_string()
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");
        self.send(req).await
    }

    /// Upload files as multipart parts named `file`.
    pub async fn upload(
        &self,
        token: &str,
        folder_id: Option<&str>,
        files: &[(&str, &[u8])],
    ) -> TestResponse {
        let mut body = Vec::new();
        if let Some(folder_id) = folder_id {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"folder_id\"\r\n\r\n{folder_id}\r\n"
                )
                .as_bytes(),
            );
        }
        for (name, data) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let req = Request::builder()
            .method("POST")
            .uri("/api/files/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::from(body))
            .expect("Failed to build upload request");
        self.send(req).await
    }

    /// Upload one file and return its id.
    pub async fn upload_one(&self, token: &str, folder_id: Option<&str>, name: &str) -> String {
        let response = self.upload(token, folder_id, &[(name, &b"hello stashbox"[..])]).await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Upload failed: {:?}",
            response.body
        );
        response.data()["uploaded"][0]["id"]
            .as_str()
            .expect("No id in upload response")
            .to_string()
    }

    /// Create a folder and return its id.
    pub async fn create_folder(&self, token: &str, name: &str, parent_id: Option<&str>) -> String {
        let response = self
            .request(
                "POST",
                "/api/folders",
                Some(json!({ "name": name, "parent_id": parent_id })),
                Some(token),
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Create folder failed: {:?}",
            response.body
        );
        response.data()["id"]
            .as_str()
            .expect("No id in folder response")
            .to_string()
    }

    /// Issue a share link and return its token.
    pub async fn issue_share(&self, token: &str, body: Value) -> String {
        let response = self.request("POST", "/api/shares", Some(body), Some(token)).await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Issue share failed: {:?}",
            response.body
        );
        response.data()["token"]
            .as_str()
            .expect("No token in share response")
            .to_string()
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Give fire-and-forget analytics tasks a chance to land.
    pub async fn settle(&self) {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }
}
