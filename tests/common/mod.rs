//! Test helpers for web API integration tests.
//!
//! Builds the full router over an in-memory database and an in-memory
//! Drive store, and provides small request helpers.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderName, HeaderValue};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};

use drivebox::config::WebConfig;
use drivebox::web::handlers::AppState;
use drivebox::web::middleware::{JwtState, RateLimitState};
use drivebox::web::router::{create_health_router, create_router};
use drivebox::{Database, MemoryDriveStore};

/// Password accepted by the registration rules.
pub const PASSWORD: &str = "password123";

/// A running test server plus handles on its backing stores.
pub struct TestApp {
    pub server: TestServer,
    pub db: Arc<Database>,
    pub drive: Arc<MemoryDriveStore>,
}

/// Create a test configuration.
pub fn create_test_config() -> WebConfig {
    WebConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec![],
        jwt_secret: "test-secret-key-for-testing-only".to_string(),
        jwt_access_token_expiry_secs: 900,
        jwt_refresh_token_expiry_days: 7,
        login_rate_limit: 1000,
        api_rate_limit: 10000,
        trust_proxy_headers: false,
    }
}

/// Create a test app with the default 10MB upload limit.
pub async fn create_test_app() -> TestApp {
    create_test_app_with_limit(10 * 1024 * 1024).await
}

/// Create a test app with a custom upload limit in bytes.
pub async fn create_test_app_with_limit(max_upload_size: u64) -> TestApp {
    let config = create_test_config();

    let db = Arc::new(
        Database::open_in_memory()
            .await
            .expect("Failed to create test database"),
    );
    let drive = Arc::new(MemoryDriveStore::new());

    let app_state = Arc::new(
        AppState::new(
            db.clone(),
            drive.clone(),
            &config.jwt_secret,
            config.jwt_access_token_expiry_secs,
            config.jwt_refresh_token_expiry_days,
        )
        .with_max_upload_size(max_upload_size),
    );
    let jwt_state = Arc::new(JwtState::new(&config.jwt_secret));
    let rate_limit_state = Arc::new(RateLimitState::new(
        config.login_rate_limit,
        config.api_rate_limit,
    ));

    let router = create_router(app_state, jwt_state, rate_limit_state, &config.cors_origins)
        .merge(create_health_router());
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp { server, db, drive }
}

/// Register a user and return the response body.
pub async fn register_user(server: &TestServer, email: &str) -> Value {
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "email": email,
            "password": PASSWORD,
            "confirm_password": PASSWORD
        }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()
}

/// Register a user and return their access token.
pub async fn register_and_token(server: &TestServer, email: &str) -> String {
    access_token(&register_user(server, email).await)
}

/// Get access token from a login/register response.
pub fn access_token(response: &Value) -> String {
    response["data"]["access_token"]
        .as_str()
        .expect("access_token missing")
        .to_string()
}

/// Authorization header for a token.
pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).expect("valid header"),
    )
}

/// Root folder id of the token's user.
pub async fn root_folder_id(server: &TestServer, token: &str) -> String {
    let (name, value) = bearer(token);
    let body: Value = server.get("/api/folders/root").add_header(name, value).await.json();
    body["data"]["id"].as_str().expect("root id").to_string()
}

/// Create a folder and return its id.
pub async fn create_folder(
    server: &TestServer,
    token: &str,
    name: &str,
    parent: Option<&str>,
) -> String {
    let (header, value) = bearer(token);
    let response = server
        .post("/api/folders")
        .add_header(header, value)
        .json(&json!({ "name": name, "parent_folder_id": parent }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["data"]["id"].as_str().expect("folder id").to_string()
}

/// Multipart form with a single `file` part.
pub fn file_form(file_name: &str, mime_type: &str, content: &[u8]) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(content.to_vec())
            .file_name(file_name)
            .mime_type(mime_type),
    )
}

/// Upload one file into a folder.
pub async fn upload(
    server: &TestServer,
    token: &str,
    folder_id: &str,
    file_name: &str,
    mime_type: &str,
    content: &[u8],
) -> TestResponse {
    let (header, value) = bearer(token);
    server
        .post(&format!("/api/folders/{folder_id}/files"))
        .add_header(header, value)
        .multipart(file_form(file_name, mime_type, content))
        .await
}

/// Upload one file and return its JSON record.
pub async fn upload_ok(
    server: &TestServer,
    token: &str,
    folder_id: &str,
    file_name: &str,
    mime_type: &str,
    content: &[u8],
) -> Value {
    let response = upload(server, token, folder_id, file_name, mime_type, content).await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["data"][0].clone()
}
