//! Drive relay and share link tests.

mod common;

use axum::http::StatusCode;
use axum_test::multipart::MultipartForm;
use serde_json::Value;

use common::{
    bearer, create_test_app, create_test_app_with_limit, file_form, register_and_token,
    root_folder_id, upload_ok,
};
use drivebox::DriveStore;

#[tokio::test]
async fn test_index_banner() {
    let app = create_test_app().await;

    let response = app.server.get("/").await;

    response.assert_status_ok();
    assert_eq!(
        response.text(),
        "App online. Use /gdrive/upload to upload a file"
    );
}

#[tokio::test]
async fn test_relay_upload() {
    let app = create_test_app().await;
    let token = register_and_token(&app.server, "relay@example.com").await;

    let (header, value) = bearer(&token);
    let response = app
        .server
        .post("/gdrive/upload")
        .add_header(header, value)
        .multipart(file_form("report.pdf", "application/pdf", b"%PDF-1.4"))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let file_id = body["fileId"].as_str().unwrap();

    let stored = app.drive.download(file_id).await.unwrap();
    assert_eq!(stored.name, "report.pdf");
    assert_eq!(stored.mime_type, "application/pdf");
    assert_eq!(stored.content, b"%PDF-1.4");
}

#[tokio::test]
async fn test_relay_upload_requires_auth() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/gdrive/upload")
        .multipart(file_form("a.txt", "text/plain", b"a"))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert!(app.drive.is_empty().await);
}

#[tokio::test]
async fn test_relay_upload_without_file() {
    let app = create_test_app().await;
    let token = register_and_token(&app.server, "empty@example.com").await;

    let (header, value) = bearer(&token);
    let response = app
        .server
        .post("/gdrive/upload")
        .add_header(header, value)
        .multipart(MultipartForm::new().add_text("other", "value"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "No file uploaded");
}

#[tokio::test]
async fn test_relay_upload_over_body_limit() {
    let app = create_test_app_with_limit(1024 * 1024).await;
    let token = register_and_token(&app.server, "huge@example.com").await;

    let (header, value) = bearer(&token);
    let response = app
        .server
        .post("/gdrive/upload")
        .add_header(header, value)
        .multipart(file_form(
            "huge.bin",
            "application/octet-stream",
            &vec![0u8; 4 * 1024 * 1024],
        ))
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert!(response.text().contains("is too big. Max size is 1MB"));
    assert!(app.drive.is_empty().await);
}

#[tokio::test]
async fn test_relay_upload_failure() {
    let app = create_test_app().await;
    let token = register_and_token(&app.server, "fail@example.com").await;
    app.drive.set_fail_uploads(true);

    let (header, value) = bearer(&token);
    let response = app
        .server
        .post("/gdrive/upload")
        .add_header(header, value)
        .multipart(file_form("a.txt", "text/plain", b"a"))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text(), "Error uploading file");
}

#[tokio::test]
async fn test_relay_download() {
    let app = create_test_app().await;
    let object = app
        .drive
        .upload("hello.txt", "text/plain", b"hello".to_vec())
        .await
        .unwrap();

    let response = app
        .server
        .get(&format!("/gdrive/download/{}", object.id))
        .await;

    response.assert_status_ok();
    assert_eq!(response.text(), "hello");
    assert_eq!(
        response.header("content-disposition").to_str().unwrap(),
        "attachment; filename=\"hello.txt\""
    );
}

#[tokio::test]
async fn test_relay_download_unknown() {
    let app = create_test_app().await;

    let response = app.server.get("/gdrive/download/missing").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "File does not exist");
}

#[tokio::test]
async fn test_share_link() {
    let app = create_test_app().await;
    let token = register_and_token(&app.server, "share@example.com").await;
    let root = root_folder_id(&app.server, &token).await;
    let file = upload_ok(&app.server, &token, &root, "cat.png", "image/png", b"meow").await;
    let drive_id = file["gdrive_file_id"].as_str().unwrap();

    // No token needed
    let response = app.server.get(&format!("/share/{drive_id}")).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["name"], "cat.png");
    assert_eq!(body["data"]["file_type"], "image");
    assert_eq!(body["data"]["size"], 4);
    let download_url = body["data"]["download_url"].as_str().unwrap();
    assert_eq!(download_url, format!("/gdrive/download/{drive_id}"));

    let content = app.server.get(download_url).await;
    content.assert_status_ok();
    assert_eq!(content.text(), "meow");
}

#[tokio::test]
async fn test_share_link_unknown() {
    let app = create_test_app().await;

    let response = app.server.get("/share/nothing-here").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "File does not exist");
}
