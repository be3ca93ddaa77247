//! Google Drive v3 REST client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::token::TokenProvider;
use super::{DriveDownload, DriveObject, DriveStore};
use crate::file::OCTET_STREAM;
use crate::{DriveboxError, Result};

/// Connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// User agent string for Drive requests.
const USER_AGENT: &str = concat!("drivebox/", env!("CARGO_PKG_VERSION"));

/// Longest error body echoed into an error message.
const MAX_ERROR_BODY: usize = 512;

/// Build the HTTP client shared by the token provider and the Drive client.
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| DriveboxError::Drive(format!("failed to create HTTP client: {e}")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    id: Option<String>,
    name: Option<String>,
    mime_type: Option<String>,
    // Drive encodes int64 fields as JSON strings.
    size: Option<String>,
}

/// Drive client storing every object in one folder.
pub struct GoogleDriveClient {
    http: Client,
    tokens: Arc<TokenProvider>,
    api_base: String,
    folder_id: String,
}

impl GoogleDriveClient {
    /// Create a client for `api_base` (e.g. `https://www.googleapis.com`).
    pub fn new(http: Client, tokens: Arc<TokenProvider>, api_base: &str, folder_id: &str) -> Self {
        Self {
            http,
            tokens,
            api_base: api_base.trim_end_matches('/').to_string(),
            folder_id: folder_id.to_string(),
        }
    }

    fn file_url(&self, id: &str) -> String {
        format!(
            "{}/drive/v3/files/{}",
            self.api_base,
            urlencoding::encode(id)
        )
    }

    /// Send an authorised request, refreshing the token and retrying once
    /// on 401.
    async fn send<F>(&self, build: F) -> Result<Response>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let token = self.tokens.access_token().await?;
        let response = build(&token)
            .send()
            .await
            .map_err(|e| DriveboxError::Drive(format!("request failed: {e}")))?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warn!("Drive rejected the access token, re-authorising");
        let token = self.tokens.refresh().await?;
        build(&token)
            .send()
            .await
            .map_err(|e| DriveboxError::Drive(format!("request failed: {e}")))
    }
}

/// Map non-success responses to crate errors.
async fn check(response: Response, action: &str, id: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(DriveboxError::NotFound(format!("drive file {id}")));
    }

    let body = response.text().await.unwrap_or_default();
    let body: String = body.chars().take(MAX_ERROR_BODY).collect();
    Err(DriveboxError::Drive(format!(
        "{action} failed: HTTP {status}: {body}"
    )))
}

async fn read_resource(response: Response) -> Result<FileResource> {
    let body = response
        .bytes()
        .await
        .map_err(|e| DriveboxError::Drive(format!("failed to read response: {e}")))?;
    serde_json::from_slice(&body)
        .map_err(|e| DriveboxError::Drive(format!("invalid Drive response: {e}")))
}

/// Build a `multipart/related` body: JSON metadata, then the content.
fn related_body(boundary: &str, metadata: &serde_json::Value, mime_type: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(content.len() + 512);
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("--{boundary}\r\nContent-Type: {mime_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[async_trait]
impl DriveStore for GoogleDriveClient {
    async fn upload(&self, name: &str, mime_type: &str, content: Vec<u8>) -> Result<DriveObject> {
        let size = content.len() as u64;
        let metadata = serde_json::json!({
            "name": name,
            "parents": [self.folder_id],
            "mimeType": mime_type,
        });
        let boundary = format!("drivebox-{}", Uuid::new_v4().simple());
        let body = related_body(&boundary, &metadata, mime_type, &content);
        let url = format!(
            "{}/upload/drive/v3/files?uploadType=multipart&fields=id,name,mimeType,size",
            self.api_base
        );

        let response = self
            .send(|token| {
                self.http
                    .post(&url)
                    .bearer_auth(token)
                    .header(
                        reqwest::header::CONTENT_TYPE,
                        format!("multipart/related; boundary={boundary}"),
                    )
                    .body(body.clone())
            })
            .await?;
        let response = check(response, "upload", name).await?;
        let resource = read_resource(response).await?;

        let id = resource
            .id
            .ok_or_else(|| DriveboxError::Drive("upload response has no file id".to_string()))?;
        debug!(drive_id = %id, size, "Uploaded file to Drive");

        Ok(DriveObject {
            id,
            name: resource.name.unwrap_or_else(|| name.to_string()),
            mime_type: resource.mime_type.unwrap_or_else(|| mime_type.to_string()),
            size: resource.size.and_then(|s| s.parse().ok()).unwrap_or(size),
        })
    }

    async fn download(&self, id: &str) -> Result<DriveDownload> {
        let url = self.file_url(id);

        let response = self
            .send(|token| {
                self.http
                    .get(&url)
                    .bearer_auth(token)
                    .query(&[("fields", "name,mimeType,size")])
            })
            .await?;
        let resource = read_resource(check(response, "metadata lookup", id).await?).await?;

        let response = self
            .send(|token| {
                self.http
                    .get(&url)
                    .bearer_auth(token)
                    .query(&[("alt", "media")])
            })
            .await?;
        let content = check(response, "download", id)
            .await?
            .bytes()
            .await
            .map_err(|e| DriveboxError::Drive(format!("failed to read content: {e}")))?;

        Ok(DriveDownload {
            name: resource.name.unwrap_or_else(|| id.to_string()),
            mime_type: resource
                .mime_type
                .unwrap_or_else(|| OCTET_STREAM.to_string()),
            content: content.to_vec(),
        })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let url = self.file_url(id);
        let response = self
            .send(|token| self.http.delete(&url).bearer_auth(token))
            .await?;
        check(response, "delete", id).await?;
        debug!(drive_id = %id, "Deleted Drive file");
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "google"
    }
}
