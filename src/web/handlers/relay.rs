//! Plain Drive relay and public share handlers.
//!
//! The relay endpoints move bytes to and from Drive without touching the
//! metadata database; share lookups resolve a Drive id to the recorded
//! file so a link can be shown without logging in.

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::file::{mime_for, sanitize_file_name, FileRepository, FILE_NOT_FOUND};
use crate::web::dto::{ApiResponse, RelayUploadResponse, ShareResponse};
use crate::web::error::ApiError;
use crate::web::handlers::file::{content_response, multipart_error};
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;
use crate::DriveboxError;

/// Body of `GET /`.
pub const ONLINE_MESSAGE: &str = "App online. Use /gdrive/upload to upload a file";

/// Body of a failed relay upload.
pub const UPLOAD_FAILED_MESSAGE: &str = "Error uploading file";

/// GET / - Liveness banner.
pub async fn index() -> &'static str {
    ONLINE_MESSAGE
}

/// POST /gdrive/upload - Upload one multipart `file` straight to Drive.
#[utoipa::path(
    post,
    path = "/gdrive/upload",
    tag = "relay",
    responses(
        (status = 200, description = "Drive file id", body = RelayUploadResponse),
        (status = 400, description = "No file provided"),
        (status = 401, description = "Unauthorized"),
        (status = 413, description = "File too large"),
        (status = 500, description = "Error uploading file")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn relay_upload(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    mut multipart: Multipart,
) -> Response {
    let service = state.file_service();
    let mut file = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return plain_error(multipart_error(&service, None, e)),
        };
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or_default().to_string();
        let mime_type = field.content_type().map(|s| s.to_string());
        match field.bytes().await {
            Ok(content) => file = Some((name, mime_type, content.to_vec())),
            Err(e) => return plain_error(multipart_error(&service, Some(name.as_str()), e)),
        }
        break;
    }

    let Some((name, mime_type, content)) = file else {
        return (StatusCode::BAD_REQUEST, "No file uploaded").into_response();
    };

    let name = match sanitize_file_name(&name) {
        Ok(name) => name,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    if let Err(e) = service.check_size(&name, content.len() as u64) {
        return (StatusCode::PAYLOAD_TOO_LARGE, e.to_string()).into_response();
    }

    let mime_type = mime_for(&name, mime_type.as_deref());
    match state.drive.upload(&name, &mime_type, content).await {
        Ok(object) => {
            tracing::info!(user = %claims.sub, drive_id = %object.id, "Relayed upload to Drive");
            Json(RelayUploadResponse { file_id: object.id }).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Error uploading file");
            (StatusCode::INTERNAL_SERVER_ERROR, UPLOAD_FAILED_MESSAGE).into_response()
        }
    }
}

/// Relay errors are plain text bodies.
fn plain_error(error: ApiError) -> Response {
    (error.code().status_code(), error.message().to_string()).into_response()
}

/// GET /gdrive/download/:fileId - Stream a Drive object.
#[utoipa::path(
    get,
    path = "/gdrive/download/{fileId}",
    tag = "relay",
    params(
        ("fileId" = String, Path, description = "Google Drive file ID")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 404, description = "No such Drive file"),
        (status = 502, description = "File storage unavailable")
    )
)]
pub async fn relay_download(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let download = state.drive.download(&file_id).await.map_err(|e| match e {
        DriveboxError::NotFound(_) => ApiError::not_found(FILE_NOT_FOUND),
        other => ApiError::from(other),
    })?;

    content_response(&download.name, &download.mime_type, download.content)
}

/// GET /share/:gdrive_file_id - Public metadata of a shared file.
#[utoipa::path(
    get,
    path = "/share/{gdrive_file_id}",
    tag = "relay",
    params(
        ("gdrive_file_id" = String, Path, description = "Google Drive file ID")
    ),
    responses(
        (status = 200, description = "Shared file", body = ShareResponse),
        (status = 404, description = "File does not exist")
    )
)]
pub async fn get_shared_file(
    State(state): State<Arc<AppState>>,
    Path(gdrive_file_id): Path<String>,
) -> Result<Json<ApiResponse<ShareResponse>>, ApiError> {
    let file = FileRepository::new(state.db.pool())
        .get_by_drive_id(&gdrive_file_id)
        .await?
        .ok_or_else(|| ApiError::not_found(FILE_NOT_FOUND))?;

    Ok(Json(ApiResponse::new(file.into())))
}
