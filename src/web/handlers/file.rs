//! File handlers for Web API.

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::file::{FileRepository, FileService, FileUpdate, FolderRepository, UploadRequest};
use crate::ids::{FileId, FolderId};
use crate::web::dto::{ApiResponse, FileResponse, UpdateFileRequest, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// Build a safe Content-Disposition value for a download.
///
/// Control characters are dropped so a name cannot inject headers. Names
/// that are not plain ASCII get an ASCII fallback plus an RFC 5987
/// `filename*` parameter.
pub(crate) fn content_disposition_header(filename: &str) -> String {
    let cleaned: String = filename.chars().filter(|c| !c.is_control()).collect();

    if cleaned.is_ascii() && !cleaned.contains(|c: char| c == '"' || c == '\\') {
        return format!("attachment; filename=\"{}\"", cleaned);
    }

    let fallback: String = cleaned
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if !c.is_ascii() => '_',
            c => c,
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(&cleaned)
    )
}

/// Response carrying raw file content.
pub(crate) fn content_response(
    filename: &str,
    mime_type: &str,
    content: Vec<u8>,
) -> Result<Response<Body>, ApiError> {
    Response::builder()
        .header(header::CONTENT_TYPE, mime_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(filename),
        )
        .header(header::CONTENT_LENGTH, content.len())
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// GET /api/files - List all of the caller's files.
#[utoipa::path(
    get,
    path = "/api/files",
    tag = "files",
    responses(
        (status = 200, description = "All files, newest first", body = Vec<FileResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>, ApiError> {
    let user_id = claims.user_id()?;
    let files = FileRepository::new(state.db.pool()).list_all(&user_id).await?;

    let response = files.into_iter().map(FileResponse::from).collect();
    Ok(Json(ApiResponse::new(response)))
}

/// GET /api/folders/:id/files - List files in a folder.
#[utoipa::path(
    get,
    path = "/api/folders/{id}/files",
    tag = "files",
    params(
        ("id" = String, Path, description = "Folder ID")
    ),
    responses(
        (status = 200, description = "Files in the folder", body = Vec<FileResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Folder not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_folder_files(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>, ApiError> {
    let user_id = claims.user_id()?;
    let folder_id = FolderId::parse(&id)?;

    FolderRepository::new(state.db.pool())
        .get(&user_id, &folder_id)
        .await?
        .ok_or_else(|| ApiError::not_found("folder not found"))?;

    let files = FileRepository::new(state.db.pool())
        .list_by_folder(&user_id, &folder_id)
        .await?;

    let response = files.into_iter().map(FileResponse::from).collect();
    Ok(Json(ApiResponse::new(response)))
}

/// POST /api/folders/:id/files - Upload files into a folder.
///
/// Request body: multipart/form-data with one or more "file" fields.
#[utoipa::path(
    post,
    path = "/api/folders/{id}/files",
    tag = "files",
    params(
        ("id" = String, Path, description = "Folder ID")
    ),
    responses(
        (status = 200, description = "Files uploaded", body = Vec<FileResponse>),
        (status = 400, description = "No file provided"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Folder not found"),
        (status = 413, description = "File too large"),
        (status = 502, description = "File storage unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>, ApiError> {
    let user_id = claims.user_id()?;
    let folder_id = FolderId::parse(&id)?;
    let service = state.file_service();

    let mut requests = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&service, None, e))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| ApiError::bad_request("File name is missing"))?;
        let mime_type = field.content_type().map(|s| s.to_string());
        let content = field
            .bytes()
            .await
            .map_err(|e| multipart_error(&service, Some(filename.as_str()), e))?;

        let mut request = UploadRequest::new(folder_id.clone(), filename, content.to_vec());
        if let Some(mime_type) = mime_type {
            request = request.with_mime_type(mime_type);
        }
        requests.push(request);
    }

    if requests.is_empty() {
        return Err(ApiError::bad_request("No file provided"));
    }

    let uploaded = service.upload_all(&user_id, requests).await?;
    let response = uploaded.into_iter().map(FileResponse::from).collect();
    Ok(Json(ApiResponse::new(response)))
}

/// Map a multipart read failure. Overflowing the request body limit is
/// reported as an oversized file.
pub(crate) fn multipart_error(
    service: &FileService<'_>,
    filename: Option<&str>,
    error: MultipartError,
) -> ApiError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!("Multipart body over the size limit: {}", error);
        return service.too_big(filename).into();
    }
    tracing::warn!("Failed to read multipart data: {}", error);
    ApiError::bad_request("Invalid multipart data")
}

/// GET /api/files/:id - Get file metadata.
#[utoipa::path(
    get,
    path = "/api/files/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File metadata", body = FileResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File does not exist")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let user_id = claims.user_id()?;
    let file_id = FileId::parse(&id)?;

    let file = FileRepository::new(state.db.pool())
        .get(&user_id, &file_id)
        .await?;

    Ok(Json(ApiResponse::new(file.into())))
}

/// PATCH /api/files/:id - Rename a file or move it to another folder.
#[utoipa::path(
    patch,
    path = "/api/files/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "File ID")
    ),
    request_body = UpdateFileRequest,
    responses(
        (status = 200, description = "File updated", body = FileResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File or destination folder not found"),
        (status = 422, description = "Invalid name")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateFileRequest>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let user_id = claims.user_id()?;
    let file_id = FileId::parse(&id)?;

    let mut update = FileUpdate::new();
    if let Some(name) = req.name {
        update = update.name(name);
    }
    if let Some(folder) = req.folder_id.as_deref() {
        update = update.folder_id(FolderId::parse(folder)?);
    }

    let file = FileRepository::new(state.db.pool())
        .update(&user_id, &file_id, &update)
        .await?;

    Ok(Json(ApiResponse::new(file.into())))
}

/// DELETE /api/files/:id - Delete a file.
#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File deleted", body = FileResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File does not exist")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let user_id = claims.user_id()?;
    let file_id = FileId::parse(&id)?;

    let file = state.file_service().delete_file(&user_id, &file_id).await?;

    Ok(Json(ApiResponse::new(file.into())))
}

/// GET /api/files/:id/download - Download file content.
///
/// Accepts the access token as `?token=` so browsers can follow the link.
#[utoipa::path(
    get,
    path = "/api/files/{id}/download",
    tag = "files",
    params(
        ("id" = String, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File does not exist"),
        (status = 502, description = "File storage unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let user_id = claims.user_id()?;
    let file_id = FileId::parse(&id)?;

    let download = state.file_service().download(&user_id, &file_id).await?;
    tracing::debug!(user_id = %user_id, file_id = %file_id, "File downloaded");

    content_response(
        &download.metadata.name,
        &download.metadata.mime_type,
        download.content,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_header_simple_ascii() {
        let result = content_disposition_header("document.txt");
        assert_eq!(result, "attachment; filename=\"document.txt\"");
    }

    #[test]
    fn test_content_disposition_header_with_spaces() {
        let result = content_disposition_header("my document.txt");
        assert_eq!(result, "attachment; filename=\"my document.txt\"");
    }

    #[test]
    fn test_content_disposition_header_non_ascii() {
        let result = content_disposition_header("résumé.pdf");
        assert_eq!(
            result,
            "attachment; filename=\"r_sum_.pdf\"; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf"
        );
    }

    #[test]
    fn test_content_disposition_header_double_quote() {
        let result = content_disposition_header("test\"file.txt");
        assert!(result.contains("filename=\"test_file.txt\""));
        assert!(result.contains("%22"));
    }

    #[test]
    fn test_content_disposition_header_header_injection() {
        let result = content_disposition_header("file\"\r\nX-Evil: header\r\n\r\n<script>.txt");
        assert!(!result.contains('\r'));
        assert!(!result.contains('\n'));
        assert!(result.starts_with("attachment; filename="));
    }

    #[test]
    fn test_content_response_headers() {
        let response = content_response("a.txt", "text/plain", b"hello".to_vec()).unwrap();
        let headers = response.headers();
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(headers.get(header::CONTENT_LENGTH).unwrap(), "5");
        assert_eq!(
            headers.get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"a.txt\""
        );
    }
}
