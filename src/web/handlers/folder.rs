//! Folder handlers for Web API.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::file::{FolderRepository, FolderUpdate, NewFolder};
use crate::ids::FolderId;
use crate::web::dto::{
    ApiResponse, CreateFolderRequest, DeleteFolderResponse, FolderResponse, UpdateFolderRequest,
    ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

fn folder_not_found() -> ApiError {
    ApiError::not_found("folder not found")
}

/// GET /api/folders - List all of the caller's folders.
#[utoipa::path(
    get,
    path = "/api/folders",
    tag = "folders",
    responses(
        (status = 200, description = "All folders except the root", body = Vec<FolderResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_folders(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<Vec<FolderResponse>>>, ApiError> {
    let user_id = claims.user_id()?;
    let folders = FolderRepository::new(state.db.pool())
        .list_all(&user_id)
        .await?;

    let response = folders.into_iter().map(FolderResponse::from).collect();
    Ok(Json(ApiResponse::new(response)))
}

/// POST /api/folders - Create a folder.
///
/// Without `parent_folder_id` the folder is created under the root.
#[utoipa::path(
    post,
    path = "/api/folders",
    tag = "folders",
    request_body = CreateFolderRequest,
    responses(
        (status = 200, description = "Folder created", body = FolderResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Parent folder not found"),
        (status = 422, description = "Invalid name, colour or depth")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateFolderRequest>,
) -> Result<Json<ApiResponse<FolderResponse>>, ApiError> {
    let user_id = claims.user_id()?;

    let mut new_folder = NewFolder::new(req.name);
    if let Some(parent) = req.parent_folder_id.as_deref() {
        new_folder = new_folder.with_parent(FolderId::parse(parent)?);
    }
    if let Some(color) = req.color {
        new_folder = new_folder.with_color(color);
    }

    let folder = FolderRepository::new(state.db.pool())
        .create(&user_id, &new_folder)
        .await?;
    tracing::info!(user_id = %user_id, folder_id = %folder.id, "Folder created");

    Ok(Json(ApiResponse::new(folder.into())))
}

/// GET /api/folders/root - Get the caller's root folder.
#[utoipa::path(
    get,
    path = "/api/folders/root",
    tag = "folders",
    responses(
        (status = 200, description = "Root folder", body = FolderResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_root_folder(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<FolderResponse>>, ApiError> {
    let user_id = claims.user_id()?;
    let root = FolderRepository::new(state.db.pool())
        .get_or_create_root(&user_id)
        .await?;

    Ok(Json(ApiResponse::new(root.into())))
}

/// GET /api/folders/:id - Get a folder.
#[utoipa::path(
    get,
    path = "/api/folders/{id}",
    tag = "folders",
    params(
        ("id" = String, Path, description = "Folder ID")
    ),
    responses(
        (status = 200, description = "Folder", body = FolderResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Folder not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_folder(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<FolderResponse>>, ApiError> {
    let user_id = claims.user_id()?;
    let folder_id = FolderId::parse(&id)?;

    let folder = FolderRepository::new(state.db.pool())
        .get(&user_id, &folder_id)
        .await?
        .ok_or_else(folder_not_found)?;

    Ok(Json(ApiResponse::new(folder.into())))
}

/// PATCH /api/folders/:id - Rename, recolour or move a folder.
#[utoipa::path(
    patch,
    path = "/api/folders/{id}",
    tag = "folders",
    params(
        ("id" = String, Path, description = "Folder ID")
    ),
    request_body = UpdateFolderRequest,
    responses(
        (status = 200, description = "Folder updated", body = FolderResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "The root folder cannot be modified"),
        (status = 404, description = "Folder not found"),
        (status = 422, description = "Invalid name, colour or destination")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_folder(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateFolderRequest>,
) -> Result<Json<ApiResponse<FolderResponse>>, ApiError> {
    let user_id = claims.user_id()?;
    let folder_id = FolderId::parse(&id)?;

    let mut update = FolderUpdate::new();
    if let Some(name) = req.name {
        update = update.name(name);
    }
    if let Some(color) = req.color {
        update = update.color(color);
    }
    if let Some(parent) = req.parent_folder_id.as_deref() {
        update = update.parent_folder_id(FolderId::parse(parent)?);
    }

    let folder = FolderRepository::new(state.db.pool())
        .update(&user_id, &folder_id, &update)
        .await?;

    Ok(Json(ApiResponse::new(folder.into())))
}

/// DELETE /api/folders/:id - Delete a folder, its subfolders and files.
#[utoipa::path(
    delete,
    path = "/api/folders/{id}",
    tag = "folders",
    params(
        ("id" = String, Path, description = "Folder ID")
    ),
    responses(
        (status = 200, description = "Folder deleted", body = DeleteFolderResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "The root folder cannot be deleted"),
        (status = 404, description = "Folder not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_folder(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeleteFolderResponse>>, ApiError> {
    let user_id = claims.user_id()?;
    let folder_id = FolderId::parse(&id)?;

    let deleted_files = state
        .file_service()
        .delete_folder(&user_id, &folder_id)
        .await?;

    Ok(Json(ApiResponse::new(DeleteFolderResponse { deleted_files })))
}

/// GET /api/folders/:id/subfolders - List child folders.
#[utoipa::path(
    get,
    path = "/api/folders/{id}/subfolders",
    tag = "folders",
    params(
        ("id" = String, Path, description = "Folder ID")
    ),
    responses(
        (status = 200, description = "Child folders sorted by name", body = Vec<FolderResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Folder not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_subfolders(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<FolderResponse>>>, ApiError> {
    let user_id = claims.user_id()?;
    let folder_id = FolderId::parse(&id)?;
    let repo = FolderRepository::new(state.db.pool());

    repo.get(&user_id, &folder_id)
        .await?
        .ok_or_else(folder_not_found)?;
    let folders = repo.list_subfolders(&user_id, &folder_id).await?;

    let response = folders.into_iter().map(FolderResponse::from).collect();
    Ok(Json(ApiResponse::new(response)))
}

/// GET /api/folders/:id/path - Breadcrumb from the root down to the folder.
#[utoipa::path(
    get,
    path = "/api/folders/{id}/path",
    tag = "folders",
    params(
        ("id" = String, Path, description = "Folder ID")
    ),
    responses(
        (status = 200, description = "Folders from the root to this folder", body = Vec<FolderResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Folder not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_folder_path(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<FolderResponse>>>, ApiError> {
    let user_id = claims.user_id()?;
    let folder_id = FolderId::parse(&id)?;

    let path = FolderRepository::new(state.db.pool())
        .get_path(&user_id, &folder_id)
        .await?;
    if path.is_empty() {
        return Err(folder_not_found());
    }

    let response = path.into_iter().map(FolderResponse::from).collect();
    Ok(Json(ApiResponse::new(response)))
}
