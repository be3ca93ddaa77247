//! Response DTOs for Web API.

use serde::Serialize;
use utoipa::ToSchema;

use crate::datetime::to_rfc3339;
use crate::file::{Folder, StoredFile};

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Login response.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Access token (JWT).
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Access token expiry in seconds.
    pub expires_in: u64,
    /// User information.
    pub user: UserInfo,
}

/// User information in responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserInfo {
    /// User ID.
    pub id: String,
    /// Email.
    pub email: String,
}

/// Token refresh response.
#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    /// New access token.
    pub access_token: String,
    /// New refresh token.
    pub refresh_token: String,
    /// Access token expiry in seconds.
    pub expires_in: u64,
}

/// Current user response.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    /// User ID.
    pub id: String,
    /// Email.
    pub email: String,
    /// ID of the user's root folder.
    pub root_folder_id: String,
    /// Account creation time.
    pub created_at: String,
    /// Last login time.
    pub last_login_at: Option<String>,
}

/// Folder in responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct FolderResponse {
    /// Folder ID.
    pub id: String,
    /// Folder name.
    pub name: String,
    /// Parent folder ID (`null` for the root).
    pub parent_folder_id: Option<String>,
    /// Display colour.
    pub color: Option<String>,
    /// Whether this is the user's root folder.
    pub is_root: bool,
    /// Creation time.
    pub created_at: String,
}

impl From<Folder> for FolderResponse {
    fn from(folder: Folder) -> Self {
        let is_root = folder.is_root();
        Self {
            id: folder.id.to_string(),
            name: folder.name,
            parent_folder_id: folder.parent_folder_id.map(|id| id.to_string()),
            color: folder.color,
            is_root,
            created_at: to_rfc3339(&folder.created_at),
        }
    }
}

/// File in responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileResponse {
    /// File ID.
    pub id: String,
    /// Containing folder ID.
    pub folder_id: String,
    /// File name.
    pub name: String,
    /// Classified type (`image`, `pdf`, `code`, `audio`, `video`, `other`).
    pub file_type: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: i64,
    /// Google Drive file ID.
    pub gdrive_file_id: String,
    /// Upload time.
    pub created_at: String,
}

impl From<StoredFile> for FileResponse {
    fn from(file: StoredFile) -> Self {
        Self {
            id: file.id.to_string(),
            folder_id: file.folder_id.to_string(),
            name: file.name,
            file_type: file.file_type.to_string(),
            mime_type: file.mime_type,
            size: file.size,
            gdrive_file_id: file.gdrive_file_id,
            created_at: to_rfc3339(&file.created_at),
        }
    }
}

/// Public file information returned by share links.
#[derive(Debug, Serialize, ToSchema)]
pub struct ShareResponse {
    /// File name.
    pub name: String,
    /// Classified type.
    pub file_type: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: i64,
    /// Relative URL serving the content.
    pub download_url: String,
}

impl From<StoredFile> for ShareResponse {
    fn from(file: StoredFile) -> Self {
        Self {
            download_url: format!(
                "/gdrive/download/{}",
                urlencoding::encode(&file.gdrive_file_id)
            ),
            name: file.name,
            file_type: file.file_type.to_string(),
            mime_type: file.mime_type,
            size: file.size,
        }
    }
}

/// Relay upload response.
#[derive(Debug, Serialize, ToSchema)]
pub struct RelayUploadResponse {
    /// Google Drive file ID.
    #[serde(rename = "fileId")]
    pub file_id: String,
}

/// Result of a folder deletion.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteFolderResponse {
    /// Number of file records removed with the folder.
    pub deleted_files: usize,
}
