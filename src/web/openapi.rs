//! OpenAPI document served through Swagger UI.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::dto::{
    CreateFolderRequest, DeleteFolderResponse, FileResponse, FolderResponse, LoginRequest,
    LoginResponse, LogoutRequest, MeResponse, RefreshRequest, RefreshResponse, RegisterRequest,
    RelayUploadResponse, ShareResponse, UpdateFileRequest, UpdateFolderRequest, UserInfo,
};
use super::handlers;

/// Path of the generated document.
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// Path of the Swagger UI.
pub const SWAGGER_UI_PATH: &str = "/swagger-ui";

#[derive(OpenApi)]
#[openapi(
    info(title = "drivebox API", description = "Personal cloud storage backed by Google Drive"),
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::refresh,
        handlers::auth::me,
        handlers::folder::list_folders,
        handlers::folder::create_folder,
        handlers::folder::get_root_folder,
        handlers::folder::get_folder,
        handlers::folder::update_folder,
        handlers::folder::delete_folder,
        handlers::folder::list_subfolders,
        handlers::folder::get_folder_path,
        handlers::file::list_files,
        handlers::file::list_folder_files,
        handlers::file::upload_files,
        handlers::file::get_file,
        handlers::file::update_file,
        handlers::file::delete_file,
        handlers::file::download_file,
        handlers::relay::relay_upload,
        handlers::relay::relay_download,
        handlers::relay::get_shared_file,
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        LogoutRequest,
        RefreshRequest,
        LoginResponse,
        RefreshResponse,
        UserInfo,
        MeResponse,
        CreateFolderRequest,
        UpdateFolderRequest,
        FolderResponse,
        DeleteFolderResponse,
        UpdateFileRequest,
        FileResponse,
        ShareResponse,
        RelayUploadResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration and sessions"),
        (name = "folders", description = "Folder tree"),
        (name = "files", description = "File metadata and content"),
        (name = "relay", description = "Direct Drive relay and share links")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
