//! Router configuration for the web server.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    create_folder, delete_file, delete_folder, download_file, get_file, get_folder,
    get_folder_path, get_root_folder, get_shared_file, index, list_files, list_folder_files,
    list_folders, list_subfolders, login, logout, me, refresh, register, relay_download,
    relay_upload, update_file, update_folder, upload_files, AppState,
};
use super::middleware::{
    api_rate_limit, auth_rate_limit, create_cors_layer, jwt_auth, JwtState, RateLimitState,
};
use super::openapi::{ApiDoc, OPENAPI_JSON_PATH, SWAGGER_UI_PATH};

/// Room for multipart framing on top of the file content itself.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Request body limit for a given upload limit.
///
/// Twice the file limit, so a moderately oversized file is read in full and
/// its exact size reported. Bodies past this are cut off and reported as
/// oversized without a size.
pub fn body_limit(max_upload_size: u64) -> usize {
    usize::try_from(max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_mul(2)
        .saturating_add(MULTIPART_OVERHEAD)
}

/// Create the main router: JSON API, relay endpoints and share links.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    rate_limit_state: Arc<RateLimitState>,
    cors_origins: &[String],
) -> Router {
    let body_limit = body_limit(app_state.max_upload_size);

    // Credential endpoints get the strict bucket
    let auth_limit = rate_limit_state.clone();
    let auth_credential_routes = Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .layer(middleware::from_fn(move |req, next| {
            auth_rate_limit(auth_limit.clone(), req, next)
        }));

    let auth_routes = Router::new()
        .merge(auth_credential_routes)
        .route("/logout", post(logout))
        .route("/refresh", post(refresh))
        .route("/me", get(me));

    let folder_routes = Router::new()
        .route("/", get(list_folders).post(create_folder))
        .route("/root", get(get_root_folder))
        .route(
            "/:id",
            get(get_folder).patch(update_folder).delete(delete_folder),
        )
        .route("/:id/subfolders", get(list_subfolders))
        .route("/:id/path", get(get_folder_path))
        .route("/:id/files", get(list_folder_files).post(upload_files));

    let file_routes = Router::new()
        .route("/", get(list_files))
        .route("/:id", get(get_file).patch(update_file).delete(delete_file))
        .route("/:id/download", get(download_file));

    let api_limit = rate_limit_state;
    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/folders", folder_routes)
        .nest("/files", file_routes)
        .layer(middleware::from_fn(move |req, next| {
            api_rate_limit(api_limit.clone(), req, next)
        }));

    let relay_routes = Router::new()
        .route("/", get(index))
        .route("/gdrive/upload", post(relay_upload))
        .route("/gdrive/download/:file_id", get(relay_download))
        .route("/share/:gdrive_file_id", get(get_shared_file));

    let jwt_state_for_middleware = jwt_state.clone();

    Router::new()
        .nest("/api", api_routes)
        .merge(relay_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(CompressionLayer::new())
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state_for_middleware.clone();
                    jwt_auth(state, req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Create the Swagger UI router serving the OpenAPI document.
pub fn create_swagger_router() -> Router {
    SwaggerUi::new(SWAGGER_UI_PATH)
        .url(OPENAPI_JSON_PATH, ApiDoc::openapi())
        .into()
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
