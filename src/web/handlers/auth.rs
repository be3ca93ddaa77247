//! Authentication handlers.

use axum::{extract::State, Json};
use jsonwebtoken::{encode, EncodingKey, Header};
use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::{authenticate, register as register_user, RegistrationError, RegistrationRequest};
use crate::datetime::to_rfc3339;
use crate::db::{NewRefreshToken, RefreshTokenRepository, User, UserRepository};
use crate::drive::DriveStore;
use crate::file::{FileService, FolderRepository, DEFAULT_MAX_FILE_SIZE};
use crate::web::dto::{
    ApiResponse, LoginRequest, LoginResponse, LogoutRequest, MeResponse, RefreshRequest,
    RefreshResponse, RegisterRequest, UserInfo, ValidatedJson,
};
use crate::web::error::{ApiError, ErrorCode};
use crate::web::middleware::{AuthUser, JwtClaims};
use crate::Database;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Metadata database.
    pub db: Arc<Database>,
    /// Content store for file bytes.
    pub drive: Arc<dyn DriveStore>,
    /// JWT encoding key.
    pub encoding_key: EncodingKey,
    /// Access token expiry in seconds.
    pub access_token_expiry: u64,
    /// Refresh token expiry in days.
    pub refresh_token_expiry: u64,
    /// Largest accepted upload in bytes.
    pub max_upload_size: u64,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        db: Arc<Database>,
        drive: Arc<dyn DriveStore>,
        jwt_secret: &str,
        access_expiry: u64,
        refresh_expiry: u64,
    ) -> Self {
        Self {
            db,
            drive,
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            access_token_expiry: access_expiry,
            refresh_token_expiry: refresh_expiry,
            max_upload_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Set the upload size limit in bytes.
    pub fn with_max_upload_size(mut self, bytes: u64) -> Self {
        self.max_upload_size = bytes;
        self
    }

    /// File service bound to this state's database and store.
    pub fn file_service(&self) -> FileService<'_> {
        FileService::new(self.db.pool(), self.drive.as_ref()).with_max_file_size(self.max_upload_size)
    }

    /// Generate an access token for a user.
    pub fn generate_access_token(&self, user: &User) -> Result<String, ApiError> {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = JwtClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iat: now,
            exp: now + self.access_token_expiry,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode JWT: {}", e);
            ApiError::internal("Failed to generate token")
        })
    }

    /// Generate a refresh token.
    pub fn generate_refresh_token(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Create and store a refresh token for the user.
    async fn store_refresh_token(&self, user: &User) -> Result<String, ApiError> {
        let token = self.generate_refresh_token();
        let expires_at =
            chrono::Utc::now() + chrono::Duration::days(self.refresh_token_expiry as i64);
        let new_token = NewRefreshToken {
            user_id: user.id.clone(),
            token: token.clone(),
            expires_at: crate::datetime::to_sqlite(&expires_at),
        };

        RefreshTokenRepository::new(self.db.pool())
            .create(&new_token)
            .await
            .map_err(|e| {
                tracing::error!("Failed to store refresh token: {}", e);
                ApiError::internal("Failed to create session")
            })?;
        Ok(token)
    }

    /// Issue a fresh access/refresh token pair for a login or registration.
    async fn login_response(&self, user: User) -> Result<LoginResponse, ApiError> {
        let access_token = self.generate_access_token(&user)?;
        let refresh_token = self.store_refresh_token(&user).await?;

        Ok(LoginResponse {
            access_token,
            refresh_token,
            expires_in: self.access_token_expiry,
            user: UserInfo {
                id: user.id.to_string(),
                email: user.email,
            },
        })
    }
}

fn registration_error(err: RegistrationError) -> ApiError {
    match err {
        RegistrationError::Validation(v) => {
            let message = v.to_string();
            let details = HashMap::from([(v.field().to_string(), vec![message.clone()])]);
            ApiError::with_details(ErrorCode::ValidationError, message, details)
        }
        RegistrationError::EmailExists => ApiError::conflict(err.to_string()),
        other => {
            tracing::error!("User registration failed: {}", other);
            ApiError::internal("Failed to create user")
        }
    }
}

/// POST /api/auth/register - User registration.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered and logged in", body = LoginResponse),
        (status = 409, description = "User already registered"),
        (status = 422, description = "Invalid email or password")
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let request = RegistrationRequest::new(req.email, req.password, req.confirm_password);
    let user = register_user(state.db.pool(), request)
        .await
        .map_err(registration_error)?;

    let response = state.login_response(user).await?;
    Ok(Json(ApiResponse::new(response)))
}

/// POST /api/auth/login - User login.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let user = authenticate(state.db.pool(), &req.email, &req.password).await?;
    tracing::info!(user_id = %user.id, "User logged in");

    let response = state.login_response(user).await?;
    Ok(Json(ApiResponse::new(response)))
}

/// POST /api/auth/logout - User logout.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    request_body = LogoutRequest,
    responses((status = 200, description = "Refresh token revoked"))
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LogoutRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let repo = RefreshTokenRepository::new(state.db.pool());
    if let Err(e) = repo.revoke(&req.refresh_token).await {
        tracing::warn!("Failed to revoke refresh token: {}", e);
    }

    Ok(Json(ApiResponse::new(())))
}

/// POST /api/auth/refresh - Refresh access token.
///
/// The presented refresh token is revoked and replaced.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = RefreshResponse),
        (status = 401, description = "Invalid or expired refresh token")
    )
)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<RefreshResponse>>, ApiError> {
    let user_id = RefreshTokenRepository::new(state.db.pool())
        .consume(&req.refresh_token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired refresh token"))?;

    let user = UserRepository::new(state.db.pool())
        .get_by_id(&user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    let access_token = state.generate_access_token(&user)?;
    let refresh_token = state.store_refresh_token(&user).await?;

    let response = RefreshResponse {
        access_token,
        refresh_token,
        expires_in: state.access_token_expiry,
    };

    Ok(Json(ApiResponse::new(response)))
}

/// GET /api/auth/me - Get current user info.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<MeResponse>>, ApiError> {
    let user_id = claims.user_id()?;
    let user = UserRepository::new(state.db.pool())
        .get_by_id(&user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let root = FolderRepository::new(state.db.pool())
        .get_or_create_root(&user.id)
        .await?;

    let response = MeResponse {
        id: user.id.to_string(),
        email: user.email,
        root_folder_id: root.id.to_string(),
        created_at: to_rfc3339(&user.created_at),
        last_login_at: user.last_login.as_deref().map(to_rfc3339),
    };

    Ok(Json(ApiResponse::new(response)))
}
