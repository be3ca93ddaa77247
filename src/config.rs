//! Configuration for drivebox.

use serde::Deserialize;
use std::path::Path;

use crate::{DriveboxError, Result};

/// Web API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Host address to bind.
    #[serde(default = "default_web_host")]
    pub host: String,
    /// Port number for the HTTP server.
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// CORS allowed origins. Empty means any origin without credentials.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// JWT secret key (required).
    #[serde(default)]
    pub jwt_secret: String,
    /// Access token expiry in seconds.
    #[serde(default = "default_jwt_access_expiry")]
    pub jwt_access_token_expiry_secs: u64,
    /// Refresh token expiry in days.
    #[serde(default = "default_jwt_refresh_expiry")]
    pub jwt_refresh_token_expiry_days: u64,
    /// Rate limit for login/register (requests per minute per IP).
    #[serde(default = "default_login_rate_limit")]
    pub login_rate_limit: u32,
    /// Rate limit for the rest of the API (requests per minute per IP).
    #[serde(default = "default_api_rate_limit")]
    pub api_rate_limit: u32,
    /// Take the client address from `X-Forwarded-For`/`X-Real-IP`. Only
    /// enable behind a reverse proxy that overwrites these headers.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    3005
}

fn default_jwt_access_expiry() -> u64 {
    900 // 15 minutes
}

fn default_jwt_refresh_expiry() -> u64 {
    7
}

fn default_login_rate_limit() -> u32 {
    5
}

fn default_api_rate_limit() -> u32 {
    100
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            cors_origins: vec![],
            jwt_secret: String::new(),
            jwt_access_token_expiry_secs: default_jwt_access_expiry(),
            jwt_refresh_token_expiry_days: default_jwt_refresh_expiry(),
            login_rate_limit: default_login_rate_limit(),
            api_rate_limit: default_api_rate_limit(),
            trust_proxy_headers: false,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/drivebox.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Upload limits.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_max_upload_size() -> u64 {
    10
}

impl FilesConfig {
    /// Maximum upload size in bytes.
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Which [`DriveStore`](crate::drive::DriveStore) implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveBackend {
    /// Google Drive via a service account.
    Google,
    /// In-process store, content is lost on restart.
    Memory,
}

impl DriveBackend {
    /// Parse a backend name, as used in environment overrides.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "google" => Some(Self::Google),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Google Drive configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DriveConfig {
    /// Storage backend.
    #[serde(default = "default_drive_backend")]
    pub backend: DriveBackend,
    /// Path to the service-account credentials JSON.
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,
    /// Drive folder every uploaded file is placed in.
    #[serde(default)]
    pub folder_id: String,
    /// OAuth scopes requested for the service account.
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    /// Base URL of the Google APIs host.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// How often the access token is refreshed in the background.
    #[serde(default = "default_token_refresh_interval")]
    pub token_refresh_interval_secs: u64,
    /// Timeout for a single Drive request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_drive_backend() -> DriveBackend {
    DriveBackend::Google
}

fn default_credentials_path() -> String {
    "credentials.json".to_string()
}

fn default_scopes() -> Vec<String> {
    vec!["https://www.googleapis.com/auth/drive.file".to_string()]
}

fn default_api_base_url() -> String {
    "https://www.googleapis.com".to_string()
}

fn default_token_refresh_interval() -> u64 {
    2700 // 45 minutes, tokens live for an hour
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            backend: default_drive_backend(),
            credentials_path: default_credentials_path(),
            folder_id: String::new(),
            scopes: default_scopes(),
            api_base_url: default_api_base_url(),
            token_refresh_interval_secs: default_token_refresh_interval(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file, appended to alongside stdout.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Upload limits.
    #[serde(default)]
    pub files: FilesConfig,
    /// Google Drive configuration.
    #[serde(default)]
    pub drive: DriveConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(DriveboxError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| DriveboxError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `DRIVEBOX_JWT_SECRET`: JWT secret key
    /// - `GOOGLE_DRIVE_FOLDER_ID`: target Drive folder
    /// - `GOOGLE_APPLICATION_CREDENTIALS`: service-account credentials path
    /// - `DRIVEBOX_DRIVE_BACKEND`: `google` or `memory`
    /// - `PORT`: HTTP port
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup. Empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(secret) = get("DRIVEBOX_JWT_SECRET") {
            self.web.jwt_secret = secret;
        }
        if let Some(folder_id) = get("GOOGLE_DRIVE_FOLDER_ID") {
            self.drive.folder_id = folder_id;
        }
        if let Some(path) = get("GOOGLE_APPLICATION_CREDENTIALS") {
            self.drive.credentials_path = path;
        }
        if let Some(backend) = get("DRIVEBOX_DRIVE_BACKEND") {
            match DriveBackend::parse(&backend) {
                Some(backend) => self.drive.backend = backend,
                None => tracing::warn!(backend = %backend, "Ignoring unknown drive backend"),
            }
        }
        if let Some(port) = get("PORT") {
            match port.trim().parse() {
                Ok(port) => self.web.port = port,
                Err(_) => tracing::warn!(port = %port, "Ignoring invalid PORT value"),
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.web.jwt_secret.is_empty() {
            return Err(DriveboxError::Config(
                "jwt_secret is not set. Set [web].jwt_secret in config.toml \
                 or the DRIVEBOX_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }
        if self.drive.backend == DriveBackend::Google && self.drive.folder_id.is_empty() {
            return Err(DriveboxError::Config(
                "drive folder_id is not set. Set [drive].folder_id in config.toml \
                 or the GOOGLE_DRIVE_FOLDER_ID environment variable."
                    .to_string(),
            ));
        }
        if self.files.max_upload_size_mb == 0 {
            return Err(DriveboxError::Config(
                "max_upload_size_mb must be greater than zero".to_string(),
            ));
        }
        if self.drive.token_refresh_interval_secs == 0 {
            return Err(DriveboxError::Config(
                "token_refresh_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
