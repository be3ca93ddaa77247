//! File content storage.
//!
//! Content lives in Google Drive under a single service account; metadata
//! stays in the local database. The [`DriveStore`] trait keeps the rest of
//! the crate independent of the backend so tests and local development can
//! use [`MemoryDriveStore`].

mod client;
mod credentials;
mod memory;
mod token;

pub use client::{build_http_client, GoogleDriveClient};
pub use credentials::{ServiceAccountKey, DEFAULT_TOKEN_URI};
pub use memory::MemoryDriveStore;
pub use token::{AssertionClaims, TokenProvider, JWT_BEARER_GRANT};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::{DriveBackend, DriveConfig};
use crate::Result;

/// An object stored in Drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveObject {
    /// Drive file id.
    pub id: String,
    /// Object name.
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: u64,
}

/// Content fetched from Drive.
#[derive(Debug, Clone)]
pub struct DriveDownload {
    /// Object name.
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// File content.
    pub content: Vec<u8>,
}

/// Backend holding file content.
#[async_trait]
pub trait DriveStore: Send + Sync {
    /// Store content and return the new object.
    async fn upload(&self, name: &str, mime_type: &str, content: Vec<u8>) -> Result<DriveObject>;

    /// Fetch an object's content.
    async fn download(&self, id: &str) -> Result<DriveDownload>;

    /// Remove an object.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &str;
}

/// A configured storage backend plus the token provider behind it, if any.
#[derive(Clone)]
pub struct DriveHandle {
    /// The content store.
    pub store: Arc<dyn DriveStore>,
    /// Access-token source for the Google backend.
    pub tokens: Option<Arc<TokenProvider>>,
}

impl DriveHandle {
    /// Wrap a store that needs no token refreshing.
    pub fn from_store(store: Arc<dyn DriveStore>) -> Self {
        Self {
            store,
            tokens: None,
        }
    }

    /// Start the periodic access-token refresh, if this backend has tokens.
    pub fn start_token_refresh(&self, period: Duration) {
        if let Some(tokens) = &self.tokens {
            tokens.clone().spawn_refresh_task(period);
        }
    }
}

/// Create the storage backend described by the config.
///
/// For Google Drive the service-account credentials are loaded and an
/// access token is requested once up front. A failed first authorisation
/// is logged and retried on demand.
pub async fn create_drive(config: &DriveConfig) -> Result<DriveHandle> {
    match config.backend {
        DriveBackend::Memory => {
            info!("Using in-memory drive backend; content is lost on restart");
            Ok(DriveHandle::from_store(Arc::new(MemoryDriveStore::new())))
        }
        DriveBackend::Google => {
            let key = ServiceAccountKey::load(&config.credentials_path)?;
            let http = build_http_client(Duration::from_secs(config.request_timeout_secs))?;
            let tokens = Arc::new(TokenProvider::new(key, config.scopes.clone(), http.clone())?);

            match tokens.refresh().await {
                Ok(_) => info!("Google Drive service account authorised"),
                Err(e) => warn!(error = %e, "Initial Google Drive authorisation failed"),
            }

            let client = GoogleDriveClient::new(
                http,
                tokens.clone(),
                &config.api_base_url,
                &config.folder_id,
            );
            Ok(DriveHandle {
                store: Arc::new(client),
                tokens: Some(tokens),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_drive() {
        let config = DriveConfig {
            backend: DriveBackend::Memory,
            ..Default::default()
        };
        let drive = create_drive(&config).await.unwrap();
        assert_eq!(drive.store.backend_name(), "memory");
        assert!(drive.tokens.is_none());
    }

    #[tokio::test]
    async fn test_create_google_drive_requires_credentials() {
        let config = DriveConfig {
            backend: DriveBackend::Google,
            credentials_path: "/nonexistent/credentials.json".to_string(),
            folder_id: "folder".to_string(),
            ..Default::default()
        };
        assert!(create_drive(&config).await.is_err());
    }
}
