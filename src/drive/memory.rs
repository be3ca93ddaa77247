//! In-process content store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DriveDownload, DriveObject, DriveStore};
use crate::{DriveboxError, Result};

#[derive(Debug, Clone)]
struct MemoryObject {
    name: String,
    mime_type: String,
    content: Vec<u8>,
}

/// Keeps objects in a map. Used for local development and tests.
#[derive(Debug, Default)]
pub struct MemoryDriveStore {
    objects: RwLock<HashMap<String, MemoryObject>>,
    fail_uploads: AtomicBool,
}

impl MemoryDriveStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent uploads fail, to simulate a Drive outage.
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Whether an object exists.
    pub async fn contains(&self, id: &str) -> bool {
        self.objects.read().await.contains_key(id)
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl DriveStore for MemoryDriveStore {
    async fn upload(&self, name: &str, mime_type: &str, content: Vec<u8>) -> Result<DriveObject> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(DriveboxError::Drive("upload failed: HTTP 503".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let size = content.len() as u64;
        self.objects.write().await.insert(
            id.clone(),
            MemoryObject {
                name: name.to_string(),
                mime_type: mime_type.to_string(),
                content,
            },
        );

        Ok(DriveObject {
            id,
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            size,
        })
    }

    async fn download(&self, id: &str) -> Result<DriveDownload> {
        let objects = self.objects.read().await;
        let object = objects
            .get(id)
            .ok_or_else(|| DriveboxError::NotFound(format!("drive file {id}")))?;

        Ok(DriveDownload {
            name: object.name.clone(),
            mime_type: object.mime_type.clone(),
            content: object.content.clone(),
        })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match self.objects.write().await.remove(id) {
            Some(_) => Ok(()),
            None => Err(DriveboxError::NotFound(format!("drive file {id}"))),
        }
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_download_delete() {
        let store = MemoryDriveStore::new();
        let object = store
            .upload("hello.txt", "text/plain", b"hello".to_vec())
            .await
            .unwrap();
        assert_eq!(object.size, 5);
        assert!(store.contains(&object.id).await);

        let download = store.download(&object.id).await.unwrap();
        assert_eq!(download.name, "hello.txt");
        assert_eq!(download.content, b"hello");

        store.delete(&object.id).await.unwrap();
        assert!(store.is_empty().await);
        assert!(matches!(
            store.download(&object.id).await,
            Err(DriveboxError::NotFound(_))
        ));
        assert!(store.delete(&object.id).await.is_err());
    }

    #[tokio::test]
    async fn test_simulated_outage() {
        let store = MemoryDriveStore::new();
        store.set_fail_uploads(true);
        assert!(matches!(
            store.upload("a", "text/plain", vec![1]).await,
            Err(DriveboxError::Drive(_))
        ));
        assert_eq!(store.len().await, 0);
    }
}
