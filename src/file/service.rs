//! File service.
//!
//! Coordinates the metadata repositories with the Drive content store:
//! - Upload with size and ownership checks
//! - Download through the owner's metadata
//! - Deletion of files and folder subtrees, content included

use sqlx::SqlitePool;
use tracing::{info, warn};

use super::classify::{classify, mime_for};
use super::folder::FolderRepository;
use super::metadata::{sanitize_file_name, FileRepository, NewFile, StoredFile};
use super::DEFAULT_MAX_FILE_SIZE;
use crate::drive::DriveStore;
use crate::ids::{FileId, FolderId, UserId};
use crate::{DriveboxError, Result};

/// Request data for file upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Folder to upload into.
    pub folder_id: FolderId,
    /// Client-supplied file name.
    pub name: String,
    /// Declared MIME type, if any.
    pub mime_type: Option<String>,
    /// File content.
    pub content: Vec<u8>,
}

impl UploadRequest {
    /// Create a new upload request.
    pub fn new(folder_id: FolderId, name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            folder_id,
            name: name.into(),
            mime_type: None,
            content,
        }
    }

    /// Set the declared MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Result of a file download.
#[derive(Debug)]
pub struct DownloadResult {
    /// File metadata.
    pub metadata: StoredFile,
    /// File content.
    pub content: Vec<u8>,
}

/// File service for managing file uploads and downloads.
pub struct FileService<'a> {
    pool: &'a SqlitePool,
    drive: &'a dyn DriveStore,
    max_file_size: u64,
}

impl<'a> FileService<'a> {
    /// Create a new FileService.
    pub fn new(pool: &'a SqlitePool, drive: &'a dyn DriveStore) -> Self {
        Self {
            pool,
            drive,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Create a new FileService with a custom max file size.
    pub fn with_max_file_size(mut self, max_size: u64) -> Self {
        self.max_file_size = max_size;
        self
    }

    /// Get the configured max file size.
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Reject content over the size limit.
    pub fn check_size(&self, name: &str, size: u64) -> Result<()> {
        if size > self.max_file_size {
            return Err(DriveboxError::PayloadTooLarge(format!(
                "File '{name}' is too big. Max size is {}MB and the file is {size} bytes",
                self.max_file_mb()
            )));
        }
        Ok(())
    }

    /// Error for content that overflowed the request body before its size
    /// could be counted.
    pub fn too_big(&self, name: Option<&str>) -> DriveboxError {
        let max_mb = self.max_file_mb();
        DriveboxError::PayloadTooLarge(match name {
            Some(name) => format!("File '{name}' is too big. Max size is {max_mb}MB"),
            None => format!("Upload is too big. Max size is {max_mb}MB per file"),
        })
    }

    fn max_file_mb(&self) -> u64 {
        self.max_file_size / 1024 / 1024
    }

    /// Upload a file into one of the user's folders.
    ///
    /// The content goes to Drive first; if the metadata cannot be recorded
    /// afterwards the Drive object is removed again.
    pub async fn upload(&self, user_id: &UserId, request: UploadRequest) -> Result<StoredFile> {
        let name = sanitize_file_name(&request.name)?;
        self.check_size(&name, request.content.len() as u64)?;

        FolderRepository::new(self.pool)
            .get(user_id, &request.folder_id)
            .await?
            .ok_or_else(|| DriveboxError::NotFound("folder".to_string()))?;

        let file_type = classify(&name, request.mime_type.as_deref());
        let mime_type = mime_for(&name, request.mime_type.as_deref());
        let size = request.content.len() as i64;

        let object = self.drive.upload(&name, &mime_type, request.content).await?;

        let new_file = NewFile {
            folder_id: request.folder_id,
            name,
            file_type,
            mime_type,
            size,
            gdrive_file_id: object.id.clone(),
        };
        match FileRepository::new(self.pool).create(user_id, &new_file).await {
            Ok(file) => {
                info!(
                    user_id = %user_id,
                    file_id = %file.id,
                    drive_id = %file.gdrive_file_id,
                    size = file.size,
                    "File uploaded"
                );
                Ok(file)
            }
            Err(e) => {
                if let Err(cleanup) = self.drive.delete(&object.id).await {
                    warn!(drive_id = %object.id, error = %cleanup, "Failed to remove orphaned Drive object");
                }
                Err(e)
            }
        }
    }

    /// Upload several files as one unit.
    ///
    /// Every name, size and folder is checked before anything is sent to
    /// Drive. If a later upload fails, the files already stored by this call
    /// are deleted again and the error is returned.
    pub async fn upload_all(
        &self,
        user_id: &UserId,
        requests: Vec<UploadRequest>,
    ) -> Result<Vec<StoredFile>> {
        let folders = FolderRepository::new(self.pool);
        for request in &requests {
            let name = sanitize_file_name(&request.name)?;
            self.check_size(&name, request.content.len() as u64)?;
            folders
                .get(user_id, &request.folder_id)
                .await?
                .ok_or_else(|| DriveboxError::NotFound("folder".to_string()))?;
        }

        let mut stored = Vec::with_capacity(requests.len());
        for request in requests {
            match self.upload(user_id, request).await {
                Ok(file) => stored.push(file),
                Err(e) => {
                    for file in &stored {
                        if let Err(cleanup) = self.delete_file(user_id, &file.id).await {
                            warn!(file_id = %file.id, error = %cleanup, "Failed to roll back upload");
                        }
                    }
                    return Err(e);
                }
            }
        }
        Ok(stored)
    }

    /// Download a file's metadata and content.
    pub async fn download(&self, user_id: &UserId, file_id: &FileId) -> Result<DownloadResult> {
        let metadata = FileRepository::new(self.pool).get(user_id, file_id).await?;
        let download = self.drive.download(&metadata.gdrive_file_id).await?;

        Ok(DownloadResult {
            metadata,
            content: download.content,
        })
    }

    /// Delete a file record and its Drive object.
    ///
    /// Drive failures are logged, not returned: the record is already gone.
    pub async fn delete_file(&self, user_id: &UserId, file_id: &FileId) -> Result<StoredFile> {
        let repo = FileRepository::new(self.pool);
        let file = repo.get(user_id, file_id).await?;
        repo.delete(user_id, file_id).await?;

        if let Err(e) = self.drive.delete(&file.gdrive_file_id).await {
            warn!(file_id = %file.id, drive_id = %file.gdrive_file_id, error = %e, "Failed to delete Drive object");
        }
        info!(user_id = %user_id, file_id = %file.id, "File deleted");
        Ok(file)
    }

    /// Delete a folder subtree with every file in it. Returns the number of
    /// files removed.
    pub async fn delete_folder(&self, user_id: &UserId, folder_id: &FolderId) -> Result<usize> {
        let folders = FolderRepository::new(self.pool);
        let folder = folders
            .get(user_id, folder_id)
            .await?
            .ok_or_else(|| DriveboxError::NotFound("folder".to_string()))?;
        if folder.is_root() {
            return Err(DriveboxError::Permission(
                "the root folder cannot be deleted".to_string(),
            ));
        }

        let drive_ids = FileRepository::new(self.pool)
            .drive_ids_in_subtree(user_id, folder_id)
            .await?;
        folders.delete(user_id, folder_id).await?;

        for drive_id in &drive_ids {
            if let Err(e) = self.drive.delete(drive_id).await {
                warn!(drive_id = %drive_id, error = %e, "Failed to delete Drive object");
            }
        }
        info!(
            user_id = %user_id,
            folder_id = %folder_id,
            files = drive_ids.len(),
            "Folder deleted"
        );
        Ok(drive_ids.len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::db::{NewUser, UserRepository};
    use crate::drive::{DriveDownload, DriveObject, MemoryDriveStore};
    use crate::file::{FileType, NewFolder, FILE_NOT_FOUND};
    use crate::Database;

    /// Removes a folder while its upload is in flight, so recording fails.
    struct FolderRemovingDrive {
        inner: MemoryDriveStore,
        pool: SqlitePool,
        folder_id: FolderId,
    }

    #[async_trait]
    impl DriveStore for FolderRemovingDrive {
        async fn upload(&self, name: &str, mime_type: &str, content: Vec<u8>) -> Result<DriveObject> {
            sqlx::query("DELETE FROM folders WHERE id = ?")
                .bind(&self.folder_id)
                .execute(&self.pool)
                .await?;
            self.inner.upload(name, mime_type, content).await
        }

        async fn download(&self, id: &str) -> Result<DriveDownload> {
            self.inner.download(id).await
        }

        async fn delete(&self, id: &str) -> Result<()> {
            self.inner.delete(id).await
        }

        fn backend_name(&self) -> &str {
            "folder-removing"
        }
    }

    /// Accepts a fixed number of uploads, then fails.
    struct LimitedDrive {
        inner: MemoryDriveStore,
        remaining: AtomicUsize,
    }

    #[async_trait]
    impl DriveStore for LimitedDrive {
        async fn upload(&self, name: &str, mime_type: &str, content: Vec<u8>) -> Result<DriveObject> {
            let left = self.remaining.load(Ordering::SeqCst);
            if left == 0 {
                return Err(DriveboxError::Drive("upload failed: HTTP 503".to_string()));
            }
            self.remaining.store(left - 1, Ordering::SeqCst);
            self.inner.upload(name, mime_type, content).await
        }

        async fn download(&self, id: &str) -> Result<DriveDownload> {
            self.inner.download(id).await
        }

        async fn delete(&self, id: &str) -> Result<()> {
            self.inner.delete(id).await
        }

        fn backend_name(&self) -> &str {
            "limited"
        }
    }

    async fn setup() -> (Database, MemoryDriveStore, UserId, FolderId) {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("service@example.com", "hash"))
            .await
            .unwrap();
        let root = FolderRepository::new(db.pool())
            .get_or_create_root(&user.id)
            .await
            .unwrap();
        (db, MemoryDriveStore::new(), user.id, root.id)
    }

    #[tokio::test]
    async fn test_upload_records_metadata() {
        let (db, drive, user_id, root_id) = setup().await;
        let service = FileService::new(db.pool(), &drive);

        let file = service
            .upload(
                &user_id,
                UploadRequest::new(root_id.clone(), "uploads/photo.PNG", vec![1, 2, 3]),
            )
            .await
            .unwrap();

        assert_eq!(file.name, "photo.PNG");
        assert_eq!(file.file_type, FileType::Image);
        assert_eq!(file.mime_type, "image/png");
        assert_eq!(file.size, 3);
        assert_eq!(file.folder_id, root_id);
        assert!(drive.contains(&file.gdrive_file_id).await);
    }

    #[tokio::test]
    async fn test_declared_mime_type_wins() {
        let (db, drive, user_id, root_id) = setup().await;
        let service = FileService::new(db.pool(), &drive);

        let file = service
            .upload(
                &user_id,
                UploadRequest::new(root_id, "script", b"#!/bin/sh".to_vec())
                    .with_mime_type("application/x-sh"),
            )
            .await
            .unwrap();
        assert_eq!(file.file_type, FileType::Code);
        assert_eq!(file.mime_type, "application/x-sh");
    }

    #[tokio::test]
    async fn test_generic_mime_type_classifies_by_extension() {
        let (db, drive, user_id, root_id) = setup().await;
        let service = FileService::new(db.pool(), &drive);

        let undeclared = service
            .upload(&user_id, UploadRequest::new(root_id.clone(), "app.ts", b"let x = 1;".to_vec()))
            .await
            .unwrap();
        assert_eq!(undeclared.file_type, FileType::Code);

        let generic = service
            .upload(
                &user_id,
                UploadRequest::new(root_id, "app.ts", b"let x = 1;".to_vec())
                    .with_mime_type("application/octet-stream"),
            )
            .await
            .unwrap();
        assert_eq!(generic.file_type, FileType::Code);
    }

    #[tokio::test]
    async fn test_upload_too_large() {
        let (db, drive, user_id, root_id) = setup().await;
        let service = FileService::new(db.pool(), &drive).with_max_file_size(1024 * 1024);

        let result = service
            .upload(
                &user_id,
                UploadRequest::new(root_id, "big.bin", vec![0; 1024 * 1024 + 1]),
            )
            .await;

        match result {
            Err(DriveboxError::PayloadTooLarge(msg)) => assert_eq!(
                msg,
                "File 'big.bin' is too big. Max size is 1MB and the file is 1048577 bytes"
            ),
            other => panic!("Expected payload too large, got {other:?}"),
        }
        assert!(drive.is_empty().await);
    }

    #[tokio::test]
    async fn test_upload_into_foreign_folder() {
        let (db, drive, _, root_id) = setup().await;
        let intruder = UserRepository::new(db.pool())
            .create(&NewUser::new("intruder@example.com", "hash"))
            .await
            .unwrap();
        let service = FileService::new(db.pool(), &drive);

        let result = service
            .upload(&intruder.id, UploadRequest::new(root_id, "x.txt", vec![1]))
            .await;
        assert!(matches!(result, Err(DriveboxError::NotFound(_))));
        assert!(drive.is_empty().await);
    }

    #[tokio::test]
    async fn test_drive_failure_records_nothing() {
        let (db, drive, user_id, root_id) = setup().await;
        drive.set_fail_uploads(true);
        let service = FileService::new(db.pool(), &drive);

        let result = service
            .upload(&user_id, UploadRequest::new(root_id, "a.txt", vec![1]))
            .await;
        assert!(matches!(result, Err(DriveboxError::Drive(_))));
        assert!(FileRepository::new(db.pool())
            .list_all(&user_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_recording_failure_removes_drive_object() {
        let (db, _, user_id, _) = setup().await;
        let folder = FolderRepository::new(db.pool())
            .create(&user_id, &NewFolder::new("Vanishing"))
            .await
            .unwrap();
        let drive = FolderRemovingDrive {
            inner: MemoryDriveStore::new(),
            pool: db.pool().clone(),
            folder_id: folder.id.clone(),
        };
        let service = FileService::new(db.pool(), &drive);

        let result = service
            .upload(&user_id, UploadRequest::new(folder.id, "a.txt", vec![1]))
            .await;

        assert!(matches!(result, Err(DriveboxError::NotFound(_))));
        assert!(drive.inner.is_empty().await);
        assert!(FileRepository::new(db.pool())
            .list_all(&user_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_upload_all_checks_every_file_first() {
        let (db, drive, user_id, root_id) = setup().await;
        let service = FileService::new(db.pool(), &drive).with_max_file_size(1024 * 1024);

        let result = service
            .upload_all(
                &user_id,
                vec![
                    UploadRequest::new(root_id.clone(), "small.txt", vec![1]),
                    UploadRequest::new(root_id, "big.bin", vec![0; 1024 * 1024 + 1]),
                ],
            )
            .await;

        assert!(matches!(result, Err(DriveboxError::PayloadTooLarge(_))));
        assert!(drive.is_empty().await);
    }

    #[tokio::test]
    async fn test_upload_all_rolls_back_on_drive_failure() {
        let (db, _, user_id, root_id) = setup().await;
        let drive = LimitedDrive {
            inner: MemoryDriveStore::new(),
            remaining: AtomicUsize::new(1),
        };
        let service = FileService::new(db.pool(), &drive);

        let result = service
            .upload_all(
                &user_id,
                vec![
                    UploadRequest::new(root_id.clone(), "one.txt", vec![1]),
                    UploadRequest::new(root_id, "two.txt", vec![2]),
                ],
            )
            .await;

        assert!(matches!(result, Err(DriveboxError::Drive(_))));
        assert!(drive.inner.is_empty().await);
        assert!(FileRepository::new(db.pool())
            .list_all(&user_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_upload_all_stores_every_file() {
        let (db, drive, user_id, root_id) = setup().await;
        let service = FileService::new(db.pool(), &drive);

        let files = service
            .upload_all(
                &user_id,
                vec![
                    UploadRequest::new(root_id.clone(), "one.txt", vec![1]),
                    UploadRequest::new(root_id, "two.txt", vec![2]),
                ],
            )
            .await
            .unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(drive.len().await, 2);
    }

    #[tokio::test]
    async fn test_download_round_trip() {
        let (db, drive, user_id, root_id) = setup().await;
        let service = FileService::new(db.pool(), &drive);
        let file = service
            .upload(&user_id, UploadRequest::new(root_id, "notes.md", b"# hi".to_vec()))
            .await
            .unwrap();

        let result = service.download(&user_id, &file.id).await.unwrap();
        assert_eq!(result.content, b"# hi");
        assert_eq!(result.metadata.id, file.id);

        match service.download(&user_id, &FileId::new()).await {
            Err(DriveboxError::NotFound(msg)) => assert_eq!(msg, FILE_NOT_FOUND),
            other => panic!("Expected not found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_file_removes_content() {
        let (db, drive, user_id, root_id) = setup().await;
        let service = FileService::new(db.pool(), &drive);
        let file = service
            .upload(&user_id, UploadRequest::new(root_id, "a.txt", vec![1]))
            .await
            .unwrap();

        service.delete_file(&user_id, &file.id).await.unwrap();
        assert!(drive.is_empty().await);
        assert!(service.delete_file(&user_id, &file.id).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_file_tolerates_missing_drive_object() {
        let (db, drive, user_id, root_id) = setup().await;
        let service = FileService::new(db.pool(), &drive);
        let file = service
            .upload(&user_id, UploadRequest::new(root_id, "a.txt", vec![1]))
            .await
            .unwrap();
        drive.delete(&file.gdrive_file_id).await.unwrap();

        assert!(service.delete_file(&user_id, &file.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_folder_removes_subtree_content() {
        let (db, drive, user_id, root_id) = setup().await;
        let folders = FolderRepository::new(db.pool());
        let service = FileService::new(db.pool(), &drive);

        let a = folders.create(&user_id, &NewFolder::new("A")).await.unwrap();
        let b = folders
            .create(&user_id, &NewFolder::new("B").with_parent(a.id.clone()))
            .await
            .unwrap();
        for (folder, name) in [(&a.id, "1.txt"), (&b.id, "2.txt"), (&root_id, "3.txt")] {
            service
                .upload(&user_id, UploadRequest::new(folder.clone(), name, vec![1]))
                .await
                .unwrap();
        }

        assert_eq!(service.delete_folder(&user_id, &a.id).await.unwrap(), 2);
        assert_eq!(drive.len().await, 1);
        assert!(folders.get(&user_id, &b.id).await.unwrap().is_none());

        let root = service.delete_folder(&user_id, &root_id).await;
        assert!(matches!(root, Err(DriveboxError::Permission(_))));
    }
}
