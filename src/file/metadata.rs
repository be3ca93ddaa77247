//! File metadata types and repository.

use sqlx::{QueryBuilder, SqlitePool};

use super::classify::FileType;
use super::MAX_FILENAME_LENGTH;
use crate::ids::{FileId, FolderId, UserId};
use crate::{DriveboxError, Result};

const FILE_COLUMNS: &str =
    "id, user_id, folder_id, name, file_type, mime_type, size, gdrive_file_id, created_at";

/// Message returned when a file id is unknown to the caller.
pub const FILE_NOT_FOUND: &str = "File does not exist";

/// Metadata of a file whose content lives in Drive.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StoredFile {
    /// Unique file ID.
    pub id: FileId,
    /// Owning user.
    pub user_id: UserId,
    /// Folder containing the file.
    pub folder_id: FolderId,
    /// Display name.
    pub name: String,
    /// Broad file category.
    pub file_type: FileType,
    /// MIME type recorded at upload.
    pub mime_type: String,
    /// Size in bytes.
    pub size: i64,
    /// Id of the Drive object holding the content.
    pub gdrive_file_id: String,
    /// When the file was uploaded.
    pub created_at: String,
}

/// Data for creating a new file record.
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Folder containing the file.
    pub folder_id: FolderId,
    /// Display name.
    pub name: String,
    /// Broad file category.
    pub file_type: FileType,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: i64,
    /// Drive object id.
    pub gdrive_file_id: String,
}

/// Builder for updating file metadata.
#[derive(Debug, Clone, Default)]
pub struct FileUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New containing folder.
    pub folder_id: Option<FolderId>,
}

impl FileUpdate {
    /// Create a new FileUpdate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Move to another folder.
    pub fn folder_id(mut self, folder_id: FolderId) -> Self {
        self.folder_id = Some(folder_id);
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.folder_id.is_none()
    }
}

/// Reduce a client-supplied file name to a safe display name.
///
/// Directory components (either separator) are dropped and control
/// characters removed.
pub fn sanitize_file_name(name: &str) -> Result<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return Err(DriveboxError::Validation(
            "file name must not be empty".to_string(),
        ));
    }
    if cleaned.chars().count() > MAX_FILENAME_LENGTH {
        return Err(DriveboxError::Validation(format!(
            "file name must be at most {MAX_FILENAME_LENGTH} characters"
        )));
    }
    Ok(cleaned.to_string())
}

/// Repository for file metadata operations.
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new file record. The folder must belong to the user.
    pub async fn create(&self, user_id: &UserId, file: &NewFile) -> Result<StoredFile> {
        self.ensure_folder(user_id, &file.folder_id).await?;

        let sql = format!(
            "INSERT INTO files (id, user_id, folder_id, name, file_type, mime_type, size, gdrive_file_id)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING {FILE_COLUMNS}"
        );
        let created = sqlx::query_as::<_, StoredFile>(&sql)
            .bind(FileId::new())
            .bind(user_id)
            .bind(&file.folder_id)
            .bind(&file.name)
            .bind(file.file_type)
            .bind(&file.mime_type)
            .bind(file.size)
            .bind(&file.gdrive_file_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    DriveboxError::Conflict("drive object is already recorded".to_string())
                }
                e => DriveboxError::Database(e.to_string()),
            })?;

        Ok(created)
    }

    async fn ensure_folder(&self, user_id: &UserId, folder_id: &FolderId) -> Result<()> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM folders WHERE id = ? AND user_id = ?)")
                .bind(folder_id)
                .bind(user_id)
                .fetch_one(self.pool)
                .await
                .map_err(|e| DriveboxError::Database(e.to_string()))?;

        if exists {
            Ok(())
        } else {
            Err(DriveboxError::NotFound("folder".to_string()))
        }
    }

    /// Get a file by ID, failing with "File does not exist" when unknown.
    pub async fn get(&self, user_id: &UserId, id: &FileId) -> Result<StoredFile> {
        self.find(user_id, id)
            .await?
            .ok_or_else(|| DriveboxError::NotFound(FILE_NOT_FOUND.to_string()))
    }

    /// Get a file by ID if it exists.
    pub async fn find(&self, user_id: &UserId, id: &FileId) -> Result<Option<StoredFile>> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ? AND user_id = ?");
        let file = sqlx::query_as::<_, StoredFile>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| DriveboxError::Database(e.to_string()))?;

        Ok(file)
    }

    /// Look up a file by its Drive object id, regardless of owner.
    pub async fn get_by_drive_id(&self, gdrive_file_id: &str) -> Result<Option<StoredFile>> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM files WHERE gdrive_file_id = ?");
        let file = sqlx::query_as::<_, StoredFile>(&sql)
            .bind(gdrive_file_id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| DriveboxError::Database(e.to_string()))?;

        Ok(file)
    }

    /// List every file of a user (newest first).
    pub async fn list_all(&self, user_id: &UserId) -> Result<Vec<StoredFile>> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE user_id = ?
             ORDER BY created_at DESC, name"
        );
        let files = sqlx::query_as::<_, StoredFile>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await
            .map_err(|e| DriveboxError::Database(e.to_string()))?;

        Ok(files)
    }

    /// List files in a folder, by name.
    pub async fn list_by_folder(&self, user_id: &UserId, folder_id: &FolderId) -> Result<Vec<StoredFile>> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE user_id = ? AND folder_id = ?
             ORDER BY name COLLATE NOCASE, created_at"
        );
        let files = sqlx::query_as::<_, StoredFile>(&sql)
            .bind(user_id)
            .bind(folder_id)
            .fetch_all(self.pool)
            .await
            .map_err(|e| DriveboxError::Database(e.to_string()))?;

        Ok(files)
    }

    /// Rename a file or move it to another of the user's folders.
    pub async fn update(&self, user_id: &UserId, id: &FileId, update: &FileUpdate) -> Result<StoredFile> {
        let file = self.get(user_id, id).await?;
        if update.is_empty() {
            return Ok(file);
        }

        let name = update.name.as_deref().map(sanitize_file_name).transpose()?;
        if let Some(folder_id) = &update.folder_id {
            self.ensure_folder(user_id, folder_id).await?;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE files SET ");
        let mut separated = query.separated(", ");

        if let Some(name) = name {
            separated.push("name = ");
            separated.push_bind_unseparated(name);
        }

        if let Some(folder_id) = &update.folder_id {
            separated.push("folder_id = ");
            separated.push_bind_unseparated(folder_id.clone());
        }

        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(" AND user_id = ");
        query.push_bind(user_id);

        query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| DriveboxError::Database(e.to_string()))?;

        self.get(user_id, id).await
    }

    /// Delete a file record.
    pub async fn delete(&self, user_id: &UserId, id: &FileId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await
            .map_err(|e| DriveboxError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Drive object ids of every file in a folder and its descendants.
    pub async fn drive_ids_in_subtree(&self, user_id: &UserId, folder_id: &FolderId) -> Result<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "WITH RECURSIVE subtree(id) AS (
                 SELECT id FROM folders WHERE id = ? AND user_id = ?
                 UNION ALL
                 SELECT f.id FROM folders f JOIN subtree s ON f.parent_folder_id = s.id
             )
             SELECT gdrive_file_id FROM files WHERE folder_id IN (SELECT id FROM subtree)",
        )
        .bind(folder_id)
        .bind(user_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| DriveboxError::Database(e.to_string()))?;

        Ok(ids)
    }
}
