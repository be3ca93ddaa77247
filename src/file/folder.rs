//! Folder types and repository.
//!
//! Every query is scoped to the owning user: a folder that belongs to
//! someone else behaves exactly like one that does not exist.

use sqlx::{QueryBuilder, SqliteConnection, SqlitePool};
use tracing::debug;

use super::{MAX_FOLDER_DEPTH, MAX_FOLDER_NAME_LENGTH, ROOT_FOLDER_NAME};
use crate::ids::{FolderId, UserId};
use crate::{DriveboxError, Result};

const FOLDER_COLUMNS: &str = "id, user_id, name, parent_folder_id, color, created_at";

/// A folder in a user's tree.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Folder {
    /// Unique folder ID.
    pub id: FolderId,
    /// Owning user.
    pub user_id: UserId,
    /// Folder name (`__ROOT__` for the root).
    pub name: String,
    /// Parent folder ID (None only for the root).
    pub parent_folder_id: Option<FolderId>,
    /// Display colour (`#rgb` or `#rrggbb`).
    pub color: Option<String>,
    /// When the folder was created.
    pub created_at: String,
}

impl Folder {
    /// Whether this is the user's root folder.
    pub fn is_root(&self) -> bool {
        self.parent_folder_id.is_none()
    }
}

/// Data for creating a new folder.
#[derive(Debug, Clone)]
pub struct NewFolder {
    /// Folder name.
    pub name: String,
    /// Parent folder ID (None places it under the root).
    pub parent_folder_id: Option<FolderId>,
    /// Display colour.
    pub color: Option<String>,
}

impl NewFolder {
    /// Create a new NewFolder under the root.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_folder_id: None,
            color: None,
        }
    }

    /// Set the parent folder.
    pub fn with_parent(mut self, parent_folder_id: FolderId) -> Self {
        self.parent_folder_id = Some(parent_folder_id);
        self
    }

    /// Set the display colour.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Builder for updating a folder.
#[derive(Debug, Clone, Default)]
pub struct FolderUpdate {
    /// New folder name.
    pub name: Option<String>,
    /// New colour (`Some(None)` clears it).
    pub color: Option<Option<String>>,
    /// New parent folder.
    pub parent_folder_id: Option<FolderId>,
}

impl FolderUpdate {
    /// Create a new FolderUpdate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set or clear the colour.
    pub fn color(mut self, color: Option<impl Into<String>>) -> Self {
        self.color = Some(color.map(|c| c.into()));
        self
    }

    /// Move under another folder.
    pub fn parent_folder_id(mut self, parent_folder_id: FolderId) -> Self {
        self.parent_folder_id = Some(parent_folder_id);
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.color.is_none() && self.parent_folder_id.is_none()
    }
}

/// Validate a folder name and return it trimmed.
pub fn validate_folder_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DriveboxError::Validation(
            "folder name must not be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_FOLDER_NAME_LENGTH {
        return Err(DriveboxError::Validation(format!(
            "folder name must be at most {MAX_FOLDER_NAME_LENGTH} characters"
        )));
    }
    if name.chars().any(|c| c.is_control() || c == '/') {
        return Err(DriveboxError::Validation(
            "folder name contains invalid characters".to_string(),
        ));
    }
    if name == ROOT_FOLDER_NAME {
        return Err(DriveboxError::Validation(format!(
            "{ROOT_FOLDER_NAME} is a reserved folder name"
        )));
    }
    Ok(name.to_string())
}

/// Validate a `#rgb` / `#rrggbb` colour and return it lower-cased.
pub fn normalize_color(color: &str) -> Result<String> {
    let color = color.trim();
    let valid = color
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()));
    if !valid {
        return Err(DriveboxError::Validation(format!(
            "invalid colour '{color}', expected #rgb or #rrggbb"
        )));
    }
    Ok(color.to_ascii_lowercase())
}

/// Repository for folder operations.
pub struct FolderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FolderRepository<'a> {
    /// Create a new FolderRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a root folder for a user on an existing connection (or transaction).
    pub async fn insert_root(conn: &mut SqliteConnection, user_id: &UserId) -> Result<Folder> {
        let sql = format!(
            "INSERT INTO folders (id, user_id, name) VALUES (?, ?, ?) RETURNING {FOLDER_COLUMNS}"
        );
        let folder = sqlx::query_as::<_, Folder>(&sql)
            .bind(FolderId::new())
            .bind(user_id)
            .bind(ROOT_FOLDER_NAME)
            .fetch_one(conn)
            .await
            .map_err(|e| DriveboxError::Database(e.to_string()))?;
        Ok(folder)
    }

    /// Get the user's root folder, creating it when absent.
    pub async fn get_or_create_root(&self, user_id: &UserId) -> Result<Folder> {
        if let Some(root) = self.find_root(user_id).await? {
            return Ok(root);
        }

        debug!(user_id = %user_id, "Creating missing root folder");
        let inserted = {
            let mut conn = self.pool.acquire().await?;
            Self::insert_root(&mut *conn, user_id).await
        };
        match inserted {
            Ok(root) => Ok(root),
            // Lost a race with a concurrent request; the other root wins.
            Err(e) => self.find_root(user_id).await?.ok_or(e),
        }
    }

    async fn find_root(&self, user_id: &UserId) -> Result<Option<Folder>> {
        let sql = format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE user_id = ? AND parent_folder_id IS NULL"
        );
        let folder = sqlx::query_as::<_, Folder>(&sql)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| DriveboxError::Database(e.to_string()))?;
        Ok(folder)
    }

    /// Create a new folder.
    pub async fn create(&self, user_id: &UserId, folder: &NewFolder) -> Result<Folder> {
        let name = validate_folder_name(&folder.name)?;
        let color = folder.color.as_deref().map(normalize_color).transpose()?;

        let parent = match &folder.parent_folder_id {
            Some(parent_id) => self
                .get(user_id, parent_id)
                .await?
                .ok_or_else(|| DriveboxError::NotFound("folder".to_string()))?,
            None => self.get_or_create_root(user_id).await?,
        };

        let depth = self.get_depth(user_id, &parent.id).await? + 1;
        if depth > MAX_FOLDER_DEPTH {
            return Err(DriveboxError::Validation(format!(
                "folders can be nested at most {MAX_FOLDER_DEPTH} levels deep"
            )));
        }

        let sql = format!(
            "INSERT INTO folders (id, user_id, name, parent_folder_id, color)
             VALUES (?, ?, ?, ?, ?) RETURNING {FOLDER_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Folder>(&sql)
            .bind(FolderId::new())
            .bind(user_id)
            .bind(&name)
            .bind(&parent.id)
            .bind(&color)
            .fetch_one(self.pool)
            .await
            .map_err(|e| DriveboxError::Database(e.to_string()))?;

        Ok(created)
    }

    /// Get a folder by ID.
    pub async fn get(&self, user_id: &UserId, id: &FolderId) -> Result<Option<Folder>> {
        let sql = format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ? AND user_id = ?");
        let folder = sqlx::query_as::<_, Folder>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| DriveboxError::Database(e.to_string()))?;

        Ok(folder)
    }

    /// List every folder of a user except the root.
    pub async fn list_all(&self, user_id: &UserId) -> Result<Vec<Folder>> {
        let sql = format!(
            "SELECT {FOLDER_COLUMNS} FROM folders
             WHERE user_id = ? AND parent_folder_id IS NOT NULL
             ORDER BY created_at, name"
        );
        let folders = sqlx::query_as::<_, Folder>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await
            .map_err(|e| DriveboxError::Database(e.to_string()))?;

        Ok(folders)
    }

    /// List child folders of a folder.
    pub async fn list_subfolders(&self, user_id: &UserId, parent_id: &FolderId) -> Result<Vec<Folder>> {
        let sql = format!(
            "SELECT {FOLDER_COLUMNS} FROM folders
             WHERE user_id = ? AND parent_folder_id = ? AND name != ?
             ORDER BY name COLLATE NOCASE, created_at"
        );
        let folders = sqlx::query_as::<_, Folder>(&sql)
            .bind(user_id)
            .bind(parent_id)
            .bind(ROOT_FOLDER_NAME)
            .fetch_all(self.pool)
            .await
            .map_err(|e| DriveboxError::Database(e.to_string()))?;

        Ok(folders)
    }

    /// Update a folder (rename, recolour, move).
    pub async fn update(&self, user_id: &UserId, id: &FolderId, update: &FolderUpdate) -> Result<Folder> {
        let folder = self
            .get(user_id, id)
            .await?
            .ok_or_else(|| DriveboxError::NotFound("folder".to_string()))?;

        if update.is_empty() {
            return Ok(folder);
        }
        if folder.is_root() {
            return Err(DriveboxError::Permission(
                "the root folder cannot be modified".to_string(),
            ));
        }

        let name = update.name.as_deref().map(validate_folder_name).transpose()?;
        let color = match &update.color {
            Some(Some(c)) => Some(Some(normalize_color(c)?)),
            Some(None) => Some(None),
            None => None,
        };
        if let Some(target) = &update.parent_folder_id {
            self.check_move(user_id, &folder, target).await?;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE folders SET ");
        let mut separated = query.separated(", ");

        if let Some(name) = name {
            separated.push("name = ");
            separated.push_bind_unseparated(name);
        }

        if let Some(color) = color {
            separated.push("color = ");
            separated.push_bind_unseparated(color);
        }

        if let Some(parent_id) = &update.parent_folder_id {
            separated.push("parent_folder_id = ");
            separated.push_bind_unseparated(parent_id.clone());
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

        self.get(user_id, id)
            .await?
            .ok_or_else(|| DriveboxError::NotFound("folder".to_string()))
    }

    /// Reject moves that would create a cycle or exceed the depth limit.
    async fn check_move(&self, user_id: &UserId, folder: &Folder, target_id: &FolderId) -> Result<()> {
        if self.get(user_id, target_id).await?.is_none() {
            return Err(DriveboxError::NotFound("folder".to_string()));
        }

        let target_path = self.get_path(user_id, target_id).await?;
        if target_path.iter().any(|f| f.id == folder.id) {
            return Err(DriveboxError::Validation(
                "a folder cannot be moved into itself or one of its descendants".to_string(),
            ));
        }

        // target_path includes the root at depth 0.
        let new_depth = target_path.len();
        let height = self.subtree_height(user_id, &folder.id).await?;
        if new_depth + height > MAX_FOLDER_DEPTH {
            return Err(DriveboxError::Validation(format!(
                "folders can be nested at most {MAX_FOLDER_DEPTH} levels deep"
            )));
        }
        Ok(())
    }

    /// Levels below a folder (0 for a leaf).
    async fn subtree_height(&self, user_id: &UserId, id: &FolderId) -> Result<usize> {
        let height: i64 = sqlx::query_scalar(
            "WITH RECURSIVE subtree(id, level) AS (
                 SELECT id, 0 FROM folders WHERE id = ? AND user_id = ?
                 UNION ALL
                 SELECT f.id, s.level + 1 FROM folders f JOIN subtree s ON f.parent_folder_id = s.id
             )
             SELECT COALESCE(MAX(level), 0) FROM subtree",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| DriveboxError::Database(e.to_string()))?;

        Ok(height as usize)
    }

    /// Delete a folder and, by cascade, its subfolders and file records.
    pub async fn delete(&self, user_id: &UserId, id: &FolderId) -> Result<bool> {
        if let Some(folder) = self.get(user_id, id).await? {
            if folder.is_root() {
                return Err(DriveboxError::Permission(
                    "the root folder cannot be deleted".to_string(),
                ));
            }
        }

        let result = sqlx::query("DELETE FROM folders WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await
            .map_err(|e| DriveboxError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Get the depth of a folder (0 for the root).
    pub async fn get_depth(&self, user_id: &UserId, id: &FolderId) -> Result<usize> {
        let path = self.get_path(user_id, id).await?;
        Ok(path.len().saturating_sub(1))
    }

    /// Get the path from the root to a folder (root first).
    pub async fn get_path(&self, user_id: &UserId, id: &FolderId) -> Result<Vec<Folder>> {
        let mut path = Vec::new();
        let mut current_id = Some(id.clone());

        while let Some(folder_id) = current_id {
            // Guard against corrupt parent links.
            if path.len() > MAX_FOLDER_DEPTH + 1 {
                break;
            }
            if let Some(folder) = self.get(user_id, &folder_id).await? {
                current_id = folder.parent_folder_id.clone();
                path.push(folder);
            } else {
                break;
            }
        }

        path.reverse();
        Ok(path)
    }

    /// Count files directly in a folder.
    pub async fn count_files(&self, user_id: &UserId, folder_id: &FolderId) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE folder_id = ? AND user_id = ?")
                .bind(folder_id)
                .bind(user_id)
                .fetch_one(self.pool)
                .await
                .map_err(|e| DriveboxError::Database(e.to_string()))?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};
    use crate::Database;

    async fn setup_db() -> (Database, UserId) {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("folders@example.com", "hash"))
            .await
            .unwrap();
        (db, user.id)
    }

    async fn other_user(db: &Database) -> UserId {
        UserRepository::new(db.pool())
            .create(&NewUser::new("other@example.com", "hash"))
            .await
            .unwrap()
            .id
    }

    #[test]
    fn test_validate_folder_name() {
        assert_eq!(validate_folder_name("  Photos ").unwrap(), "Photos");
        assert!(validate_folder_name("   ").is_err());
        assert!(validate_folder_name("a/b").is_err());
        assert!(validate_folder_name("tab\there").is_err());
        assert!(validate_folder_name("__ROOT__").is_err());
        assert!(validate_folder_name(&"x".repeat(100)).is_ok());
        assert!(validate_folder_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_normalize_color() {
        assert_eq!(normalize_color("#FFAA00").unwrap(), "#ffaa00");
        assert_eq!(normalize_color("#AbC").unwrap(), "#abc");
        assert!(normalize_color("ffaa00").is_err());
        assert!(normalize_color("#ffaa0").is_err());
        assert!(normalize_color("#gggggg").is_err());
    }

    #[tokio::test]
    async fn test_get_or_create_root_is_stable() {
        let (db, user_id) = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let root = repo.get_or_create_root(&user_id).await.unwrap();
        assert_eq!(root.name, ROOT_FOLDER_NAME);
        assert!(root.is_root());

        let again = repo.get_or_create_root(&user_id).await.unwrap();
        assert_eq!(again.id, root.id);
    }

    #[tokio::test]
    async fn test_create_folder_defaults_to_root() {
        let (db, user_id) = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let folder = repo
            .create(&user_id, &NewFolder::new(" Photos ").with_color("#FF0000"))
            .await
            .unwrap();
        let root = repo.get_or_create_root(&user_id).await.unwrap();

        assert_eq!(folder.name, "Photos");
        assert_eq!(folder.parent_folder_id, Some(root.id));
        assert_eq!(folder.color.as_deref(), Some("#ff0000"));
        assert_eq!(folder.user_id, user_id);
    }

    #[tokio::test]
    async fn test_folders_are_scoped_to_owner() {
        let (db, user_id) = setup_db().await;
        let intruder = other_user(&db).await;
        let repo = FolderRepository::new(db.pool());

        let folder = repo.create(&user_id, &NewFolder::new("Private")).await.unwrap();

        assert!(repo.get(&intruder, &folder.id).await.unwrap().is_none());
        assert!(repo.list_all(&intruder).await.unwrap().is_empty());
        assert!(!repo.delete(&intruder, &folder.id).await.unwrap());

        let result = repo
            .create(&intruder, &NewFolder::new("Sneaky").with_parent(folder.id.clone()))
            .await;
        assert!(matches!(result, Err(DriveboxError::NotFound(_))));

        let result = repo
            .update(&intruder, &folder.id, &FolderUpdate::new().name("Mine"))
            .await;
        assert!(matches!(result, Err(DriveboxError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_all_and_subfolders_exclude_root() {
        let (db, user_id) = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let a = repo.create(&user_id, &NewFolder::new("b-folder")).await.unwrap();
        repo.create(&user_id, &NewFolder::new("A-folder")).await.unwrap();
        repo.create(&user_id, &NewFolder::new("nested").with_parent(a.id.clone()))
            .await
            .unwrap();

        let all = repo.list_all(&user_id).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|f| f.name != ROOT_FOLDER_NAME));

        let root = repo.get_or_create_root(&user_id).await.unwrap();
        let top: Vec<String> = repo
            .list_subfolders(&user_id, &root.id)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(top, vec!["A-folder", "b-folder"]);
    }

    #[tokio::test]
    async fn test_depth_limit() {
        let (db, user_id) = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let mut parent = repo.get_or_create_root(&user_id).await.unwrap();
        for level in 1..=MAX_FOLDER_DEPTH {
            parent = repo
                .create(
                    &user_id,
                    &NewFolder::new(format!("level{level}")).with_parent(parent.id.clone()),
                )
                .await
                .unwrap();
        }
        assert_eq!(repo.get_depth(&user_id, &parent.id).await.unwrap(), MAX_FOLDER_DEPTH);

        let too_deep = repo
            .create(&user_id, &NewFolder::new("too deep").with_parent(parent.id))
            .await;
        assert!(matches!(too_deep, Err(DriveboxError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_path() {
        let (db, user_id) = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let docs = repo.create(&user_id, &NewFolder::new("Docs")).await.unwrap();
        let work = repo
            .create(&user_id, &NewFolder::new("Work").with_parent(docs.id.clone()))
            .await
            .unwrap();

        let names: Vec<String> = repo
            .get_path(&user_id, &work.id)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec![ROOT_FOLDER_NAME, "Docs", "Work"]);
    }

    #[tokio::test]
    async fn test_update_rename_and_recolor() {
        let (db, user_id) = setup_db().await;
        let repo = FolderRepository::new(db.pool());
        let folder = repo
            .create(&user_id, &NewFolder::new("Old").with_color("#123456"))
            .await
            .unwrap();

        let updated = repo
            .update(&user_id, &folder.id, &FolderUpdate::new().name("New"))
            .await
            .unwrap();
        assert_eq!(updated.name, "New");
        assert_eq!(updated.color.as_deref(), Some("#123456"));

        let cleared = repo
            .update(&user_id, &folder.id, &FolderUpdate::new().color(None::<String>))
            .await
            .unwrap();
        assert!(cleared.color.is_none());

        let bad = repo
            .update(&user_id, &folder.id, &FolderUpdate::new().color(Some("red")))
            .await;
        assert!(matches!(bad, Err(DriveboxError::Validation(_))));
    }

    #[tokio::test]
    async fn test_move_rejects_cycles() {
        let (db, user_id) = setup_db().await;
        let repo = FolderRepository::new(db.pool());
        let a = repo.create(&user_id, &NewFolder::new("A")).await.unwrap();
        let b = repo
            .create(&user_id, &NewFolder::new("B").with_parent(a.id.clone()))
            .await
            .unwrap();

        let into_self = repo
            .update(&user_id, &a.id, &FolderUpdate::new().parent_folder_id(a.id.clone()))
            .await;
        assert!(matches!(into_self, Err(DriveboxError::Validation(_))));

        let into_child = repo
            .update(&user_id, &a.id, &FolderUpdate::new().parent_folder_id(b.id.clone()))
            .await;
        assert!(matches!(into_child, Err(DriveboxError::Validation(_))));

        let c = repo.create(&user_id, &NewFolder::new("C")).await.unwrap();
        let moved = repo
            .update(&user_id, &b.id, &FolderUpdate::new().parent_folder_id(c.id.clone()))
            .await
            .unwrap();
        assert_eq!(moved.parent_folder_id, Some(c.id));
    }

    #[tokio::test]
    async fn test_move_checks_subtree_depth() {
        let (db, user_id) = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        // A chain of 5 under the root: depth 1..=5.
        let mut deep = repo.get_or_create_root(&user_id).await.unwrap();
        for level in 1..=5 {
            deep = repo
                .create(&user_id, &NewFolder::new(format!("d{level}")).with_parent(deep.id.clone()))
                .await
                .unwrap();
        }

        // A subtree of height 5 (6 levels) elsewhere.
        let top = repo.create(&user_id, &NewFolder::new("top")).await.unwrap();
        let mut tail = top.clone();
        for level in 1..=5 {
            tail = repo
                .create(&user_id, &NewFolder::new(format!("t{level}")).with_parent(tail.id.clone()))
                .await
                .unwrap();
        }

        let result = repo
            .update(&user_id, &top.id, &FolderUpdate::new().parent_folder_id(deep.id))
            .await;
        assert!(matches!(result, Err(DriveboxError::Validation(_))));
    }

    #[tokio::test]
    async fn test_root_is_immutable() {
        let (db, user_id) = setup_db().await;
        let repo = FolderRepository::new(db.pool());
        let root = repo.get_or_create_root(&user_id).await.unwrap();

        let rename = repo
            .update(&user_id, &root.id, &FolderUpdate::new().name("Home"))
            .await;
        assert!(matches!(rename, Err(DriveboxError::Permission(_))));

        let delete = repo.delete(&user_id, &root.id).await;
        assert!(matches!(delete, Err(DriveboxError::Permission(_))));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_subfolders() {
        let (db, user_id) = setup_db().await;
        let repo = FolderRepository::new(db.pool());
        let parent = repo.create(&user_id, &NewFolder::new("Parent")).await.unwrap();
        let child = repo
            .create(&user_id, &NewFolder::new("Child").with_parent(parent.id.clone()))
            .await
            .unwrap();

        assert!(repo.delete(&user_id, &parent.id).await.unwrap());
        assert!(repo.get(&user_id, &child.id).await.unwrap().is_none());
        assert!(!repo.delete(&user_id, &parent.id).await.unwrap());
    }
}
