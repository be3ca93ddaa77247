//! User repository for drivebox.

use sqlx::{SqliteConnection, SqlitePool};

use super::user::{NewUser, User};
use crate::ids::UserId;
use crate::{DriveboxError, Result};

const USER_COLUMNS: &str = "id, email, password, created_at, last_login";

/// Repository for user CRUD operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user on an existing connection (or transaction).
    pub async fn insert(conn: &mut SqliteConnection, new_user: &NewUser) -> Result<()> {
        sqlx::query("INSERT INTO users (id, email, password) VALUES (?, ?, ?)")
            .bind(&new_user.id)
            .bind(new_user.email.trim())
            .bind(&new_user.password)
            .execute(conn)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    DriveboxError::Conflict("User already registered".to_string())
                }
                e => DriveboxError::Database(e.to_string()),
            })?;
        Ok(())
    }

    /// Create a new user in the database.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let mut conn = self.pool.acquire().await?;
        Self::insert(&mut *conn, new_user).await?;
        drop(conn);

        self.get_by_id(&new_user.id)
            .await?
            .ok_or_else(|| DriveboxError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: &UserId) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| DriveboxError::Database(e.to_string()))?;
        Ok(user)
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email.trim())
            .fetch_optional(self.pool)
            .await
            .map_err(|e| DriveboxError::Database(e.to_string()))?;
        Ok(user)
    }

    /// Check if an email is already registered (case-insensitive).
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ? COLLATE NOCASE)")
                .bind(email.trim())
                .fetch_one(self.pool)
                .await
                .map_err(|e| DriveboxError::Database(e.to_string()))?;
        Ok(exists)
    }

    /// Update the last login timestamp for a user.
    pub async fn update_last_login(&self, id: &UserId) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = datetime('now') WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| DriveboxError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a user and, by cascade, everything they own.
    pub async fn delete(&self, id: &UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| DriveboxError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Count all users.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await
            .map_err(|e| DriveboxError::Database(e.to_string()))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_create_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let new_user = NewUser::new("alice@example.com", "hashedpw");
        let user = repo.create(&new_user).await.unwrap();

        assert_eq!(user.id, new_user.id);
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.password, "hashedpw");
        assert!(user.last_login.is_none());
        assert!(!user.created_at.is_empty());
    }

    #[tokio::test]
    async fn test_create_duplicate_email_different_case() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("alice@example.com", "pw"))
            .await
            .unwrap();
        let result = repo.create(&NewUser::new("ALICE@example.com", "pw")).await;

        match result {
            Err(DriveboxError::Conflict(msg)) => assert_eq!(msg, "User already registered"),
            other => panic!("Expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_by_email_case_insensitive() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());
        let created = repo
            .create(&NewUser::new("Bob@Example.com", "pw"))
            .await
            .unwrap();

        let found = repo.get_by_email(" bob@example.COM ").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(repo.get_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_email_exists() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());
        assert!(!repo.email_exists("carol@example.com").await.unwrap());

        repo.create(&NewUser::new("carol@example.com", "pw"))
            .await
            .unwrap();
        assert!(repo.email_exists("CAROL@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_last_login() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());
        let user = repo.create(&NewUser::new("d@example.com", "pw")).await.unwrap();

        repo.update_last_login(&user.id).await.unwrap();
        let user = repo.get_by_id(&user.id).await.unwrap().unwrap();
        assert!(user.last_login.is_some());
    }

    #[tokio::test]
    async fn test_delete_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());
        let user = repo.create(&NewUser::new("e@example.com", "pw")).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
        assert!(repo.delete(&user.id).await.unwrap());
        assert!(!repo.delete(&user.id).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
