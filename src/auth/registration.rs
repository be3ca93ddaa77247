//! User registration and login.

use std::sync::OnceLock;

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};

use crate::auth::validation::{validate_registration, ValidationError};
use crate::auth::{hash_password, verify_password, PasswordError};
use crate::db::{NewUser, User, UserRepository};
use crate::file::FolderRepository;
use crate::DriveboxError;

/// Message used for every failed login, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Registration-specific errors.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// Validation failed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Email already registered.
    #[error("User already registered")]
    EmailExists,

    /// Password hashing failed.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl From<RegistrationError> for DriveboxError {
    fn from(e: RegistrationError) -> Self {
        match e {
            RegistrationError::Validation(v) => DriveboxError::Validation(v.to_string()),
            RegistrationError::EmailExists => {
                DriveboxError::Conflict("User already registered".to_string())
            }
            RegistrationError::Password(p) => DriveboxError::Auth(p.to_string()),
            RegistrationError::Database(msg) => DriveboxError::Database(msg),
        }
    }
}

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Login email.
    pub email: String,
    /// Password (8-128 characters, letters and digits).
    pub password: String,
    /// Repeated password.
    pub confirm_password: String,
}

impl RegistrationRequest {
    /// Create a new registration request.
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
        }
    }
}

/// Register a new user.
///
/// This function:
/// 1. Validates all input fields
/// 2. Checks if the email already exists
/// 3. Hashes the password
/// 4. Creates the user and their root folder in one transaction
pub async fn register(
    pool: &SqlitePool,
    request: RegistrationRequest,
) -> std::result::Result<User, RegistrationError> {
    validate_registration(&request.email, &request.password, &request.confirm_password)?;

    let repo = UserRepository::new(pool);
    let email = request.email.trim();
    if repo
        .email_exists(email)
        .await
        .map_err(|e| RegistrationError::Database(e.to_string()))?
    {
        return Err(RegistrationError::EmailExists);
    }

    let password_hash = hash_password(&request.password)?;
    let new_user = NewUser::new(email, password_hash);

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| RegistrationError::Database(e.to_string()))?;
    UserRepository::insert(&mut *tx, &new_user)
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent registration.
            DriveboxError::Conflict(_) => RegistrationError::EmailExists,
            e => RegistrationError::Database(e.to_string()),
        })?;
    let root = FolderRepository::insert_root(&mut *tx, &new_user.id)
        .await
        .map_err(|e| RegistrationError::Database(e.to_string()))?;
    tx.commit()
        .await
        .map_err(|e| RegistrationError::Database(e.to_string()))?;

    let user = repo
        .get_by_id(&new_user.id)
        .await
        .map_err(|e| RegistrationError::Database(e.to_string()))?
        .ok_or_else(|| RegistrationError::Database("user vanished after insert".to_string()))?;

    info!(
        user_id = %user.id,
        root_folder_id = %root.id,
        "New user registered"
    );

    Ok(user)
}

/// Hash checked when the email is unknown, so that path also pays for one
/// Argon2 verification.
fn unknown_user_hash() -> Option<&'static str> {
    static HASH: OnceLock<Option<String>> = OnceLock::new();
    HASH.get_or_init(|| hash_password("unknown-account-placeholder").ok())
        .as_deref()
}

/// Check an email/password pair and record the login.
///
/// Unknown emails and wrong passwords produce the same error.
pub async fn authenticate(pool: &SqlitePool, email: &str, password: &str) -> crate::Result<User> {
    let repo = UserRepository::new(pool);

    let user = match repo.get_by_email(email.trim()).await? {
        Some(user) => user,
        None => {
            if let Some(hash) = unknown_user_hash() {
                let _ = verify_password(password, hash);
            }
            debug!("Login attempt for unknown email");
            return Err(DriveboxError::Auth(INVALID_CREDENTIALS.to_string()));
        }
    };

    if verify_password(password, &user.password).is_err() {
        debug!(user_id = %user.id, "Login attempt with wrong password");
        return Err(DriveboxError::Auth(INVALID_CREDENTIALS.to_string()));
    }

    repo.update_last_login(&user.id).await?;
    Ok(user)
}
