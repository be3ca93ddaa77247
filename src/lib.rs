//! drivebox - personal cloud storage backend.
//!
//! Folder and file metadata live in SQLite, scoped per user; file content
//! is relayed to a single Google Drive folder through a service account.

pub mod auth;
pub mod config;
pub mod datetime;
pub mod db;
pub mod drive;
pub mod error;
pub mod file;
pub mod ids;
pub mod logging;
pub mod web;

pub use auth::{
    authenticate, hash_password, register, verify_password, PasswordError, RegistrationError,
    RegistrationRequest, ValidationError,
};
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use drive::{DriveHandle, DriveStore, MemoryDriveStore};
pub use error::{DriveboxError, Result};
pub use file::{FileType, Folder, StoredFile};
pub use ids::{FileId, FolderId, UserId};
