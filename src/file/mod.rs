//! Folder and file management.
//!
//! This module provides:
//! - A per-user folder tree rooted at a hidden `__ROOT__` folder
//! - File metadata records pointing at Drive objects
//! - File-type classification
//! - Upload/download/delete orchestration across database and Drive

mod classify;
mod folder;
mod metadata;
mod service;

pub use classify::{
    classify, mime_for, FileType, AUDIO_EXTENSIONS, CODE_EXTENSIONS, IMAGE_EXTENSIONS,
    OCTET_STREAM, VIDEO_EXTENSIONS,
};
pub use folder::{normalize_color, validate_folder_name, Folder, FolderRepository, FolderUpdate, NewFolder};
pub use metadata::{sanitize_file_name, FileRepository, FileUpdate, NewFile, StoredFile, FILE_NOT_FOUND};
pub use service::{DownloadResult, FileService, UploadRequest};

/// Name of every user's root folder.
pub const ROOT_FOLDER_NAME: &str = "__ROOT__";

/// Maximum length for folder names (in characters).
pub const MAX_FOLDER_NAME_LENGTH: usize = 100;

/// Maximum length for file names (in characters).
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Maximum folder depth below the root.
pub const MAX_FOLDER_DEPTH: usize = 10;

/// Default maximum file size (10MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
