//! Database schema and migrations for drivebox.
//!
//! Migrations are applied in order when the database is opened. The
//! `schema_version` table records which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: users, folders, files
    r#"
CREATE TABLE users (
    id          TEXT PRIMARY KEY,               -- UUID
    email       TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password    TEXT NOT NULL,                  -- Argon2 hash
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    last_login  TEXT
);

CREATE TABLE folders (
    id               TEXT PRIMARY KEY,
    user_id          TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name             TEXT NOT NULL,
    parent_folder_id TEXT REFERENCES folders(id) ON DELETE CASCADE,  -- NULL for the root
    color            TEXT,                      -- '#rrggbb'
    created_at       TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_folders_user_parent ON folders(user_id, parent_folder_id);
CREATE UNIQUE INDEX idx_folders_one_root ON folders(user_id) WHERE parent_folder_id IS NULL;

CREATE TABLE files (
    id              TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    folder_id       TEXT NOT NULL REFERENCES folders(id) ON DELETE CASCADE,
    name            TEXT NOT NULL,
    file_type       TEXT NOT NULL,              -- image, pdf, code, audio, video, other
    mime_type       TEXT NOT NULL,
    size            INTEGER NOT NULL,
    gdrive_file_id  TEXT NOT NULL UNIQUE,
    created_at      TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_files_user_folder ON files(user_id, folder_id);
"#,
    // v2: refresh tokens for web sessions
    r#"
CREATE TABLE refresh_tokens (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    token       TEXT NOT NULL UNIQUE,
    expires_at  TEXT NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    revoked_at  TEXT
);

CREATE INDEX idx_refresh_tokens_user ON refresh_tokens(user_id);
"#,
];
