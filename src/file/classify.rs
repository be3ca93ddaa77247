//! File-type classification from MIME types and file extensions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fallback MIME type for unknown content.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Broad category of a stored file, used by clients to pick an icon/viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum FileType {
    Image,
    Pdf,
    Code,
    Audio,
    Video,
    Other,
}

impl FileType {
    /// Database / wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Image => "image",
            FileType::Pdf => "pdf",
            FileType::Code => "code",
            FileType::Audio => "audio",
            FileType::Video => "video",
            FileType::Other => "other",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "image" => Ok(FileType::Image),
            "pdf" => Ok(FileType::Pdf),
            "code" => Ok(FileType::Code),
            "audio" => Ok(FileType::Audio),
            "video" => Ok(FileType::Video),
            "other" => Ok(FileType::Other),
            _ => Err(format!("unknown file type: {s}")),
        }
    }
}

pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "svg", "ico", "tif", "tiff", "heic", "heif",
    "avif",
];

pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "ogg", "oga", "flac", "aac", "m4a", "wma", "opus", "aiff", "mid", "midi",
];

pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "mov", "avi", "mkv", "webm", "wmv", "flv", "mpeg", "mpg", "3gp", "ogv",
];

pub const CODE_EXTENSIONS: &[&str] = &[
    "rs", "c", "h", "cc", "cpp", "cxx", "hpp", "cs", "java", "kt", "kts", "scala", "go", "py",
    "rb", "php", "pl", "swift", "m", "js", "mjs", "cjs", "jsx", "ts", "tsx", "html", "htm", "css",
    "scss", "sass", "less", "json", "xml", "yaml", "yml", "toml", "ini", "sql", "sh", "bash",
    "zsh", "fish", "ps1", "bat", "cmd", "lua", "r", "dart", "hs", "ex", "exs", "erl", "clj",
    "vue", "svelte", "md", "dockerfile", "makefile", "gradle",
];

/// MIME types (outside the text/x-* family) that denote source code.
const CODE_MIME_TYPES: &[&str] = &[
    "application/javascript",
    "application/x-javascript",
    "application/ecmascript",
    "application/typescript",
    "application/json",
    "application/ld+json",
    "application/xml",
    "application/xhtml+xml",
    "application/x-sh",
    "application/x-shellscript",
    "application/x-httpd-php",
    "application/x-python-code",
    "application/sql",
    "application/toml",
    "application/yaml",
    "application/x-yaml",
    "text/html",
    "text/css",
    "text/javascript",
    "text/xml",
    "text/markdown",
];

/// Lower-case MIME essence without parameters (`text/plain; charset=utf-8` -> `text/plain`).
fn normalize_mime(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Lower-case extension of a file name. Dot-files like `.bashrc` have none,
/// but a bare `Makefile`/`Dockerfile` is matched by name.
fn extension_of(file_name: &str) -> Option<String> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext.to_ascii_lowercase()),
        Some(_) => None,
        None => Some(base.to_ascii_lowercase()),
    }
}

fn classify_mime(mime: &str) -> Option<FileType> {
    if mime.is_empty() || mime == OCTET_STREAM {
        return None;
    }
    if mime == "application/pdf" {
        return Some(FileType::Pdf);
    }

    let (top, sub) = mime.split_once('/')?;
    match top {
        "image" => Some(FileType::Image),
        "audio" => Some(FileType::Audio),
        "video" => Some(FileType::Video),
        "text" if sub.starts_with("x-") => Some(FileType::Code),
        _ if CODE_MIME_TYPES.contains(&mime) => Some(FileType::Code),
        _ => None,
    }
}

fn classify_extension(ext: &str) -> FileType {
    if ext == "pdf" {
        FileType::Pdf
    } else if IMAGE_EXTENSIONS.contains(&ext) {
        FileType::Image
    } else if AUDIO_EXTENSIONS.contains(&ext) {
        FileType::Audio
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        FileType::Video
    } else if CODE_EXTENSIONS.contains(&ext) {
        FileType::Code
    } else {
        FileType::Other
    }
}

/// Classify a file from its declared MIME type, falling back to its extension.
pub fn classify(file_name: &str, mime_type: Option<&str>) -> FileType {
    let mime = mime_type.map(normalize_mime).unwrap_or_default();
    if let Some(file_type) = classify_mime(&mime) {
        return file_type;
    }

    extension_of(file_name)
        .map(|ext| classify_extension(&ext))
        .unwrap_or(FileType::Other)
}

/// Resolve the MIME type to store for an upload.
///
/// A declared type wins unless it is missing or the generic octet-stream, in
/// which case it is guessed from the file name.
pub fn mime_for(file_name: &str, declared: Option<&str>) -> String {
    match declared.map(normalize_mime) {
        Some(mime) if !mime.is_empty() && mime != OCTET_STREAM => mime,
        _ => mime_guess::from_path(file_name)
            .first_raw()
            .unwrap_or(OCTET_STREAM)
            .to_string(),
    }
}
