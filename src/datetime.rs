//! Date/time utilities.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Format used by SQLite's `datetime('now')`.
pub const SQLITE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convert a database datetime string (YYYY-MM-DD HH:MM:SS) to RFC3339 format.
///
/// The database stores times in UTC, so this appends 'Z'. Values already in
/// RFC3339 form are returned unchanged.
///
/// # Examples
///
/// ```
/// use drivebox::datetime::to_rfc3339;
///
/// assert_eq!(to_rfc3339("2024-01-15 10:30:00"), "2024-01-15T10:30:00Z");
/// ```
pub fn to_rfc3339(datetime_str: &str) -> String {
    if DateTime::parse_from_rfc3339(datetime_str).is_ok() {
        return datetime_str.to_string();
    }
    format!("{}Z", datetime_str.replace(' ', "T"))
}

/// Format a UTC time the way SQLite stores it.
pub fn to_sqlite(dt: &DateTime<Utc>) -> String {
    dt.format(SQLITE_DATETIME_FORMAT).to_string()
}

/// Parse a database datetime string as UTC.
pub fn parse_sqlite(datetime_str: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(datetime_str, SQLITE_DATETIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
