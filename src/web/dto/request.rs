//! Request DTOs for Web API.

use serde::{Deserialize, Deserializer};
use utoipa::ToSchema;
use validator::Validate;

use super::validation::{no_control_chars, not_empty_trimmed};

/// Login request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Email.
    #[validate(custom(function = "not_empty_trimmed"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Logout request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LogoutRequest {
    /// Refresh token to invalidate.
    pub refresh_token: String,
}

/// Token refresh request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    /// Refresh token.
    pub refresh_token: String,
}

/// User registration request.
///
/// Field rules are checked by `auth::validation`, so the messages match
/// the registration form.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Email.
    #[serde(default)]
    pub email: String,
    /// Password.
    #[serde(default)]
    pub password: String,
    /// Password confirmation.
    #[serde(default)]
    pub confirm_password: String,
}

/// Create folder request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFolderRequest {
    /// Folder name.
    #[validate(
        length(min = 1, max = 100, message = "Folder name must be 1-100 characters"),
        custom(function = "no_control_chars")
    )]
    pub name: String,
    /// Parent folder ID (defaults to the root folder).
    #[serde(default)]
    pub parent_folder_id: Option<String>,
    /// Display colour (`#RGB` or `#RRGGBB`).
    #[serde(default)]
    pub color: Option<String>,
}

/// Update folder request.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateFolderRequest {
    /// New name.
    #[serde(default)]
    #[validate(
        length(min = 1, max = 100, message = "Folder name must be 1-100 characters"),
        custom(function = "no_control_chars")
    )]
    pub name: Option<String>,
    /// New colour. An explicit `null` clears the colour.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub color: Option<Option<String>>,
    /// New parent folder ID.
    #[serde(default)]
    pub parent_folder_id: Option<String>,
}

/// Update file request.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateFileRequest {
    /// New file name.
    #[serde(default)]
    #[validate(
        length(min = 1, max = 255, message = "File name must be 1-255 characters"),
        custom(function = "no_control_chars")
    )]
    pub name: Option<String>,
    /// Destination folder ID.
    #[serde(default)]
    pub folder_id: Option<String>,
}

/// Distinguish a missing field (`None`) from an explicit `null`
/// (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
