//! Typed identifiers.
//!
//! Users, folders and files are keyed by UUID v4 values stored as
//! hyphenated lower-case TEXT. Each kind of id is its own type so a folder
//! id can never be passed where a file id is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::DriveboxError;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
        )]
        #[serde(into = "String", try_from = "String")]
        #[sqlx(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh random id.
            pub fn new() -> Self {
                Self::from(Uuid::new_v4())
            }

            /// Parse an id, accepting any UUID spelling and normalising it.
            pub fn parse(s: &str) -> Result<Self, DriveboxError> {
                Uuid::parse_str(s.trim())
                    .map(Self::from)
                    .map_err(|_| DriveboxError::Validation(format!("invalid {} id: {s}", $label)))
            }

            /// The hyphenated lower-case form.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid.hyphenated().to_string())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = DriveboxError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(&s)
            }
        }

        impl FromStr for $name {
            type Err = DriveboxError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of a registered user.
    UserId,
    "user"
);

define_id!(
    /// Identifier of a folder.
    FolderId,
    "folder"
);

define_id!(
    /// Identifier of a file record.
    FileId,
    "file"
);
