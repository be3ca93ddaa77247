//! User model for drivebox.

use crate::ids::UserId;

/// A registered user.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login email (unique, case-insensitive).
    pub email: String,
    /// Password hash (Argon2).
    pub password: String,
    /// Account creation timestamp.
    pub created_at: String,
    /// Last login timestamp.
    pub last_login: Option<String>,
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Pre-assigned user ID.
    pub id: UserId,
    /// Login email.
    pub email: String,
    /// Password hash (should be pre-hashed with Argon2).
    pub password: String,
}

impl NewUser {
    /// Create a new user with a freshly generated id.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Use a specific id instead of a random one.
    pub fn with_id(mut self, id: UserId) -> Self {
        self.id = id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_builder() {
        let id = UserId::new();
        let user = NewUser::new("me@example.com", "hash").with_id(id.clone());
        assert_eq!(user.id, id);
        assert_eq!(user.email, "me@example.com");
        assert_eq!(user.password, "hash");
    }
}
