//! Authentication module for drivebox.
//!
//! This module provides password hashing, registration validation,
//! user registration and login.

mod password;
mod registration;
pub mod validation;

pub use password::{hash_password, verify_password, PasswordError};
pub use registration::{
    authenticate, register, RegistrationError, RegistrationRequest, INVALID_CREDENTIALS,
};
pub use validation::ValidationError;
