//! API handlers for the web server.

pub mod auth;
pub mod file;
pub mod folder;
pub mod relay;

pub use auth::*;
pub use file::*;
pub use folder::*;
pub use relay::*;
