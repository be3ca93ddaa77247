//! Web API module for drivebox.
//!
//! Serves the JSON API for accounts, folders and files, the plain Drive
//! relay endpoints and public share links.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
