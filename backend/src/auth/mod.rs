//! Authentication module: session resolution and access control.
//!
//! This module provides the middleware that turns request credentials into a
//! session, the extractors handlers use to demand a signed-in or privileged
//! caller, and the session endpoints.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;

// Re-exports for convenience
pub use errors::AuthError;
pub use middleware::resolve_session;
pub use models::{AdminUser, CurrentSession, SessionView, SignedInUser};
pub use routes::auth_router;
pub use service::AuthService;
