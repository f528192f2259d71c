//! Custom error types specific to authentication failures.
//!
//! These are raised by the request extractors when a handler needs more than
//! the caller's session provides. API routes answer with a JSON error, page
//! routes send anonymous callers to the sign-in page instead.

use axum::response::{IntoResponse, Redirect, Response};
use thiserror::Error;

use crate::errors::ApiError;
use crate::services::resolver::SIGN_IN_PATH;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Anonymous caller on an API route.
    #[error("sign in required")]
    Unauthenticated,

    /// Anonymous caller on a page route.
    #[error("sign in required")]
    SignInRequired,

    #[error("{0} role required")]
    MissingRole(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::Unauthenticated => ApiError::Unauthorized(self.to_string()).into_response(),
            AuthError::SignInRequired => Redirect::temporary(SIGN_IN_PATH).into_response(),
            AuthError::MissingRole(_) => ApiError::Forbidden(self.to_string()).into_response(),
        }
    }
}
