//! HTTP routes for the caller's session.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{sign_out, whoami};
use crate::state::AppState;

pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/session", get(whoami))
        .route("/auth/sign-out", post(sign_out))
}
