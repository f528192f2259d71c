//! Routes for the caller's application.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{mine, submit};
use crate::state::AppState;

pub fn applications_router() -> Router<AppState> {
    Router::new()
        .route("/api/applications", post(submit))
        .route("/api/applications/mine", get(mine))
}
