//! Routes for the caller's team.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{create, mine};
use crate::state::AppState;

pub fn teams_router() -> Router<AppState> {
    Router::new()
        .route("/api/teams", post(create))
        .route("/api/teams/mine", get(mine))
}
