//! Routes for the caller's profile.

use axum::{routing::get, Router};

use super::handlers::{get_profile, save_profile};
use crate::state::AppState;

pub fn user_router() -> Router<AppState> {
    Router::new().route("/api/user", get(get_profile).put(save_profile))
}
