//! Routes for the admin review table.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{list_applications, set_status, stats};
use crate::state::AppState;

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/dashboard/admin/applications", get(list_applications))
        .route("/dashboard/admin/applications/:id/status", post(set_status))
        .route("/dashboard/admin/stats", get(stats))
}
