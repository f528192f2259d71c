//! Page routes.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;
use crate::services::resolver::{
    APPLICATIONS_CLOSED_PATH, DASHBOARD_PATH, INTAKE_PATH, SIGN_IN_PATH, STATUS_PATH,
};
use crate::state::AppState;

pub fn pages_router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::landing))
        .route(SIGN_IN_PATH, get(handlers::sign_in))
        .route(APPLICATIONS_CLOSED_PATH, get(handlers::applications_closed))
        .route(INTAKE_PATH, get(handlers::apply))
        .route(STATUS_PATH, get(handlers::status))
        .route(DASHBOARD_PATH, get(handlers::dashboard))
        .route("/dashboard/admin", get(handlers::admin_home))
        .route("/unsubscribe", get(handlers::unsubscribe))
        .route("/merch", get(handlers::merch))
        .route("/merch/solve", post(handlers::merch_solve))
}
