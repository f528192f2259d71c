//! Routes for the mailing list.

use axum::{routing::post, Router};

use super::handlers::{subscribe, unsubscribe};
use crate::state::AppState;

pub fn mailing_list_router() -> Router<AppState> {
    Router::new()
        .route("/api/mailing-list", post(subscribe))
        .route("/api/mailing-list/unsubscribe", post(unsubscribe))
}
