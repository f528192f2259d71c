//! Handler functions for submitting and reading applications.

use axum::{extract::State, http::StatusCode, Json};

use crate::api::extract::ApiJson;
use crate::auth::SignedInUser;
use crate::database::models::Application;
use crate::errors::{ApiError, ApiResult};
use crate::services::registration::ApplicationForm;
use crate::state::AppState;

/// Creates the caller's application. New applications start out pending.
pub async fn submit(
    State(state): State<AppState>,
    user: SignedInUser,
    ApiJson(form): ApiJson<ApplicationForm>,
) -> ApiResult<(StatusCode, Json<Application>)> {
    let application = state
        .registration()
        .submit_application(&user.user_id, form)
        .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub async fn mine(
    State(state): State<AppState>,
    user: SignedInUser,
) -> ApiResult<Json<Application>> {
    state
        .store
        .find_application_by_user(&user.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("no application submitted".to_string()))
}
