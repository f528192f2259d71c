//! Handler functions for the admin review table.
//!
//! Every handler takes an `AdminUser`, so non-admin callers are refused
//! before the review service is touched.

use axum::{extract::State, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::auth::AdminUser;
use crate::database::models::{Application, ApplicationStatus};
use crate::errors::ApiResult;
use crate::services::review::{ReviewParams, ReviewStats, ReviewTable};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: ApplicationStatus,
}

pub async fn list_applications(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiQuery(params): ApiQuery<ReviewParams>,
) -> ApiResult<Json<ReviewTable>> {
    let query = params.into_query()?;
    Ok(Json(state.review().table(query).await?))
}

pub async fn stats(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<Json<ReviewStats>> {
    Ok(Json(state.review().stats().await?))
}

pub async fn set_status(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(change): ApiJson<StatusChange>,
) -> ApiResult<Json<Application>> {
    let application = state
        .review()
        .set_status(&admin.user_id, id, change.status)
        .await?;
    Ok(Json(application))
}
