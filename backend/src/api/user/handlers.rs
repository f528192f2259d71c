//! Handler functions for the caller's profile.

use axum::{extract::State, Json};

use crate::api::extract::ApiJson;
use crate::auth::SignedInUser;
use crate::database::models::User;
use crate::errors::{ApiError, ApiResult};
use crate::services::registration::ProfileForm;
use crate::state::AppState;

pub async fn get_profile(
    State(state): State<AppState>,
    user: SignedInUser,
) -> ApiResult<Json<User>> {
    state
        .store
        .get_user(&user.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("no profile saved yet".to_string()))
}

pub async fn save_profile(
    State(state): State<AppState>,
    user: SignedInUser,
    ApiJson(form): ApiJson<ProfileForm>,
) -> ApiResult<Json<User>> {
    let saved = state
        .registration()
        .save_profile(&user.user_id, form)
        .await?;
    Ok(Json(saved))
}
