//! Handler functions for team creation and lookup.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::api::extract::ApiJson;
use crate::auth::SignedInUser;
use crate::database::models::Team;
use crate::errors::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTeam {
    pub name: String,
}

pub async fn create(
    State(state): State<AppState>,
    user: SignedInUser,
    ApiJson(body): ApiJson<CreateTeam>,
) -> ApiResult<(StatusCode, Json<Team>)> {
    let team = state
        .registration()
        .create_team(&user.user_id, &body.name)
        .await?;
    Ok((StatusCode::CREATED, Json(team)))
}

pub async fn mine(State(state): State<AppState>, user: SignedInUser) -> ApiResult<Json<Team>> {
    let application = state
        .store
        .find_application_by_user(&user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("no application submitted".to_string()))?;

    state
        .registration()
        .team_of(&application)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("not on a team".to_string()))
}
