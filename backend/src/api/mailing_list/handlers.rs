//! Handler functions for mailing list subscriptions.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::extract::ApiJson;
use crate::database::models::Subscription;
use crate::errors::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EmailBody {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct Unsubscribed {
    pub unsubscribed: bool,
}

pub async fn subscribe(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<EmailBody>,
) -> ApiResult<Json<Subscription>> {
    Ok(Json(state.registration().subscribe(&body.email).await?))
}

/// Always answers the same way for known and unknown addresses.
pub async fn unsubscribe(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<EmailBody>,
) -> ApiResult<Json<Unsubscribed>> {
    state.registration().unsubscribe(&body.email).await?;
    Ok(Json(Unsubscribed { unsubscribed: true }))
}
