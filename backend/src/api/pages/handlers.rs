//! Page handlers.
//!
//! Pages answer with a JSON screen document; rendering it is up to the
//! frontend. Applicant pages ask the resolver first and answer with a
//! temporary redirect when the caller belongs somewhere else.

use adapters::UserId;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::extract::{ApiJson, ApiQuery};
use crate::auth::{AdminUser, CurrentSession};
use crate::config::ApplicationCycle;
use crate::database::models::{Application, Team, User};
use crate::errors::{ApiError, ApiResult};
use crate::services::merch::{MerchError, MerchScreen};
use crate::services::resolver::PageOutcome;
use crate::services::review::ReviewStats;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LandingPage {
    pub signed_in: bool,
    pub cycle: ApplicationCycle,
}

#[derive(Debug, Serialize)]
pub struct SignInPage {
    pub signed_in: bool,
}

#[derive(Debug, Serialize)]
pub struct ClosedPage {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct IntakePage {
    pub profile: Option<User>,
}

#[derive(Debug, Serialize)]
pub struct StatusPage {
    pub application: Application,
    pub team: Option<Team>,
}

#[derive(Debug, Serialize)]
pub struct DashboardPage {
    pub profile: Option<User>,
    pub application: Application,
    pub team: Option<Team>,
}

#[derive(Debug, Serialize)]
pub struct AdminPage {
    pub reviewer: UserId,
    pub stats: ReviewStats,
}

#[derive(Debug, Default, Deserialize)]
pub struct UnsubscribeQuery {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UnsubscribePage {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MerchAnswer {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct MerchReward {
    pub reward_url: String,
}

fn redirect(target: &'static str) -> ApiResult<Response> {
    Ok(Redirect::temporary(target).into_response())
}

pub async fn landing(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Json<LandingPage> {
    Json(LandingPage {
        signed_in: !session.is_anonymous(),
        cycle: state.config.cycle,
    })
}

pub async fn sign_in(CurrentSession(session): CurrentSession) -> Json<SignInPage> {
    Json(SignInPage {
        signed_in: !session.is_anonymous(),
    })
}

pub async fn applications_closed() -> Json<ClosedPage> {
    Json(ClosedPage {
        message: "Applications are closed for this cycle.",
    })
}

pub async fn apply(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> ApiResult<Response> {
    if let PageOutcome::Redirect(target) = state.resolver().intake(&session).await? {
        return redirect(target);
    }

    let profile = match session.user_id.as_ref() {
        Some(user_id) => state.store.get_user(user_id).await?,
        None => None,
    };
    Ok(Json(IntakePage { profile }).into_response())
}

pub async fn status(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> ApiResult<Response> {
    let application = match state.resolver().status(&session).await? {
        PageOutcome::Render(application) => application,
        PageOutcome::Redirect(target) => return redirect(target),
    };

    let team = state.registration().team_of(&application).await?;
    Ok(Json(StatusPage { application, team }).into_response())
}

pub async fn dashboard(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> ApiResult<Response> {
    let application = match state.resolver().dashboard(&session).await? {
        PageOutcome::Render(application) => application,
        PageOutcome::Redirect(target) => return redirect(target),
    };

    let profile = state.store.get_user(&application.user_id).await?;
    let team = state.registration().team_of(&application).await?;
    Ok(Json(DashboardPage {
        profile,
        application,
        team,
    })
    .into_response())
}

pub async fn admin_home(
    State(state): State<AppState>,
    admin: AdminUser,
) -> ApiResult<Json<AdminPage>> {
    let stats = state.review().stats().await?;
    Ok(Json(AdminPage {
        reviewer: admin.user_id,
        stats,
    }))
}

pub async fn unsubscribe(ApiQuery(query): ApiQuery<UnsubscribeQuery>) -> Json<UnsubscribePage> {
    Json(UnsubscribePage { email: query.email })
}

pub async fn merch(State(state): State<AppState>) -> Json<MerchScreen> {
    Json(state.merch().screen(state.clock.now()))
}

pub async fn merch_solve(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<MerchAnswer>,
) -> ApiResult<Json<MerchReward>> {
    let reward_url = state
        .merch()
        .solve(state.clock.now(), &body.answer)
        .map_err(merch_error)?;
    Ok(Json(MerchReward {
        reward_url: reward_url.to_string(),
    }))
}

fn merch_error(err: MerchError) -> ApiError {
    let message = err.to_string();
    match err {
        MerchError::Unavailable => ApiError::NotFound(message),
        MerchError::Locked(_) => ApiError::Forbidden(message),
        MerchError::WrongAnswer => ApiError::Validation(message),
    }
}
