//! Registration write operations.
//!
//! Profiles, applications, teams and mailing-list subscriptions are the
//! whole write surface for applicants. Input is validated here, the store
//! enforces uniqueness.

use adapters::UserId;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::ApplicationCycle;
use crate::database::models::{
    Application, ApplicationAnswers, ExperienceLevel, ShirtSize, Subscription, Team, User,
};
use crate::database::Store;
use crate::errors::{ApiError, ApiResult};
use crate::utils::normalize_email;

const MAX_NAME_LEN: usize = 100;
const MAX_TEAM_NAME_LEN: usize = 64;
const MAX_MOTIVATION_LEN: usize = 2000;

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationForm {
    pub school: String,
    pub major: String,
    pub graduation_year: i32,
    pub experience: ExperienceLevel,
    pub shirt_size: ShirtSize,
    pub motivation: String,
}

fn required(field: &str, value: &str, max: usize) -> ApiResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(ApiError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value.to_string())
}

impl ApplicationForm {
    pub fn validate(self) -> ApiResult<ApplicationAnswers> {
        if !(2000..=2100).contains(&self.graduation_year) {
            return Err(ApiError::Validation(format!(
                "graduation_year {} is out of range",
                self.graduation_year
            )));
        }

        Ok(ApplicationAnswers {
            school: required("school", &self.school, MAX_NAME_LEN)?,
            major: required("major", &self.major, MAX_NAME_LEN)?,
            graduation_year: self.graduation_year,
            experience: self.experience,
            shirt_size: self.shirt_size,
            motivation: required("motivation", &self.motivation, MAX_MOTIVATION_LEN)?,
        })
    }
}

pub struct Registration<'a> {
    store: &'a dyn Store,
    cycle: ApplicationCycle,
    now: DateTime<Utc>,
}

impl<'a> Registration<'a> {
    pub fn new(store: &'a dyn Store, cycle: ApplicationCycle, now: DateTime<Utc>) -> Self {
        Self { store, cycle, now }
    }

    pub async fn save_profile(&self, user_id: &UserId, form: ProfileForm) -> ApiResult<User> {
        let email = normalize_email(&form.email)
            .ok_or_else(|| ApiError::Validation("email is not a valid address".to_string()))?;

        let user = User {
            id: user_id.clone(),
            first_name: required("first_name", &form.first_name, MAX_NAME_LEN)?,
            last_name: required("last_name", &form.last_name, MAX_NAME_LEN)?,
            email,
            created_at: self.now,
            updated_at: self.now,
        };

        Ok(self.store.upsert_user(user).await?)
    }

    pub async fn submit_application(
        &self,
        user_id: &UserId,
        form: ApplicationForm,
    ) -> ApiResult<Application> {
        if self.cycle == ApplicationCycle::Closed {
            return Err(ApiError::Forbidden("applications are closed".to_string()));
        }

        let answers = form.validate()?;

        if self.store.get_user(user_id).await?.is_none() {
            return Err(ApiError::Validation(
                "complete your profile before applying".to_string(),
            ));
        }

        let application = self
            .store
            .insert_application(Application::new(user_id.clone(), answers, self.now))
            .await?;

        tracing::info!(user = %user_id, application = %application.id, "application submitted");
        Ok(application)
    }

    /// Creates a team and puts the owner's application on it.
    pub async fn create_team(&self, user_id: &UserId, name: &str) -> ApiResult<Team> {
        let name = required("name", name, MAX_TEAM_NAME_LEN)?;

        let application = self
            .store
            .find_application_by_user(user_id)
            .await?
            .ok_or_else(|| ApiError::Validation("submit an application first".to_string()))?;

        if application.team_id.is_some() {
            return Err(ApiError::Conflict("you are already on a team".to_string()));
        }

        let team = self
            .store
            .create_team_for(
                application.id,
                Team {
                    id: Uuid::new_v4(),
                    name,
                    owner_id: user_id.clone(),
                    created_at: self.now,
                },
            )
            .await?;

        tracing::info!(user = %user_id, team = %team.id, "team created");
        Ok(team)
    }

    pub async fn team_of(&self, application: &Application) -> ApiResult<Option<Team>> {
        match application.team_id {
            Some(team_id) => Ok(self.store.get_team(team_id).await?),
            None => Ok(None),
        }
    }

    pub async fn subscribe(&self, email: &str) -> ApiResult<Subscription> {
        let email = normalize_email(email)
            .ok_or_else(|| ApiError::Validation("email is not a valid address".to_string()))?;
        Ok(self.store.subscribe(&email).await?)
    }

    /// Unknown addresses succeed too, so the endpoint does not reveal who is
    /// subscribed.
    pub async fn unsubscribe(&self, email: &str) -> ApiResult<()> {
        let email = normalize_email(email)
            .ok_or_else(|| ApiError::Validation("email is not a valid address".to_string()))?;
        if !self.store.unsubscribe(&email).await? {
            tracing::debug!("unsubscribe for unknown address");
        }
        Ok(())
    }
}
