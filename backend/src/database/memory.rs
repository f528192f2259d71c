//! In-memory storage implementation

use std::collections::HashMap;
use std::sync::Arc;

use adapters::UserId;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{
    Application, ApplicationStatus, ReviewPage, ReviewQuery, ReviewRow, SortOrder, StatusCounts,
    Subscription, Team, User,
};
use super::{ApplicationStore, MailingListStore, StoreResult, TeamStore, UserStore};
use crate::errors::StoreError;

/// In-memory storage for development and testing
#[derive(Debug, Default)]
pub struct InMemoryStore {
    applications: Arc<RwLock<HashMap<Uuid, Application>>>,
    users: Arc<RwLock<HashMap<UserId, User>>>,
    teams: Arc<RwLock<HashMap<Uuid, Team>>>,
    subscriptions: Arc<RwLock<HashMap<String, Subscription>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApplicationStore for InMemoryStore {
    async fn find_application_by_user(&self, user_id: &UserId) -> StoreResult<Option<Application>> {
        let applications = self.applications.read().await;
        Ok(applications
            .values()
            .find(|a| &a.user_id == user_id)
            .cloned())
    }

    async fn get_application(&self, id: Uuid) -> StoreResult<Option<Application>> {
        let applications = self.applications.read().await;
        Ok(applications.get(&id).cloned())
    }

    async fn insert_application(&self, application: Application) -> StoreResult<Application> {
        let mut applications = self.applications.write().await;
        if applications
            .values()
            .any(|a| a.user_id == application.user_id)
        {
            return Err(StoreError::Conflict(format!(
                "user '{}' already has an application",
                application.user_id
            )));
        }
        applications.insert(application.id, application.clone());
        Ok(application)
    }

    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> StoreResult<Application> {
        let mut applications = self.applications.write().await;
        let application = applications
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("application '{id}'")))?;
        application.status = status;
        Ok(application.clone())
    }

    async fn review_page(&self, query: &ReviewQuery) -> StoreResult<ReviewPage> {
        let applications = self.applications.read().await;
        let users = self.users.read().await;
        let teams = self.teams.read().await;

        let mut matching: Vec<&Application> = applications
            .values()
            .filter(|a| query.status.map_or(true, |s| a.status == s))
            .collect();
        matching.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        if query.order == SortOrder::Desc {
            matching.reverse();
        }

        let total = matching.len();
        let rows = matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .map(|a| {
                let user = users.get(&a.user_id);
                ReviewRow {
                    application_id: a.id,
                    user_id: a.user_id.clone(),
                    first_name: user.map(|u| u.first_name.clone()),
                    last_name: user.map(|u| u.last_name.clone()),
                    email: user.map(|u| u.email.clone()),
                    school: a.answers.school.clone(),
                    experience: a.answers.experience,
                    status: a.status,
                    team_name: a
                        .team_id
                        .and_then(|id| teams.get(&id))
                        .map(|t| t.name.clone()),
                    created_at: a.created_at,
                }
            })
            .collect();

        Ok(ReviewPage { total, rows })
    }

    async fn count_by_status(&self) -> StoreResult<StatusCounts> {
        let applications = self.applications.read().await;
        let mut counts = StatusCounts::default();
        for application in applications.values() {
            counts.record(application.status);
        }
        Ok(counts)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn get_user(&self, id: &UserId) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(id).cloned())
    }

    async fn upsert_user(&self, mut user: User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if let Some(existing) = users.get(&user.id) {
            user.created_at = existing.created_at;
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }
}

#[async_trait]
impl TeamStore for InMemoryStore {
    async fn create_team_for(&self, application_id: Uuid, team: Team) -> StoreResult<Team> {
        // Lock order matches review_page: applications before teams.
        let mut applications = self.applications.write().await;
        let mut teams = self.teams.write().await;

        let application = applications
            .get_mut(&application_id)
            .ok_or_else(|| StoreError::NotFound(format!("application '{application_id}'")))?;
        if application.team_id.is_some() {
            return Err(StoreError::Conflict(format!(
                "application '{application_id}' is already on a team"
            )));
        }
        if teams
            .values()
            .any(|t| t.name.eq_ignore_ascii_case(&team.name))
        {
            return Err(StoreError::Conflict(format!(
                "team name '{}' is taken",
                team.name
            )));
        }

        application.team_id = Some(team.id);
        teams.insert(team.id, team.clone());
        Ok(team)
    }

    async fn get_team(&self, id: Uuid) -> StoreResult<Option<Team>> {
        let teams = self.teams.read().await;
        Ok(teams.get(&id).cloned())
    }
}

#[async_trait]
impl MailingListStore for InMemoryStore {
    async fn subscribe(&self, email: &str) -> StoreResult<Subscription> {
        let mut subscriptions = self.subscriptions.write().await;
        let subscription = Subscription {
            email: email.to_string(),
            subscribed: true,
            updated_at: Utc::now(),
        };
        subscriptions.insert(email.to_string(), subscription.clone());
        Ok(subscription)
    }

    async fn unsubscribe(&self, email: &str) -> StoreResult<bool> {
        let mut subscriptions = self.subscriptions.write().await;
        match subscriptions.get_mut(email) {
            Some(subscription) => {
                subscription.subscribed = false;
                subscription.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_subscription(&self, email: &str) -> StoreResult<Option<Subscription>> {
        let subscriptions = self.subscriptions.read().await;
        Ok(subscriptions.get(email).cloned())
    }
}
