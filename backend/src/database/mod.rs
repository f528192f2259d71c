//! Module for the data store: the storage traits, their in-memory and
//! PostgreSQL implementations, and the connection setup.
//!
//! The one-application-per-user rule is the store's job. Both
//! implementations report a second insert for the same user as
//! [`StoreError::Conflict`].

pub mod memory;
pub mod models;
pub mod queries;

use std::sync::Arc;

use adapters::UserId;
use async_trait::async_trait;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::errors::StoreError;
use models::{
    Application, ApplicationStatus, ReviewPage, ReviewQuery, StatusCounts, Subscription, Team,
    User,
};

pub use memory::InMemoryStore;
pub use queries::PostgresStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Combined storage trait
pub trait Store: ApplicationStore + UserStore + TeamStore + MailingListStore + Send + Sync {}

impl<T> Store for T where T: ApplicationStore + UserStore + TeamStore + MailingListStore + Send + Sync
{}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// At most one application exists per user.
    async fn find_application_by_user(&self, user_id: &UserId) -> StoreResult<Option<Application>>;

    async fn get_application(&self, id: Uuid) -> StoreResult<Option<Application>>;

    /// Fails with `Conflict` when the user already has an application.
    async fn insert_application(&self, application: Application) -> StoreResult<Application>;

    /// Fails with `NotFound` for an unknown id.
    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> StoreResult<Application>;

    async fn review_page(&self, query: &ReviewQuery) -> StoreResult<ReviewPage>;

    async fn count_by_status(&self) -> StoreResult<StatusCounts>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: &UserId) -> StoreResult<Option<User>>;

    /// Inserts or replaces the profile, keeping the original `created_at`.
    async fn upsert_user(&self, user: User) -> StoreResult<User>;
}

#[async_trait]
pub trait TeamStore: Send + Sync {
    /// Creates `team` and attaches the application to it in one step.
    ///
    /// Fails with `NotFound` for an unknown application, and with `Conflict`
    /// when the application is already on a team or the name is taken. On
    /// failure nothing is written.
    async fn create_team_for(&self, application_id: Uuid, team: Team) -> StoreResult<Team>;

    async fn get_team(&self, id: Uuid) -> StoreResult<Option<Team>>;
}

#[async_trait]
pub trait MailingListStore: Send + Sync {
    async fn subscribe(&self, email: &str) -> StoreResult<Subscription>;

    /// Returns false when the address was never subscribed.
    async fn unsubscribe(&self, email: &str) -> StoreResult<bool>;

    async fn get_subscription(&self, email: &str) -> StoreResult<Option<Subscription>>;
}

/// Opens the configured store.
pub async fn connect(config: &StorageConfig) -> StoreResult<Arc<dyn Store>> {
    match config {
        StorageConfig::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StorageConfig::Postgres {
            url,
            max_connections,
            connect_timeout_secs,
        } => {
            let store = PostgresStore::connect(url, *max_connections, *connect_timeout_secs).await?;
            tracing::info!("Connected to PostgreSQL store");
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Store doubles for exercising failure paths.

    use super::*;

    /// Every read and write fails as if the database were unreachable.
    pub struct UnreachableStore;

    fn down<T>() -> StoreResult<T> {
        Err(StoreError::Connection("database unreachable".to_string()))
    }

    #[async_trait]
    impl ApplicationStore for UnreachableStore {
        async fn find_application_by_user(&self, _: &UserId) -> StoreResult<Option<Application>> {
            down()
        }

        async fn get_application(&self, _: Uuid) -> StoreResult<Option<Application>> {
            down()
        }

        async fn insert_application(&self, _: Application) -> StoreResult<Application> {
            down()
        }

        async fn set_application_status(
            &self,
            _: Uuid,
            _: ApplicationStatus,
        ) -> StoreResult<Application> {
            down()
        }

        async fn review_page(&self, _: &ReviewQuery) -> StoreResult<ReviewPage> {
            down()
        }

        async fn count_by_status(&self) -> StoreResult<StatusCounts> {
            down()
        }
    }

    #[async_trait]
    impl UserStore for UnreachableStore {
        async fn get_user(&self, _: &UserId) -> StoreResult<Option<User>> {
            down()
        }

        async fn upsert_user(&self, _: User) -> StoreResult<User> {
            down()
        }
    }

    #[async_trait]
    impl TeamStore for UnreachableStore {
        async fn create_team_for(&self, _: Uuid, _: Team) -> StoreResult<Team> {
            down()
        }

        async fn get_team(&self, _: Uuid) -> StoreResult<Option<Team>> {
            down()
        }
    }

    #[async_trait]
    impl MailingListStore for UnreachableStore {
        async fn subscribe(&self, _: &str) -> StoreResult<Subscription> {
            down()
        }

        async fn unsubscribe(&self, _: &str) -> StoreResult<bool> {
            down()
        }

        async fn get_subscription(&self, _: &str) -> StoreResult<Option<Subscription>> {
            down()
        }
    }
}
