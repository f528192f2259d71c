//! PostgreSQL storage implementation.
//!
//! The schema is owned by the deployment's migrations, not by this service.
//! The queries below expect:
//!
//! - `users(id TEXT PRIMARY KEY, first_name, last_name, email, created_at, updated_at)`
//! - `applications(id UUID PRIMARY KEY, user_id TEXT UNIQUE, team_id UUID NULL, status TEXT,
//!   school, major, graduation_year INT4, experience TEXT, shirt_size TEXT, motivation,
//!   created_at TIMESTAMPTZ)`
//! - `teams(id UUID PRIMARY KEY, name TEXT, owner_id TEXT, created_at)` with a unique index
//!   on `lower(name)`
//! - `subscriptions(email TEXT PRIMARY KEY, subscribed BOOL, updated_at)`
//!
//! The unique constraint on `applications.user_id` is what keeps two racing
//! first submissions from both landing; its violation surfaces as
//! [`StoreError::Conflict`].

use std::time::Duration;

use adapters::UserId;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::models::{
    Application, ApplicationAnswers, ApplicationStatus, ReviewPage, ReviewQuery, ReviewRow,
    SortOrder, StatusCounts, Subscription, Team, User,
};
use super::{ApplicationStore, MailingListStore, StoreResult, TeamStore, UserStore};
use crate::errors::StoreError;

const APPLICATION_COLUMNS: &str = "id, user_id, team_id, status, school, major, graduation_year, \
     experience, shirt_size, motivation, created_at";

/// PostgreSQL-backed storage
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(
        url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(connect_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self { pool })
    }
}

fn store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(db.message().to_string())
        }
        e @ (sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)) => {
            StoreError::Connection(e.to_string())
        }
        other => StoreError::Query(other.to_string()),
    }
}

fn application_from_row(row: &PgRow) -> StoreResult<Application> {
    let status: String = row.try_get("status").map_err(store_error)?;
    let experience: String = row.try_get("experience").map_err(store_error)?;
    let shirt_size: String = row.try_get("shirt_size").map_err(store_error)?;

    Ok(Application {
        id: row.try_get("id").map_err(store_error)?,
        user_id: UserId::new(row.try_get::<String, _>("user_id").map_err(store_error)?),
        team_id: row.try_get("team_id").map_err(store_error)?,
        status: status.parse()?,
        answers: ApplicationAnswers {
            school: row.try_get("school").map_err(store_error)?,
            major: row.try_get("major").map_err(store_error)?,
            graduation_year: row.try_get("graduation_year").map_err(store_error)?,
            experience: experience.parse()?,
            shirt_size: shirt_size.parse()?,
            motivation: row.try_get("motivation").map_err(store_error)?,
        },
        created_at: row.try_get("created_at").map_err(store_error)?,
    })
}

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    Ok(User {
        id: UserId::new(row.try_get::<String, _>("id").map_err(store_error)?),
        first_name: row.try_get("first_name").map_err(store_error)?,
        last_name: row.try_get("last_name").map_err(store_error)?,
        email: row.try_get("email").map_err(store_error)?,
        created_at: row.try_get("created_at").map_err(store_error)?,
        updated_at: row.try_get("updated_at").map_err(store_error)?,
    })
}

fn team_from_row(row: &PgRow) -> StoreResult<Team> {
    Ok(Team {
        id: row.try_get("id").map_err(store_error)?,
        name: row.try_get("name").map_err(store_error)?,
        owner_id: UserId::new(row.try_get::<String, _>("owner_id").map_err(store_error)?),
        created_at: row.try_get("created_at").map_err(store_error)?,
    })
}

fn subscription_from_row(row: &PgRow) -> StoreResult<Subscription> {
    Ok(Subscription {
        email: row.try_get("email").map_err(store_error)?,
        subscribed: row.try_get("subscribed").map_err(store_error)?,
        updated_at: row.try_get("updated_at").map_err(store_error)?,
    })
}

#[async_trait]
impl ApplicationStore for PostgresStore {
    async fn find_application_by_user(&self, user_id: &UserId) -> StoreResult<Option<Application>> {
        let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE user_id = $1");
        let row = sqlx::query(&sql)
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        row.as_ref().map(application_from_row).transpose()
    }

    async fn get_application(&self, id: Uuid) -> StoreResult<Option<Application>> {
        let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        row.as_ref().map(application_from_row).transpose()
    }

    async fn insert_application(&self, application: Application) -> StoreResult<Application> {
        let answers = &application.answers;
        sqlx::query(
            r#"
            INSERT INTO applications (id, user_id, team_id, status, school, major,
                graduation_year, experience, shirt_size, motivation, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(application.id)
        .bind(application.user_id.as_str())
        .bind(application.team_id)
        .bind(application.status.as_str())
        .bind(&answers.school)
        .bind(&answers.major)
        .bind(answers.graduation_year)
        .bind(answers.experience.as_str())
        .bind(answers.shirt_size.as_str())
        .bind(&answers.motivation)
        .bind(application.created_at)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(application)
    }

    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> StoreResult<Application> {
        let sql = format!(
            "UPDATE applications SET status = $2 WHERE id = $1 RETURNING {APPLICATION_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::NotFound(format!("application '{id}'")))?;
        application_from_row(&row)
    }

    async fn review_page(&self, query: &ReviewQuery) -> StoreResult<ReviewPage> {
        let status = query.status.map(|s| s.as_str());

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM applications WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        let direction = match query.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let sql = format!(
            r#"
            SELECT a.id, a.user_id, a.status, a.school, a.experience, a.created_at,
                   u.first_name, u.last_name, u.email, t.name AS team_name
            FROM applications a
            LEFT JOIN users u ON u.id = a.user_id
            LEFT JOIN teams t ON t.id = a.team_id
            WHERE ($1::text IS NULL OR a.status = $1)
            ORDER BY a.created_at {direction}, a.id {direction}
            LIMIT $2 OFFSET $3
            "#
        );
        let limit = i64::try_from(query.limit)
            .map_err(|_| StoreError::InvalidData(format!("limit {} out of range", query.limit)))?;
        let offset = i64::try_from(query.offset)
            .map_err(|_| StoreError::InvalidData(format!("offset {} out of range", query.offset)))?;
        let rows = sqlx::query(&sql)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        let rows = rows
            .iter()
            .map(|row| -> StoreResult<ReviewRow> {
                let status: String = row.try_get("status").map_err(store_error)?;
                let experience: String = row.try_get("experience").map_err(store_error)?;
                Ok(ReviewRow {
                    application_id: row.try_get("id").map_err(store_error)?,
                    user_id: UserId::new(row.try_get::<String, _>("user_id").map_err(store_error)?),
                    first_name: row.try_get("first_name").map_err(store_error)?,
                    last_name: row.try_get("last_name").map_err(store_error)?,
                    email: row.try_get("email").map_err(store_error)?,
                    school: row.try_get("school").map_err(store_error)?,
                    experience: experience.parse()?,
                    status: status.parse()?,
                    team_name: row.try_get("team_name").map_err(store_error)?,
                    created_at: row.try_get("created_at").map_err(store_error)?,
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(ReviewPage {
            total: total as usize,
            rows,
        })
    }

    async fn count_by_status(&self) -> StoreResult<StatusCounts> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM applications GROUP BY status")
                .fetch_all(&self.pool)
                .await
                .map_err(store_error)?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            let count = count as usize;
            match status.parse::<ApplicationStatus>()? {
                ApplicationStatus::Pending => counts.pending = count,
                ApplicationStatus::Accepted => counts.accepted = count,
                ApplicationStatus::Rejected => counts.rejected = count,
            }
        }
        Ok(counts)
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn get_user(&self, id: &UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, first_name, last_name, email, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn upsert_user(&self, user: User) -> StoreResult<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (id, first_name, last_name, email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                email = EXCLUDED.email,
                updated_at = EXCLUDED.updated_at
            RETURNING id, first_name, last_name, email, created_at, updated_at
            "#,
        )
        .bind(user.id.as_str())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;
        user_from_row(&row)
    }
}

#[async_trait]
impl TeamStore for PostgresStore {
    async fn create_team_for(&self, application_id: Uuid, team: Team) -> StoreResult<Team> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        // Row lock: a second request for the same application waits here and
        // then sees the team set by the first.
        let row = sqlx::query("SELECT team_id FROM applications WHERE id = $1 FOR UPDATE")
            .bind(application_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::NotFound(format!("application '{application_id}'")))?;

        let current: Option<Uuid> = row.try_get("team_id").map_err(store_error)?;
        if current.is_some() {
            return Err(StoreError::Conflict(format!(
                "application '{application_id}' is already on a team"
            )));
        }

        sqlx::query("INSERT INTO teams (id, name, owner_id, created_at) VALUES ($1, $2, $3, $4)")
            .bind(team.id)
            .bind(&team.name)
            .bind(team.owner_id.as_str())
            .bind(team.created_at)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;

        sqlx::query("UPDATE applications SET team_id = $2 WHERE id = $1")
            .bind(application_id)
            .bind(team.id)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;
        Ok(team)
    }

    async fn get_team(&self, id: Uuid) -> StoreResult<Option<Team>> {
        let row = sqlx::query("SELECT id, name, owner_id, created_at FROM teams WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        row.as_ref().map(team_from_row).transpose()
    }
}

#[async_trait]
impl MailingListStore for PostgresStore {
    async fn subscribe(&self, email: &str) -> StoreResult<Subscription> {
        let row = sqlx::query(
            r#"
            INSERT INTO subscriptions (email, subscribed, updated_at)
            VALUES ($1, TRUE, $2)
            ON CONFLICT (email) DO UPDATE SET subscribed = TRUE, updated_at = EXCLUDED.updated_at
            RETURNING email, subscribed, updated_at
            "#,
        )
        .bind(email)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;
        subscription_from_row(&row)
    }

    async fn unsubscribe(&self, email: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE subscriptions SET subscribed = FALSE, updated_at = $2 WHERE email = $1",
        )
        .bind(email)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_subscription(&self, email: &str) -> StoreResult<Option<Subscription>> {
        let row = sqlx::query("SELECT email, subscribed, updated_at FROM subscriptions WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        row.as_ref().map(subscription_from_row).transpose()
    }
}
