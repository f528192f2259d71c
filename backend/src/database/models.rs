//! Rust structs that represent the stored registration records.
//!
//! These models define the structure of data as it is stored in and retrieved
//! from the data store. Handlers serialize most of them directly; request
//! payloads live next to the handlers that accept them.

use std::fmt;
use std::str::FromStr;

use adapters::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::StoreError;

/// Lifecycle of an application. Absence of a record is the fourth state and
/// is modelled as `Option<Application>` by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 3] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(StoreError::InvalidData(format!(
                "unknown application status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShirtSize {
    Xs,
    S,
    M,
    L,
    Xl,
    Xxl,
}

/// Generates `as_str`/`FromStr` for the text-stored answer enums.
macro_rules! text_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text,)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = StoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(StoreError::InvalidData(format!(
                        concat!("unknown ", stringify!($ty), " '{}'"),
                        other
                    ))),
                }
            }
        }
    };
}

text_enum!(ExperienceLevel {
    Beginner => "beginner",
    Intermediate => "intermediate",
    Advanced => "advanced",
});

text_enum!(ShirtSize {
    Xs => "xs",
    S => "s",
    M => "m",
    L => "l",
    Xl => "xl",
    Xxl => "xxl",
});

/// Answers collected by the intake form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationAnswers {
    pub school: String,
    pub major: String,
    pub graduation_year: i32,
    pub experience: ExperienceLevel,
    pub shirt_size: ShirtSize,
    pub motivation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub user_id: UserId,
    pub team_id: Option<Uuid>,
    pub status: ApplicationStatus,
    pub answers: ApplicationAnswers,
    pub created_at: DateTime<Utc>,
}

impl Application {
    pub fn new(user_id: UserId, answers: ApplicationAnswers, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            team_id: None,
            status: ApplicationStatus::Pending,
            answers,
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub email: String,
    pub subscribed: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Filter and paging for the admin review table.
#[derive(Debug, Clone, Default)]
pub struct ReviewQuery {
    pub status: Option<ApplicationStatus>,
    pub limit: usize,
    pub offset: usize,
    pub order: SortOrder,
}

/// One row of the admin review table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRow {
    pub application_id: Uuid,
    pub user_id: UserId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub school: String,
    pub experience: ExperienceLevel,
    pub status: ApplicationStatus,
    pub team_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPage {
    pub total: usize,
    pub rows: Vec<ReviewRow>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub accepted: usize,
    pub rejected: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.accepted + self.rejected
    }

    pub fn record(&mut self, status: ApplicationStatus) {
        match status {
            ApplicationStatus::Pending => self.pending += 1,
            ApplicationStatus::Accepted => self.accepted += 1,
            ApplicationStatus::Rejected => self.rejected += 1,
        }
    }
}
