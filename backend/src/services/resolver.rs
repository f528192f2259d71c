//! Maps a caller's stored application to the one screen they belong on.
//!
//! Every applicant page asks the resolver before rendering. The decision is
//! recomputed from the store on each call; nothing is cached between
//! requests. A failed store read is returned as an error and never treated
//! as "no application", otherwise people who already applied would be sent
//! back to the intake form.

use adapters::Session;

use crate::config::ApplicationCycle;
use crate::database::models::{Application, ApplicationStatus};
use crate::database::Store;
use crate::errors::StoreError;

pub const SIGN_IN_PATH: &str = "/sign-in";
pub const APPLICATIONS_CLOSED_PATH: &str = "/applications-closed";
pub const INTAKE_PATH: &str = "/apply";
pub const STATUS_PATH: &str = "/status";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Where a caller belongs, given their session and application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicantScreen {
    SignIn,
    /// No application and the cycle is closed.
    Closed,
    /// No application and the cycle is open.
    Intake,
    Status(Application),
    Dashboard(Application),
}

impl ApplicantScreen {
    pub fn path(&self) -> &'static str {
        match self {
            ApplicantScreen::SignIn => SIGN_IN_PATH,
            ApplicantScreen::Closed => APPLICATIONS_CLOSED_PATH,
            ApplicantScreen::Intake => INTAKE_PATH,
            ApplicantScreen::Status(_) => STATUS_PATH,
            ApplicantScreen::Dashboard(_) => DASHBOARD_PATH,
        }
    }
}

/// Outcome of a page guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome<T> {
    Render(T),
    Redirect(&'static str),
}

pub struct ApplicationResolver<'a> {
    store: &'a dyn Store,
    cycle: ApplicationCycle,
}

impl<'a> ApplicationResolver<'a> {
    pub fn new(store: &'a dyn Store, cycle: ApplicationCycle) -> Self {
        Self { store, cycle }
    }

    pub async fn resolve(&self, session: &Session) -> Result<ApplicantScreen, StoreError> {
        let Some(user_id) = session.user_id.as_ref() else {
            return Ok(ApplicantScreen::SignIn);
        };

        let screen = match self.store.find_application_by_user(user_id).await? {
            None => match self.cycle {
                ApplicationCycle::Closed => ApplicantScreen::Closed,
                ApplicationCycle::Open => ApplicantScreen::Intake,
            },
            Some(application) => match application.status {
                ApplicationStatus::Accepted => ApplicantScreen::Dashboard(application),
                ApplicationStatus::Pending | ApplicationStatus::Rejected => {
                    ApplicantScreen::Status(application)
                }
            },
        };

        tracing::trace!(user = %user_id, screen = screen.path(), "resolved applicant screen");
        Ok(screen)
    }

    /// Guard for the full dashboard: only accepted applicants render.
    pub async fn dashboard(&self, session: &Session) -> Result<PageOutcome<Application>, StoreError> {
        Ok(match self.resolve(session).await? {
            ApplicantScreen::Dashboard(application) => PageOutcome::Render(application),
            other => PageOutcome::Redirect(other.path()),
        })
    }

    /// Guard for the status page: applicants with a pending or rejected
    /// application render.
    pub async fn status(&self, session: &Session) -> Result<PageOutcome<Application>, StoreError> {
        Ok(match self.resolve(session).await? {
            ApplicantScreen::Status(application) => PageOutcome::Render(application),
            other => PageOutcome::Redirect(other.path()),
        })
    }

    /// Guard for the intake flow: signed-in callers without an application,
    /// while the cycle is open.
    pub async fn intake(&self, session: &Session) -> Result<PageOutcome<()>, StoreError> {
        Ok(match self.resolve(session).await? {
            ApplicantScreen::Intake => PageOutcome::Render(()),
            other => PageOutcome::Redirect(other.path()),
        })
    }
}
