//! The time-locked merch puzzle.
//!
//! Before `merch.unlock_at` the page only shows when it opens. Afterwards it
//! shows the prompt, and a correct answer returns the reward link. Answers
//! are compared after trimming, ignoring case.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::config::MerchConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum MerchScreen {
    Unavailable,
    Locked { unlock_at: DateTime<Utc> },
    Open { prompt: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MerchError {
    #[error("the merch puzzle is not running")]
    Unavailable,

    #[error("the merch puzzle opens at {0}")]
    Locked(DateTime<Utc>),

    #[error("that is not the answer")]
    WrongAnswer,
}

pub struct MerchPuzzle<'a> {
    config: &'a MerchConfig,
}

impl<'a> MerchPuzzle<'a> {
    pub fn new(config: &'a MerchConfig) -> Self {
        Self { config }
    }

    fn enabled(&self) -> bool {
        !self.config.answer.trim().is_empty()
    }

    pub fn screen(&self, now: DateTime<Utc>) -> MerchScreen {
        if !self.enabled() {
            MerchScreen::Unavailable
        } else if now < self.config.unlock_at {
            MerchScreen::Locked {
                unlock_at: self.config.unlock_at,
            }
        } else {
            MerchScreen::Open {
                prompt: self.config.prompt.clone(),
            }
        }
    }

    /// Returns the reward link for a correct answer.
    pub fn solve(&self, now: DateTime<Utc>, answer: &str) -> Result<&'a str, MerchError> {
        match self.screen(now) {
            MerchScreen::Unavailable => Err(MerchError::Unavailable),
            MerchScreen::Locked { unlock_at } => Err(MerchError::Locked(unlock_at)),
            MerchScreen::Open { .. } => {
                if answer.trim().eq_ignore_ascii_case(self.config.answer.trim()) {
                    Ok(self.config.reward_url.as_str())
                } else {
                    Err(MerchError::WrongAnswer)
                }
            }
        }
    }
}
