//! Admin review: the application table, status totals and status changes.

use adapters::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::{
    Application, ApplicationStatus, ReviewQuery, ReviewRow, SortOrder, StatusCounts,
};
use crate::database::Store;
use crate::errors::{ApiError, ApiResult};

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 500;

/// Raw query string of the review table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewParams {
    pub status: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub order: Option<String>,
}

impl ReviewParams {
    pub fn into_query(self) -> ApiResult<ReviewQuery> {
        let status = match self.status.as_deref().map(str::to_ascii_lowercase) {
            None => None,
            Some(value) if value.is_empty() => None,
            Some(value) => Some(value.parse::<ApplicationStatus>().map_err(|_| {
                ApiError::BadRequest(format!(
                    "invalid status '{value}'; expected one of: pending, accepted, rejected"
                ))
            })?),
        };

        let order = match self.order.as_deref().map(str::to_ascii_lowercase) {
            None => SortOrder::Desc,
            Some(value) if value == "desc" => SortOrder::Desc,
            Some(value) if value == "asc" => SortOrder::Asc,
            Some(other) => {
                return Err(ApiError::BadRequest(format!(
                    "invalid order '{other}'; expected asc or desc"
                )))
            }
        };

        // Offsets are bound as BIGINT.
        let offset = self.offset.unwrap_or(0);
        if i64::try_from(offset).is_err() {
            return Err(ApiError::BadRequest(format!(
                "invalid offset {offset}; must be at most {}",
                i64::MAX
            )));
        }

        Ok(ReviewQuery {
            status,
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE),
            offset,
            order,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewTable {
    pub total: usize,
    pub returned: usize,
    pub limit: usize,
    pub offset: usize,
    pub rows: Vec<ReviewRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewStats {
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub total: usize,
}

pub struct Review<'a> {
    store: &'a dyn Store,
}

impl<'a> Review<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    pub async fn table(&self, query: ReviewQuery) -> ApiResult<ReviewTable> {
        let page = self.store.review_page(&query).await?;
        Ok(ReviewTable {
            total: page.total,
            returned: page.rows.len(),
            limit: query.limit,
            offset: query.offset,
            rows: page.rows,
        })
    }

    pub async fn stats(&self) -> ApiResult<ReviewStats> {
        let counts = self.store.count_by_status().await?;
        Ok(ReviewStats {
            total: counts.total(),
            counts,
        })
    }

    pub async fn set_status(
        &self,
        reviewer: &UserId,
        id: Uuid,
        status: ApplicationStatus,
    ) -> ApiResult<Application> {
        let application = self.store.set_application_status(id, status).await?;
        tracing::info!(
            reviewer = %reviewer,
            application = %id,
            status = %status,
            "application status changed"
        );
        Ok(application)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_caps() {
        let query = ReviewParams::default().into_query().unwrap();
        assert_eq!(query.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(query.offset, 0);
        assert_eq!(query.order, SortOrder::Desc);
        assert_eq!(query.status, None);

        let query = ReviewParams {
            limit: Some(10_000),
            ..Default::default()
        }
        .into_query()
        .unwrap();
        assert_eq!(query.limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn parses_status_and_order() {
        let query = ReviewParams {
            status: Some("Accepted".to_string()),
            order: Some("ASC".to_string()),
            ..Default::default()
        }
        .into_query()
        .unwrap();
        assert_eq!(query.status, Some(ApplicationStatus::Accepted));
        assert_eq!(query.order, SortOrder::Asc);
    }

    #[test]
    fn rejects_unknown_filters() {
        let bad_status = ReviewParams {
            status: Some("waitlisted".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad_status.into_query(), Err(ApiError::BadRequest(_))));

        let bad_order = ReviewParams {
            order: Some("sideways".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad_order.into_query(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn offset_must_fit_a_bigint() {
        let too_far = ReviewParams {
            offset: Some(usize::MAX),
            ..Default::default()
        };
        assert!(matches!(too_far.into_query(), Err(ApiError::BadRequest(_))));

        let query = ReviewParams {
            offset: Some(i64::MAX as usize),
            ..Default::default()
        }
        .into_query()
        .unwrap();
        assert_eq!(query.offset, i64::MAX as usize);
    }
}
