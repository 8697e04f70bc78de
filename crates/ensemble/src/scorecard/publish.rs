//! Per team-month publish flag with its audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::period::YearMonth;
use crate::registry::TeamId;

/// Stored publish row. A missing row is equivalent to [`PublishStatus::unpublished`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishStatus {
    pub team_id: TeamId,
    pub year: i32,
    pub month: u32,
    pub published: bool,
    pub published_by: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub unpublished_by: Option<String>,
    pub unpublished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    #[error("{label} is not published")]
    NotPublished { label: String },
}

impl PublishStatus {
    pub fn unpublished(team_id: TeamId, key: YearMonth) -> Self {
        Self {
            team_id,
            year: key.year,
            month: key.month,
            published: false,
            published_by: None,
            published_at: None,
            unpublished_by: None,
            unpublished_at: None,
        }
    }

    pub fn key(&self) -> YearMonth {
        YearMonth {
            year: self.year,
            month: self.month,
        }
    }

    /// Publishing an already published month re-stamps the audit pair.
    pub fn publish(&mut self, actor: &str, at: DateTime<Utc>) {
        self.published = true;
        self.published_by = Some(actor.to_string());
        self.published_at = Some(at);
    }

    /// Keeps `published_by`/`published_at` so the audit trail survives.
    pub fn unpublish(&mut self, actor: &str, at: DateTime<Utc>) -> Result<(), PublishError> {
        if !self.published {
            return Err(PublishError::NotPublished {
                label: self.key().label(),
            });
        }
        self.published = false;
        self.unpublished_by = Some(actor.to_string());
        self.unpublished_at = Some(at);
        Ok(())
    }

    /// True when a published month has data newer than its publish stamp.
    pub fn has_pending_changes(&self, latest_data_change: Option<DateTime<Utc>>) -> bool {
        match (self.published, self.published_at, latest_data_change) {
            (true, Some(published_at), Some(changed_at)) => changed_at > published_at,
            _ => false,
        }
    }

    pub fn view(&self, latest_data_change: Option<DateTime<Utc>>) -> PublicationView {
        PublicationView {
            year: self.year,
            month: self.month,
            label: self.key().label(),
            published: self.published,
            pending_changes: self.has_pending_changes(latest_data_change),
            published_by: self.published_by.clone(),
            published_at: self.published_at,
            unpublished_by: self.unpublished_by.clone(),
            unpublished_at: self.unpublished_at,
        }
    }
}

/// Publish state as shown to callers, with the derived pending-changes flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicationView {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub published: bool,
    pub pending_changes: bool,
    pub published_by: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub unpublished_by: Option<String>,
    pub unpublished_at: Option<DateTime<Utc>>,
}
