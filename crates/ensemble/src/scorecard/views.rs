use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{EntryId, ScorecardEntry};
use super::evaluation::EntryEvaluation;
use super::period::MonthSlot;
use super::publish::PublicationView;
use crate::registry::{ApplicationId, TeamId};

/// Everything the team scorecard page renders for one period.
#[derive(Debug, Clone, Serialize)]
pub struct TeamScorecard {
    pub team_id: TeamId,
    pub team_name: String,
    pub period: String,
    pub period_label: String,
    pub months: Vec<MonthSlot>,
    pub entries: Vec<EntryScorecard>,
    /// Publish state for each displayed month that has started.
    pub publication: Vec<PublicationView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryScorecard {
    pub entry: ScorecardEntry,
    pub application_name: String,
    pub tla: String,
    pub evaluation: EntryEvaluation,
}

/// Cross-team view of one month, limited to teams that published it.
#[derive(Debug, Clone, Serialize)]
pub struct EnterpriseRollup {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub teams: Vec<TeamRollup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamRollup {
    pub team_id: TeamId,
    pub team_name: String,
    pub published_by: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub pending_changes: bool,
    pub availability_breaches: usize,
    pub volume_breaches: usize,
    pub entries: Vec<RollupEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RollupEntry {
    pub entry_id: EntryId,
    pub scorecard_identifier: String,
    pub name: String,
    pub application_id: ApplicationId,
    pub application_name: String,
    pub tla: String,
    pub availability: Option<f64>,
    pub availability_threshold: f64,
    pub availability_breach: bool,
    pub volume: Option<i64>,
    pub volume_change: Option<f64>,
    pub volume_breach: bool,
}
