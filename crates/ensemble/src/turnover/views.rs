use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{FinalizedTurnoverSnapshot, Section, SnapshotId, TurnoverEntry, TurnoverStatus};
use super::sla::SlaState;
use crate::registry::TeamId;

/// Turnover entry decorated with its SLA badge and application label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnoverEntryView {
    #[serde(flatten)]
    pub entry: TurnoverEntry,
    pub application_name: String,
    pub tla: String,
    pub sla: SlaState,
}

/// Optional filters for listing a team's turnover log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnoverFilter {
    #[serde(default)]
    pub status: Option<TurnoverStatus>,
    #[serde(default)]
    pub section: Option<Section>,
}

impl TurnoverFilter {
    pub fn matches(&self, entry: &TurnoverEntry) -> bool {
        self.status.map_or(true, |status| entry.status == status)
            && self.section.map_or(true, |section| entry.section() == section)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaCounts {
    pub overdue: usize,
    pub at_risk: usize,
    pub unattended: usize,
    pub stale: usize,
    pub healthy: usize,
}

impl SlaCounts {
    pub fn record(&mut self, state: SlaState) {
        let slot = match state {
            SlaState::Overdue => &mut self.overdue,
            SlaState::AtRisk => &mut self.at_risk,
            SlaState::Unattended => &mut self.unattended,
            SlaState::Stale => &mut self.stale,
            SlaState::Healthy => &mut self.healthy,
        };
        *slot += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSummary {
    pub section: Section,
    pub open: usize,
    pub important: usize,
    pub sla: SlaCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnoverDashboard {
    pub team_id: TeamId,
    pub generated_at: DateTime<Utc>,
    pub open: usize,
    pub important: usize,
    pub sections: Vec<SectionSummary>,
    pub last_finalized_at: Option<DateTime<Utc>>,
}

/// Snapshot listing row without the exported payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub id: SnapshotId,
    pub team_id: TeamId,
    pub finalized_by: String,
    pub finalized_at: DateTime<Utc>,
    pub entry_count: usize,
}

impl From<&FinalizedTurnoverSnapshot> for SnapshotSummary {
    fn from(snapshot: &FinalizedTurnoverSnapshot) -> Self {
        Self {
            id: snapshot.id.clone(),
            team_id: snapshot.team_id.clone(),
            finalized_by: snapshot.finalized_by.clone(),
            finalized_at: snapshot.finalized_at,
            entry_count: snapshot.entry_count,
        }
    }
}
