//! Age-based SLA badges for open turnover entries.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{TurnoverEntry, TurnoverStatus};
use crate::config::TurnoverSlaConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlaState {
    Overdue,
    AtRisk,
    Unattended,
    Stale,
    Healthy,
}

impl SlaState {
    pub fn label(self) -> &'static str {
        match self {
            SlaState::Overdue => "OVERDUE",
            SlaState::AtRisk => "AT_RISK",
            SlaState::Unattended => "UNATTENDED",
            SlaState::Stale => "STALE",
            SlaState::Healthy => "HEALTHY",
        }
    }
}

/// Upper bound keeping absurd configuration values inside `Duration`'s range.
const MAX_HOURS: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlaPolicy {
    pub overdue_after: Duration,
    pub at_risk_after: Duration,
    pub unattended_after: Duration,
    pub stale_after: Duration,
}

impl Default for SlaPolicy {
    fn default() -> Self {
        Self::from(&TurnoverSlaConfig::default())
    }
}

impl From<&TurnoverSlaConfig> for SlaPolicy {
    fn from(config: &TurnoverSlaConfig) -> Self {
        let hours = |value: u64| Duration::hours(value.min(MAX_HOURS) as i64);
        Self {
            overdue_after: hours(config.overdue_hours),
            at_risk_after: hours(config.at_risk_hours),
            unattended_after: hours(config.unattended_hours),
            stale_after: hours(config.stale_hours),
        }
    }
}

/// The timestamps classification depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryTimeline {
    pub status: TurnoverStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&TurnoverEntry> for EntryTimeline {
    fn from(entry: &TurnoverEntry) -> Self {
        Self {
            status: entry.status,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

/// First matching rule wins: overdue, at risk, unattended, stale.
pub fn classify(timeline: EntryTimeline, now: DateTime<Utc>, policy: &SlaPolicy) -> SlaState {
    if timeline.status == TurnoverStatus::Resolved {
        return SlaState::Healthy;
    }

    let age = now - timeline.created_at;
    if age >= policy.overdue_after {
        return SlaState::Overdue;
    }
    if age >= policy.at_risk_after {
        return SlaState::AtRisk;
    }

    let never_updated = timeline.updated_at <= timeline.created_at;
    if never_updated && age >= policy.unattended_after {
        return SlaState::Unattended;
    }
    if now - timeline.updated_at >= policy.stale_after {
        return SlaState::Stale;
    }
    SlaState::Healthy
}
