//! Monthly availability/volume scorecard with per-team publishing.

pub mod domain;
pub mod evaluation;
pub mod period;
pub mod publish;
pub mod repository;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    AvailabilityInput, AvailabilityRecord, EntryId, MonthlyRecord, NewScorecardEntry,
    ScorecardEntry, ScorecardEntryPatch, VolumeInput, VolumeRecord,
};
pub use evaluation::{evaluate_entry, EntryEvaluation, EntryThresholds, MonthEvaluation};
pub use period::{resolve_months, MonthSlot, TimePeriod, YearMonth};
pub use publish::{PublicationView, PublishError, PublishStatus};
pub use repository::ScorecardRepository;
pub use router::scorecard_router;
pub use service::{ScorecardService, ScorecardServiceError};
pub use views::{EnterpriseRollup, EntryScorecard, RollupEntry, TeamRollup, TeamScorecard};
