//! Shift-handoff turnover log with SLA badges and finalized snapshots.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod sla;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    FinalizedTurnoverSnapshot, NewTurnoverEntry, Section, SectionDetails, SnapshotId,
    TransitionError, TurnoverEntry, TurnoverEntryId, TurnoverEntryPatch, TurnoverStatus,
};
pub use repository::TurnoverRepository;
pub use router::turnover_router;
pub use service::{TurnoverService, TurnoverServiceError};
pub use sla::{classify, EntryTimeline, SlaPolicy, SlaState};
pub use views::{
    SectionSummary, SlaCounts, SnapshotSummary, TurnoverDashboard, TurnoverEntryView,
    TurnoverFilter,
};
