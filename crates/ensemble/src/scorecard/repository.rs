use chrono::{DateTime, Utc};

use super::domain::{AvailabilityRecord, EntryId, ScorecardEntry, VolumeRecord};
use super::period::YearMonth;
use super::publish::PublishStatus;
use crate::registry::TeamId;
use crate::store::{IdSource, RepositoryError};

/// Storage abstraction for scorecard entries, monthly records and publish rows.
pub trait ScorecardRepository: IdSource {
    /// Fails with `Conflict` when the scorecard identifier is taken.
    fn insert_entry(&self, entry: ScorecardEntry) -> Result<ScorecardEntry, RepositoryError>;
    fn update_entry(&self, entry: ScorecardEntry) -> Result<(), RepositoryError>;
    fn fetch_entry(&self, id: &EntryId) -> Result<Option<ScorecardEntry>, RepositoryError>;
    /// Entries of every application owned by the team.
    fn list_entries(&self, team_id: &TeamId) -> Result<Vec<ScorecardEntry>, RepositoryError>;
    /// Deletes the entry and all of its availability and volume records.
    fn delete_entry(&self, id: &EntryId) -> Result<(), RepositoryError>;

    /// Insert-or-update on (entry, year, month). An existing row keeps its
    /// creation audit fields.
    fn upsert_availability(
        &self,
        record: AvailabilityRecord,
    ) -> Result<AvailabilityRecord, RepositoryError>;
    fn upsert_volume(&self, record: VolumeRecord) -> Result<VolumeRecord, RepositoryError>;
    fn availability_records(
        &self,
        entry_id: &EntryId,
    ) -> Result<Vec<AvailabilityRecord>, RepositoryError>;
    fn volume_records(&self, entry_id: &EntryId) -> Result<Vec<VolumeRecord>, RepositoryError>;
    /// Latest created/updated timestamp over every record the team holds for `key`.
    fn latest_record_change(
        &self,
        team_id: &TeamId,
        key: YearMonth,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError>;

    fn fetch_publish_status(
        &self,
        team_id: &TeamId,
        key: YearMonth,
    ) -> Result<Option<PublishStatus>, RepositoryError>;
    /// Insert-or-update on (team, year, month).
    fn save_publish_status(&self, status: PublishStatus) -> Result<(), RepositoryError>;
    /// Rows currently flagged as published for `key`, across all teams.
    fn published_statuses(&self, key: YearMonth) -> Result<Vec<PublishStatus>, RepositoryError>;
}
