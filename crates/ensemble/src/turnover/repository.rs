use super::domain::{FinalizedTurnoverSnapshot, SnapshotId, TurnoverEntry, TurnoverEntryId};
use crate::registry::TeamId;
use crate::store::{IdSource, RepositoryError};

/// Storage abstraction for turnover entries and finalized snapshots.
pub trait TurnoverRepository: IdSource {
    fn insert_turnover(&self, entry: TurnoverEntry) -> Result<TurnoverEntry, RepositoryError>;
    fn update_turnover(&self, entry: TurnoverEntry) -> Result<(), RepositoryError>;
    fn fetch_turnover(&self, id: &TurnoverEntryId)
        -> Result<Option<TurnoverEntry>, RepositoryError>;
    fn delete_turnover(&self, id: &TurnoverEntryId) -> Result<(), RepositoryError>;
    fn list_turnover(&self, team_id: &TeamId) -> Result<Vec<TurnoverEntry>, RepositoryError>;

    fn insert_snapshot(
        &self,
        snapshot: FinalizedTurnoverSnapshot,
    ) -> Result<FinalizedTurnoverSnapshot, RepositoryError>;
    fn fetch_snapshot(
        &self,
        id: &SnapshotId,
    ) -> Result<Option<FinalizedTurnoverSnapshot>, RepositoryError>;
    /// Newest first.
    fn list_snapshots(
        &self,
        team_id: &TeamId,
    ) -> Result<Vec<FinalizedTurnoverSnapshot>, RepositoryError>;
}
