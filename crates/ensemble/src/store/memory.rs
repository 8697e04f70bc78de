use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::{IdSource, RepositoryError};
use crate::links::{Link, LinkCategory, LinkCategoryId, LinkId, LinkRepository};
use crate::registry::{Application, ApplicationId, RegistryRepository, Team, TeamId};
use crate::scorecard::{
    AvailabilityRecord, EntryId, MonthlyRecord, PublishStatus, ScorecardEntry,
    ScorecardRepository, VolumeRecord, YearMonth,
};
use crate::turnover::{FinalizedTurnoverSnapshot, SnapshotId, TurnoverEntry, TurnoverEntryId, TurnoverRepository};

#[derive(Debug, Default)]
struct StoreState {
    teams: BTreeMap<TeamId, Team>,
    applications: BTreeMap<ApplicationId, Application>,
    entries: BTreeMap<EntryId, ScorecardEntry>,
    availability: BTreeMap<(EntryId, YearMonth), AvailabilityRecord>,
    volume: BTreeMap<(EntryId, YearMonth), VolumeRecord>,
    publish: BTreeMap<(TeamId, YearMonth), PublishStatus>,
    turnover: BTreeMap<TurnoverEntryId, TurnoverEntry>,
    snapshots: BTreeMap<SnapshotId, FinalizedTurnoverSnapshot>,
    categories: BTreeMap<LinkCategoryId, LinkCategory>,
    links: BTreeMap<LinkId, Link>,
}

impl StoreState {
    fn team_of_entry(&self, entry: &ScorecardEntry) -> Option<&TeamId> {
        self.applications
            .get(&entry.application_id)
            .map(|application| &application.team_id)
    }

    fn remove_entry(&mut self, id: &EntryId) {
        self.entries.remove(id);
        self.availability.retain(|(entry_id, _), _| entry_id != id);
        self.volume.retain(|(entry_id, _), _| entry_id != id);
    }

    fn category_name_taken(&self, category: &LinkCategory) -> bool {
        self.categories.values().any(|existing| {
            existing.id != category.id
                && existing.team_id == category.team_id
                && existing.name.eq_ignore_ascii_case(&category.name)
        })
    }
}

/// Process-local store backing every repository trait behind one mutex, so
/// each call (cascades included) applies all-or-nothing.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    ids: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl IdSource for InMemoryStore {
    fn next_id(&self, prefix: &str) -> String {
        let id = self.ids.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}-{id:06}")
    }
}

impl RegistryRepository for InMemoryStore {
    fn insert_team(&self, team: Team) -> Result<Team, RepositoryError> {
        let mut state = self.state()?;
        if state
            .teams
            .values()
            .any(|existing| existing.name.eq_ignore_ascii_case(&team.name))
        {
            return Err(RepositoryError::Conflict(format!(
                "team '{}' already exists",
                team.name
            )));
        }
        state.teams.insert(team.id.clone(), team.clone());
        Ok(team)
    }

    fn fetch_team(&self, id: &TeamId) -> Result<Option<Team>, RepositoryError> {
        Ok(self.state()?.teams.get(id).cloned())
    }

    fn list_teams(&self) -> Result<Vec<Team>, RepositoryError> {
        Ok(self.state()?.teams.values().cloned().collect())
    }

    fn insert_application(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut state = self.state()?;
        if !state.teams.contains_key(&application.team_id) {
            return Err(RepositoryError::NotFound);
        }
        if state.applications.values().any(|existing| {
            existing.team_id == application.team_id
                && existing.asset_id.eq_ignore_ascii_case(&application.asset_id)
        }) {
            return Err(RepositoryError::Conflict(format!(
                "asset {} is already registered for this team",
                application.asset_id
            )));
        }
        state
            .applications
            .insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn update_application(&self, application: Application) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        match state.applications.get_mut(&application.id) {
            Some(existing) => {
                *existing = application;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_application(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(self.state()?.applications.get(id).cloned())
    }

    fn list_applications(&self, team_id: &TeamId) -> Result<Vec<Application>, RepositoryError> {
        Ok(self
            .state()?
            .applications
            .values()
            .filter(|application| &application.team_id == team_id)
            .cloned()
            .collect())
    }

    fn delete_application(&self, id: &ApplicationId) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        if state.applications.remove(id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        let entry_ids: Vec<EntryId> = state
            .entries
            .values()
            .filter(|entry| &entry.application_id == id)
            .map(|entry| entry.id.clone())
            .collect();
        for entry_id in &entry_ids {
            state.remove_entry(entry_id);
        }
        state.turnover.retain(|_, entry| &entry.application_id != id);
        Ok(())
    }
}

impl ScorecardRepository for InMemoryStore {
    fn insert_entry(&self, entry: ScorecardEntry) -> Result<ScorecardEntry, RepositoryError> {
        let mut state = self.state()?;
        if !state.applications.contains_key(&entry.application_id) {
            return Err(RepositoryError::NotFound);
        }
        if state.entries.values().any(|existing| {
            existing
                .scorecard_identifier
                .eq_ignore_ascii_case(&entry.scorecard_identifier)
        }) {
            return Err(RepositoryError::Conflict(format!(
                "scorecard identifier {} is already in use",
                entry.scorecard_identifier
            )));
        }
        state.entries.insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }

    fn update_entry(&self, entry: ScorecardEntry) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        if state.entries.values().any(|existing| {
            existing.id != entry.id
                && existing
                    .scorecard_identifier
                    .eq_ignore_ascii_case(&entry.scorecard_identifier)
        }) {
            return Err(RepositoryError::Conflict(format!(
                "scorecard identifier {} is already in use",
                entry.scorecard_identifier
            )));
        }
        match state.entries.get_mut(&entry.id) {
            Some(existing) => {
                *existing = entry;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_entry(&self, id: &EntryId) -> Result<Option<ScorecardEntry>, RepositoryError> {
        Ok(self.state()?.entries.get(id).cloned())
    }

    fn list_entries(&self, team_id: &TeamId) -> Result<Vec<ScorecardEntry>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .entries
            .values()
            .filter(|entry| state.team_of_entry(entry) == Some(team_id))
            .cloned()
            .collect())
    }

    fn delete_entry(&self, id: &EntryId) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        if !state.entries.contains_key(id) {
            return Err(RepositoryError::NotFound);
        }
        state.remove_entry(id);
        Ok(())
    }

    fn upsert_availability(
        &self,
        mut record: AvailabilityRecord,
    ) -> Result<AvailabilityRecord, RepositoryError> {
        let mut state = self.state()?;
        if !state.entries.contains_key(&record.entry_id) {
            return Err(RepositoryError::NotFound);
        }
        let key = (record.entry_id.clone(), record.key());
        if let Some(existing) = state.availability.get(&key) {
            record.created_by = existing.created_by.clone();
            record.created_at = existing.created_at;
        }
        state.availability.insert(key, record.clone());
        Ok(record)
    }

    fn upsert_volume(&self, mut record: VolumeRecord) -> Result<VolumeRecord, RepositoryError> {
        let mut state = self.state()?;
        if !state.entries.contains_key(&record.entry_id) {
            return Err(RepositoryError::NotFound);
        }
        let key = (record.entry_id.clone(), record.key());
        if let Some(existing) = state.volume.get(&key) {
            record.created_by = existing.created_by.clone();
            record.created_at = existing.created_at;
        }
        state.volume.insert(key, record.clone());
        Ok(record)
    }

    fn availability_records(
        &self,
        entry_id: &EntryId,
    ) -> Result<Vec<AvailabilityRecord>, RepositoryError> {
        Ok(self
            .state()?
            .availability
            .values()
            .filter(|record| &record.entry_id == entry_id)
            .cloned()
            .collect())
    }

    fn volume_records(&self, entry_id: &EntryId) -> Result<Vec<VolumeRecord>, RepositoryError> {
        Ok(self
            .state()?
            .volume
            .values()
            .filter(|record| &record.entry_id == entry_id)
            .cloned()
            .collect())
    }

    fn latest_record_change(
        &self,
        team_id: &TeamId,
        key: YearMonth,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        let state = self.state()?;
        let owned = |entry_id: &EntryId| {
            state
                .entries
                .get(entry_id)
                .and_then(|entry| state.team_of_entry(entry))
                == Some(team_id)
        };

        let availability = state
            .availability
            .iter()
            .filter(|((entry_id, month), _)| *month == key && owned(entry_id))
            .map(|(_, record)| record.last_changed());
        let volume = state
            .volume
            .iter()
            .filter(|((entry_id, month), _)| *month == key && owned(entry_id))
            .map(|(_, record)| record.last_changed());
        Ok(availability.chain(volume).max())
    }

    fn fetch_publish_status(
        &self,
        team_id: &TeamId,
        key: YearMonth,
    ) -> Result<Option<PublishStatus>, RepositoryError> {
        Ok(self
            .state()?
            .publish
            .get(&(team_id.clone(), key))
            .cloned())
    }

    fn save_publish_status(&self, status: PublishStatus) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        state
            .publish
            .insert((status.team_id.clone(), status.key()), status);
        Ok(())
    }

    fn published_statuses(&self, key: YearMonth) -> Result<Vec<PublishStatus>, RepositoryError> {
        Ok(self
            .state()?
            .publish
            .values()
            .filter(|status| status.published && status.key() == key)
            .cloned()
            .collect())
    }
}

impl TurnoverRepository for InMemoryStore {
    fn insert_turnover(&self, entry: TurnoverEntry) -> Result<TurnoverEntry, RepositoryError> {
        let mut state = self.state()?;
        if !state.applications.contains_key(&entry.application_id) {
            return Err(RepositoryError::NotFound);
        }
        state.turnover.insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }

    fn update_turnover(&self, entry: TurnoverEntry) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        match state.turnover.get_mut(&entry.id) {
            Some(existing) => {
                *existing = entry;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_turnover(&self, id: &TurnoverEntryId) -> Result<Option<TurnoverEntry>, RepositoryError> {
        Ok(self.state()?.turnover.get(id).cloned())
    }

    fn delete_turnover(&self, id: &TurnoverEntryId) -> Result<(), RepositoryError> {
        match self.state()?.turnover.remove(id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound),
        }
    }

    fn list_turnover(&self, team_id: &TeamId) -> Result<Vec<TurnoverEntry>, RepositoryError> {
        Ok(self
            .state()?
            .turnover
            .values()
            .filter(|entry| &entry.team_id == team_id)
            .cloned()
            .collect())
    }

    fn insert_snapshot(
        &self,
        snapshot: FinalizedTurnoverSnapshot,
    ) -> Result<FinalizedTurnoverSnapshot, RepositoryError> {
        let mut state = self.state()?;
        state.snapshots.insert(snapshot.id.clone(), snapshot.clone());
        Ok(snapshot)
    }

    fn fetch_snapshot(
        &self,
        id: &SnapshotId,
    ) -> Result<Option<FinalizedTurnoverSnapshot>, RepositoryError> {
        Ok(self.state()?.snapshots.get(id).cloned())
    }

    fn list_snapshots(
        &self,
        team_id: &TeamId,
    ) -> Result<Vec<FinalizedTurnoverSnapshot>, RepositoryError> {
        let mut snapshots: Vec<FinalizedTurnoverSnapshot> = self
            .state()?
            .snapshots
            .values()
            .filter(|snapshot| &snapshot.team_id == team_id)
            .cloned()
            .collect();
        snapshots.sort_by(|a, b| {
            b.finalized_at
                .cmp(&a.finalized_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(snapshots)
    }
}

impl LinkRepository for InMemoryStore {
    fn insert_category(&self, category: LinkCategory) -> Result<LinkCategory, RepositoryError> {
        let mut state = self.state()?;
        if state.category_name_taken(&category) {
            return Err(RepositoryError::Conflict(format!(
                "category '{}' already exists",
                category.name
            )));
        }
        state.categories.insert(category.id.clone(), category.clone());
        Ok(category)
    }

    fn update_category(&self, category: LinkCategory) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        if state.category_name_taken(&category) {
            return Err(RepositoryError::Conflict(format!(
                "category '{}' already exists",
                category.name
            )));
        }
        match state.categories.get_mut(&category.id) {
            Some(existing) => {
                *existing = category;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_category(&self, id: &LinkCategoryId) -> Result<Option<LinkCategory>, RepositoryError> {
        Ok(self.state()?.categories.get(id).cloned())
    }

    fn list_categories(&self, team_id: &TeamId) -> Result<Vec<LinkCategory>, RepositoryError> {
        Ok(self
            .state()?
            .categories
            .values()
            .filter(|category| &category.team_id == team_id)
            .cloned()
            .collect())
    }

    fn delete_category(&self, id: &LinkCategoryId) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        if state.categories.remove(id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        for link in state.links.values_mut() {
            if link.category_id.as_ref() == Some(id) {
                link.category_id = None;
            }
        }
        Ok(())
    }

    fn insert_link(&self, link: Link) -> Result<Link, RepositoryError> {
        let mut state = self.state()?;
        state.links.insert(link.id.clone(), link.clone());
        Ok(link)
    }

    fn update_link(&self, link: Link) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        match state.links.get_mut(&link.id) {
            Some(existing) => {
                *existing = link;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_link(&self, id: &LinkId) -> Result<Option<Link>, RepositoryError> {
        Ok(self.state()?.links.get(id).cloned())
    }

    fn delete_link(&self, id: &LinkId) -> Result<(), RepositoryError> {
        match self.state()?.links.remove(id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound),
        }
    }

    fn list_links(&self, team_id: &TeamId) -> Result<Vec<Link>, RepositoryError> {
        Ok(self
            .state()?
            .links
            .values()
            .filter(|link| &link.team_id == team_id)
            .cloned()
            .collect())
    }
}
