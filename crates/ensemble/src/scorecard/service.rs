use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use super::domain::{
    AvailabilityInput, AvailabilityRecord, EntryId, MonthlyRecord, NewScorecardEntry,
    ScorecardEntry, ScorecardEntryPatch, VolumeInput, VolumeRecord,
};
use super::evaluation::{evaluate_entry, EntryEvaluation, EntryThresholds};
use super::period::{resolve_months, MonthSlot, TimePeriod, YearMonth};
use super::publish::{PublicationView, PublishError, PublishStatus};
use super::repository::ScorecardRepository;
use super::views::{EnterpriseRollup, EntryScorecard, RollupEntry, TeamRollup, TeamScorecard};
use crate::clock::Clock;
use crate::registry::{Application, ApplicationId, RegistryRepository, TeamId};
use crate::session::{AccessError, Session};
use crate::store::RepositoryError;
use crate::validation::{self, ValidationError};

/// Scorecard operations: entry maintenance, monthly upserts, evaluation and publishing.
pub struct ScorecardService<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> ScorecardService<R>
where
    R: RegistryRepository + ScorecardRepository + 'static,
{
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Team admins register a new entry against one of the team's applications.
    pub fn create_entry(
        &self,
        session: &Session,
        team_id: &TeamId,
        input: NewScorecardEntry,
    ) -> Result<ScorecardEntry, ScorecardServiceError> {
        session.require_admin(team_id)?;
        let input = input.validate()?;
        let application = self.application_in_team(&input.application_id, team_id)?;

        let now = self.clock.now();
        let actor = session.actor();
        let entry = ScorecardEntry {
            id: EntryId(self.repository.next_id("entry")),
            application_id: application.id,
            scorecard_identifier: input.scorecard_identifier,
            name: input.name,
            availability_threshold: input.availability_threshold,
            volume_change_threshold: input.volume_change_threshold,
            created_by: actor.clone(),
            created_at: now,
            updated_by: actor,
            updated_at: now,
        };

        let stored = self.repository.insert_entry(entry)?;
        info!(entry_id = %stored.id, %team_id, "scorecard entry created");
        Ok(stored)
    }

    pub fn update_entry(
        &self,
        session: &Session,
        entry_id: &EntryId,
        patch: ScorecardEntryPatch,
    ) -> Result<ScorecardEntry, ScorecardServiceError> {
        let (mut entry, application) = self.entry_with_application(entry_id)?;
        session.require_admin(&application.team_id)?;

        patch.apply(&mut entry)?;
        entry.updated_by = session.actor();
        entry.updated_at = self.clock.now();
        self.repository.update_entry(entry.clone())?;
        Ok(entry)
    }

    /// Removes the entry with all of its monthly records.
    pub fn delete_entry(
        &self,
        session: &Session,
        entry_id: &EntryId,
    ) -> Result<(), ScorecardServiceError> {
        let (entry, application) = self.entry_with_application(entry_id)?;
        session.require_admin(&application.team_id)?;

        self.repository.delete_entry(&entry.id)?;
        info!(entry_id = %entry.id, team_id = %application.team_id, "scorecard entry deleted");
        Ok(())
    }

    pub fn list_entries(
        &self,
        session: &Session,
        team_id: &TeamId,
    ) -> Result<Vec<ScorecardEntry>, ScorecardServiceError> {
        session.require_member(team_id)?;
        Ok(self.repository.list_entries(team_id)?)
    }

    pub fn upsert_availability(
        &self,
        session: &Session,
        entry_id: &EntryId,
        input: AvailabilityInput,
    ) -> Result<AvailabilityRecord, ScorecardServiceError> {
        let (entry, application) = self.entry_with_application(entry_id)?;
        session.require_member(&application.team_id)?;
        let input = input.validate(entry.availability_threshold)?;

        let now = self.clock.now();
        let actor = session.actor();
        let record = AvailabilityRecord {
            entry_id: entry.id,
            year: input.year,
            month: input.month,
            availability: input.availability,
            reason: input.reason,
            created_by: actor.clone(),
            created_at: now,
            updated_by: actor,
            updated_at: now,
        };
        Ok(self.repository.upsert_availability(record)?)
    }

    pub fn upsert_volume(
        &self,
        session: &Session,
        entry_id: &EntryId,
        input: VolumeInput,
    ) -> Result<VolumeRecord, ScorecardServiceError> {
        let (entry, application) = self.entry_with_application(entry_id)?;
        session.require_member(&application.team_id)?;
        let input = input.validate()?;

        let now = self.clock.now();
        let actor = session.actor();
        let record = VolumeRecord {
            entry_id: entry.id,
            year: input.year,
            month: input.month,
            volume: input.volume,
            reason: input.reason,
            created_by: actor.clone(),
            created_at: now,
            updated_by: actor,
            updated_at: now,
        };
        Ok(self.repository.upsert_volume(record)?)
    }

    /// Evaluates every entry of the team over the resolved period.
    pub fn team_scorecard(
        &self,
        session: &Session,
        team_id: &TeamId,
        period: TimePeriod,
        today: NaiveDate,
    ) -> Result<TeamScorecard, ScorecardServiceError> {
        session.require_member(team_id)?;
        let team = self
            .repository
            .fetch_team(team_id)?
            .ok_or(RepositoryError::NotFound)?;

        let months = resolve_months(period, today);
        let applications = self.applications_by_id(team_id)?;

        let mut entries = Vec::new();
        for entry in self.repository.list_entries(team_id)? {
            let Some(application) = applications.get(&entry.application_id) else {
                continue;
            };
            let evaluation = self.evaluate(&entry, &months)?;
            entries.push(EntryScorecard {
                application_name: application.name.clone(),
                tla: application.tla.clone(),
                evaluation,
                entry,
            });
        }
        entries.sort_by(|a, b| {
            (a.tla.as_str(), a.entry.name.as_str()).cmp(&(b.tla.as_str(), b.entry.name.as_str()))
        });

        let mut publication = Vec::new();
        for slot in months.iter().filter(|slot| !slot.is_future) {
            publication.push(self.publication_view(team_id, slot.key())?);
        }

        Ok(TeamScorecard {
            team_id: team.id,
            team_name: team.name,
            period: period.to_string(),
            period_label: period.label(),
            months,
            entries,
            publication,
        })
    }

    pub fn publication(
        &self,
        session: &Session,
        team_id: &TeamId,
        year: i32,
        month: u32,
    ) -> Result<PublicationView, ScorecardServiceError> {
        session.require_member(team_id)?;
        let key = month_key(year, month)?;
        self.publication_view(team_id, key)
    }

    pub fn publish_month(
        &self,
        session: &Session,
        team_id: &TeamId,
        year: i32,
        month: u32,
    ) -> Result<PublicationView, ScorecardServiceError> {
        session.require_admin(team_id)?;
        let key = month_key(year, month)?;
        let now = self.clock.now();
        if key > YearMonth::of(now.date_naive()) {
            return Err(ValidationError::new("month", "cannot publish a month that has not started").into());
        }
        self.repository
            .fetch_team(team_id)?
            .ok_or(RepositoryError::NotFound)?;

        let mut status = self
            .repository
            .fetch_publish_status(team_id, key)?
            .unwrap_or_else(|| PublishStatus::unpublished(team_id.clone(), key));
        status.publish(&session.actor(), now);
        self.repository.save_publish_status(status)?;

        info!(%team_id, month = %key, actor = %session.actor(), "scorecard month published");
        self.publication_view(team_id, key)
    }

    pub fn unpublish_month(
        &self,
        session: &Session,
        team_id: &TeamId,
        year: i32,
        month: u32,
    ) -> Result<PublicationView, ScorecardServiceError> {
        session.require_admin(team_id)?;
        let key = month_key(year, month)?;

        let mut status = self
            .repository
            .fetch_publish_status(team_id, key)?
            .unwrap_or_else(|| PublishStatus::unpublished(team_id.clone(), key));
        status.unpublish(&session.actor(), self.clock.now())?;
        self.repository.save_publish_status(status)?;

        info!(%team_id, month = %key, actor = %session.actor(), "scorecard month unpublished");
        self.publication_view(team_id, key)
    }

    /// Month-level figures for every team that has published `year`/`month`.
    pub fn enterprise_rollup(
        &self,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> Result<EnterpriseRollup, ScorecardServiceError> {
        let key = month_key(year, month)?;
        let window = [MonthSlot::at(key.previous(), today), MonthSlot::at(key, today)];

        let mut teams = Vec::new();
        for status in self.repository.published_statuses(key)? {
            let Some(team) = self.repository.fetch_team(&status.team_id)? else {
                continue;
            };
            let applications = self.applications_by_id(&team.id)?;
            let latest = self.repository.latest_record_change(&team.id, key)?;

            let mut entries = Vec::new();
            for entry in self.repository.list_entries(&team.id)? {
                let Some(application) = applications.get(&entry.application_id) else {
                    continue;
                };
                let evaluation = self.evaluate(&entry, &window)?;
                let Some(current) = evaluation.months.last() else {
                    continue;
                };
                entries.push(RollupEntry {
                    entry_id: entry.id.clone(),
                    scorecard_identifier: entry.scorecard_identifier.clone(),
                    name: entry.name.clone(),
                    application_id: application.id.clone(),
                    application_name: application.name.clone(),
                    tla: application.tla.clone(),
                    availability: current.availability,
                    availability_threshold: entry.availability_threshold,
                    availability_breach: current.availability_breach,
                    volume: current.volume,
                    volume_change: current.volume_change,
                    volume_breach: current.volume_breach,
                });
            }
            entries.sort_by(|a, b| a.tla.cmp(&b.tla).then_with(|| a.name.cmp(&b.name)));

            teams.push(TeamRollup {
                pending_changes: status.has_pending_changes(latest),
                availability_breaches: entries.iter().filter(|e| e.availability_breach).count(),
                volume_breaches: entries.iter().filter(|e| e.volume_breach).count(),
                team_id: team.id,
                team_name: team.name,
                published_by: status.published_by,
                published_at: status.published_at,
                entries,
            });
        }
        teams.sort_by(|a, b| a.team_name.to_lowercase().cmp(&b.team_name.to_lowercase()));

        Ok(EnterpriseRollup {
            year: key.year,
            month: key.month,
            label: key.label(),
            teams,
        })
    }

    fn evaluate(
        &self,
        entry: &ScorecardEntry,
        months: &[MonthSlot],
    ) -> Result<EntryEvaluation, ScorecardServiceError> {
        let availability = keyed(self.repository.availability_records(&entry.id)?);
        let volume = keyed(self.repository.volume_records(&entry.id)?);
        Ok(evaluate_entry(
            EntryThresholds::from(entry),
            months,
            &availability,
            &volume,
        ))
    }

    fn publication_view(
        &self,
        team_id: &TeamId,
        key: YearMonth,
    ) -> Result<PublicationView, ScorecardServiceError> {
        let status = self
            .repository
            .fetch_publish_status(team_id, key)?
            .unwrap_or_else(|| PublishStatus::unpublished(team_id.clone(), key));
        let latest = self.repository.latest_record_change(team_id, key)?;
        Ok(status.view(latest))
    }

    fn applications_by_id(
        &self,
        team_id: &TeamId,
    ) -> Result<BTreeMap<ApplicationId, Application>, ScorecardServiceError> {
        Ok(self
            .repository
            .list_applications(team_id)?
            .into_iter()
            .map(|application| (application.id.clone(), application))
            .collect())
    }

    fn application_in_team(
        &self,
        application_id: &ApplicationId,
        team_id: &TeamId,
    ) -> Result<Application, ScorecardServiceError> {
        let application = self
            .repository
            .fetch_application(application_id)?
            .filter(|application| &application.team_id == team_id)
            .ok_or_else(|| ValidationError::new("application_id", "is not registered to this team"))?;
        Ok(application)
    }

    fn entry_with_application(
        &self,
        entry_id: &EntryId,
    ) -> Result<(ScorecardEntry, Application), ScorecardServiceError> {
        let entry = self
            .repository
            .fetch_entry(entry_id)?
            .ok_or(RepositoryError::NotFound)?;
        let application = self
            .repository
            .fetch_application(&entry.application_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok((entry, application))
    }
}

fn month_key(year: i32, month: u32) -> Result<YearMonth, ValidationError> {
    validation::calendar_month(year, month)?;
    YearMonth::new(year, month).ok_or_else(|| ValidationError::new("month", "must be between 1 and 12"))
}

fn keyed<T: MonthlyRecord>(records: Vec<T>) -> BTreeMap<YearMonth, T> {
    records
        .into_iter()
        .map(|record| (record.key(), record))
        .collect()
}

/// Error raised by the scorecard service.
#[derive(Debug, thiserror::Error)]
pub enum ScorecardServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
