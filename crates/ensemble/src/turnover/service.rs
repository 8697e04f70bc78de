use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::info;

use super::domain::{
    FinalizedTurnoverSnapshot, NewTurnoverEntry, Section, SnapshotId, TransitionError,
    TurnoverEntry, TurnoverEntryId, TurnoverEntryPatch, TurnoverStatus,
};
use super::repository::TurnoverRepository;
use super::sla::{classify, EntryTimeline, SlaPolicy};
use super::views::{
    SectionSummary, SlaCounts, SnapshotSummary, TurnoverDashboard, TurnoverEntryView,
    TurnoverFilter,
};
use crate::clock::Clock;
use crate::registry::{Application, ApplicationId, RegistryRepository, TeamId};
use crate::session::{AccessError, Session};
use crate::store::RepositoryError;
use crate::validation::ValidationError;

/// Shift-handoff log for a team. Every operation requires team membership.
pub struct TurnoverService<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
    policy: SlaPolicy,
}

impl<R> TurnoverService<R>
where
    R: RegistryRepository + TurnoverRepository + 'static,
{
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>, policy: SlaPolicy) -> Self {
        Self {
            repository,
            clock,
            policy,
        }
    }

    pub fn create(
        &self,
        session: &Session,
        team_id: &TeamId,
        input: NewTurnoverEntry,
    ) -> Result<TurnoverEntryView, TurnoverServiceError> {
        session.require_member(team_id)?;
        let input = input.validate()?;
        let application = self
            .repository
            .fetch_application(&input.application_id)?
            .filter(|application| &application.team_id == team_id)
            .ok_or_else(|| ValidationError::new("application_id", "is not registered to this team"))?;

        let now = self.clock.now();
        let actor = session.actor();
        let entry = TurnoverEntry {
            id: TurnoverEntryId(self.repository.next_id("turnover")),
            team_id: team_id.clone(),
            application_id: application.id.clone(),
            details: input.details,
            description: input.description,
            comments: input.comments,
            is_important: input.is_important,
            status: TurnoverStatus::Open,
            created_by: actor.clone(),
            created_at: now,
            updated_by: actor,
            updated_at: now,
            resolved_by: None,
            resolved_at: None,
        };

        let stored = self.repository.insert_turnover(entry)?;
        info!(entry_id = %stored.id, %team_id, section = %stored.section(), "turnover entry created");
        Ok(self.view(stored, Some(&application), now))
    }

    /// Open entries only; the section itself never changes.
    pub fn update(
        &self,
        session: &Session,
        entry_id: &TurnoverEntryId,
        patch: TurnoverEntryPatch,
    ) -> Result<TurnoverEntryView, TurnoverServiceError> {
        let mut entry = self.member_entry(session, entry_id)?;
        if !entry.is_open() {
            return Err(TransitionError::AlreadyResolved {
                entry_id: entry.id,
            }
            .into());
        }

        patch.apply(&mut entry)?;
        let now = self.clock.now();
        entry.updated_by = session.actor();
        entry.updated_at = now;
        self.repository.update_turnover(entry.clone())?;
        let application = self.repository.fetch_application(&entry.application_id)?;
        Ok(self.view(entry, application.as_ref(), now))
    }

    pub fn resolve(
        &self,
        session: &Session,
        entry_id: &TurnoverEntryId,
    ) -> Result<TurnoverEntryView, TurnoverServiceError> {
        let mut entry = self.member_entry(session, entry_id)?;
        let now = self.clock.now();
        entry.resolve(&session.actor(), now)?;
        self.repository.update_turnover(entry.clone())?;

        info!(entry_id = %entry.id, team_id = %entry.team_id, "turnover entry resolved");
        let application = self.repository.fetch_application(&entry.application_id)?;
        Ok(self.view(entry, application.as_ref(), now))
    }

    pub fn delete(
        &self,
        session: &Session,
        entry_id: &TurnoverEntryId,
    ) -> Result<(), TurnoverServiceError> {
        let entry = self.member_entry(session, entry_id)?;
        self.repository.delete_turnover(&entry.id)?;
        info!(entry_id = %entry.id, team_id = %entry.team_id, "turnover entry deleted");
        Ok(())
    }

    /// Important entries first, then newest first.
    pub fn list(
        &self,
        session: &Session,
        team_id: &TeamId,
        filter: TurnoverFilter,
    ) -> Result<Vec<TurnoverEntryView>, TurnoverServiceError> {
        session.require_member(team_id)?;
        let now = self.clock.now();
        let applications = self.applications_by_id(team_id)?;

        let mut entries: Vec<TurnoverEntry> = self
            .repository
            .list_turnover(team_id)?
            .into_iter()
            .filter(|entry| filter.matches(entry))
            .collect();
        entries.sort_by(|a, b| {
            b.is_important
                .cmp(&a.is_important)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        Ok(entries
            .into_iter()
            .map(|entry| {
                let application = applications.get(&entry.application_id);
                self.view(entry, application, now)
            })
            .collect())
    }

    pub fn dashboard(
        &self,
        session: &Session,
        team_id: &TeamId,
    ) -> Result<TurnoverDashboard, TurnoverServiceError> {
        session.require_member(team_id)?;
        let now = self.clock.now();
        let entries = self.repository.list_turnover(team_id)?;

        let mut sections: BTreeMap<Section, SectionSummary> = Section::ALL
            .iter()
            .map(|&section| {
                (
                    section,
                    SectionSummary {
                        section,
                        open: 0,
                        important: 0,
                        sla: SlaCounts::default(),
                    },
                )
            })
            .collect();

        for entry in entries.iter().filter(|entry| entry.is_open()) {
            if let Some(summary) = sections.get_mut(&entry.section()) {
                summary.open += 1;
                if entry.is_important {
                    summary.important += 1;
                }
                summary
                    .sla
                    .record(classify(EntryTimeline::from(entry), now, &self.policy));
            }
        }

        let sections: Vec<SectionSummary> = sections.into_values().collect();
        let last_finalized_at = self
            .repository
            .list_snapshots(team_id)?
            .first()
            .map(|snapshot| snapshot.finalized_at);

        Ok(TurnoverDashboard {
            team_id: team_id.clone(),
            generated_at: now,
            open: sections.iter().map(|summary| summary.open).sum(),
            important: sections.iter().map(|summary| summary.important).sum(),
            sections,
            last_finalized_at,
        })
    }

    /// Exports open entries plus everything resolved since the previous snapshot.
    pub fn finalize(
        &self,
        session: &Session,
        team_id: &TeamId,
    ) -> Result<SnapshotSummary, TurnoverServiceError> {
        session.require_member(team_id)?;
        let team = self
            .repository
            .fetch_team(team_id)?
            .ok_or(RepositoryError::NotFound)?;
        let now = self.clock.now();
        let since = self
            .repository
            .list_snapshots(team_id)?
            .first()
            .map(|snapshot| snapshot.finalized_at);

        let exported = self
            .list(session, team_id, TurnoverFilter::default())?
            .into_iter()
            .filter(|view| included_in_snapshot(&view.entry, since))
            .collect::<Vec<_>>();

        let actor = session.actor();
        let payload = json!({
            "team": { "id": team.id, "name": team.name },
            "finalized_by": actor,
            "finalized_at": now,
            "since": since,
            "entries": exported,
        });
        let snapshot = FinalizedTurnoverSnapshot {
            id: SnapshotId(self.repository.next_id("snapshot")),
            team_id: team_id.clone(),
            finalized_by: actor,
            finalized_at: now,
            entry_count: exported.len(),
            payload,
        };

        let stored = self.repository.insert_snapshot(snapshot)?;
        info!(
            snapshot_id = %stored.id,
            %team_id,
            entries = stored.entry_count,
            "turnover finalized"
        );
        Ok(SnapshotSummary::from(&stored))
    }

    pub fn list_snapshots(
        &self,
        session: &Session,
        team_id: &TeamId,
    ) -> Result<Vec<SnapshotSummary>, TurnoverServiceError> {
        session.require_member(team_id)?;
        Ok(self
            .repository
            .list_snapshots(team_id)?
            .iter()
            .map(SnapshotSummary::from)
            .collect())
    }

    pub fn snapshot(
        &self,
        session: &Session,
        snapshot_id: &SnapshotId,
    ) -> Result<FinalizedTurnoverSnapshot, TurnoverServiceError> {
        let snapshot = self
            .repository
            .fetch_snapshot(snapshot_id)?
            .ok_or(RepositoryError::NotFound)?;
        session.require_member(&snapshot.team_id)?;
        Ok(snapshot)
    }

    fn member_entry(
        &self,
        session: &Session,
        entry_id: &TurnoverEntryId,
    ) -> Result<TurnoverEntry, TurnoverServiceError> {
        let entry = self
            .repository
            .fetch_turnover(entry_id)?
            .ok_or(RepositoryError::NotFound)?;
        session.require_member(&entry.team_id)?;
        Ok(entry)
    }

    fn applications_by_id(
        &self,
        team_id: &TeamId,
    ) -> Result<BTreeMap<ApplicationId, Application>, TurnoverServiceError> {
        Ok(self
            .repository
            .list_applications(team_id)?
            .into_iter()
            .map(|application| (application.id.clone(), application))
            .collect())
    }

    fn view(
        &self,
        entry: TurnoverEntry,
        application: Option<&Application>,
        now: DateTime<Utc>,
    ) -> TurnoverEntryView {
        let sla = classify(EntryTimeline::from(&entry), now, &self.policy);
        TurnoverEntryView {
            application_name: application.map(|a| a.name.clone()).unwrap_or_default(),
            tla: application.map(|a| a.tla.clone()).unwrap_or_default(),
            sla,
            entry,
        }
    }
}

fn included_in_snapshot(entry: &TurnoverEntry, since: Option<DateTime<Utc>>) -> bool {
    match (entry.status, entry.resolved_at, since) {
        (TurnoverStatus::Open, _, _) => true,
        (TurnoverStatus::Resolved, _, None) => true,
        (TurnoverStatus::Resolved, Some(resolved_at), Some(since)) => resolved_at > since,
        (TurnoverStatus::Resolved, None, Some(_)) => false,
    }
}

/// Error raised by the turnover service.
#[derive(Debug, thiserror::Error)]
pub enum TurnoverServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
