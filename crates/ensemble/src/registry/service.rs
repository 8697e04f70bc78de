use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{
    derive_tla, normalize_tla, Application, ApplicationId, NewApplication, NewTeam, Team, TeamId,
};
use super::repository::RegistryRepository;
use super::upstream::{AssetRecord, AssetRegistry, Directory, UpstreamError};
use crate::clock::Clock;
use crate::session::{AccessError, Session};
use crate::store::RepositoryError;
use crate::validation::{self, ValidationError};

/// Resolved membership of a team's two directory groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMembers {
    pub team_id: TeamId,
    pub admins: Vec<String>,
    pub users: Vec<String>,
}

/// Team and application registry backed by the asset registry and directory.
pub struct RegistryService<R, A, D> {
    repository: Arc<R>,
    assets: Arc<A>,
    directory: Arc<D>,
    clock: Arc<dyn Clock>,
}

impl<R, A, D> RegistryService<R, A, D>
where
    R: RegistryRepository + 'static,
    A: AssetRegistry + 'static,
    D: Directory + 'static,
{
    pub fn new(repository: Arc<R>, assets: Arc<A>, directory: Arc<D>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            assets,
            directory,
            clock,
        }
    }

    /// Any signed-in user may create a team; roles follow from the groups at next sign-in.
    pub fn create_team(&self, session: &Session, input: NewTeam) -> Result<Team, RegistryServiceError> {
        let input = input.validate()?;
        let team = Team {
            id: TeamId(self.repository.next_id("team")),
            name: input.name,
            admin_group: input.admin_group,
            user_group: input.user_group,
            is_active: true,
            created_by: session.actor(),
            created_at: self.clock.now(),
        };
        let stored = self.repository.insert_team(team)?;
        info!(team_id = %stored.id, name = %stored.name, "team created");
        Ok(stored)
    }

    pub fn list_teams(&self) -> Result<Vec<Team>, RegistryServiceError> {
        let mut teams = self.repository.list_teams()?;
        teams.sort_by_key(|team| team.name.to_lowercase());
        Ok(teams)
    }

    pub fn get_team(&self, session: &Session, team_id: &TeamId) -> Result<Team, RegistryServiceError> {
        session.require_member(team_id)?;
        Ok(self
            .repository
            .fetch_team(team_id)?
            .ok_or(RepositoryError::NotFound)?)
    }

    pub fn list_applications(
        &self,
        session: &Session,
        team_id: &TeamId,
    ) -> Result<Vec<Application>, RegistryServiceError> {
        session.require_member(team_id)?;
        let mut applications = self.repository.list_applications(team_id)?;
        applications.sort_by(|a, b| a.tla.cmp(&b.tla).then_with(|| a.name.cmp(&b.name)));
        Ok(applications)
    }

    /// Preview of what registering `asset_id` would pull from the asset registry.
    pub async fn lookup_asset(&self, asset_id: &str) -> Result<AssetRecord, RegistryServiceError> {
        let asset_id = validation::required_text("asset_id", asset_id)?;
        Ok(self.assets.lookup(&asset_id).await?)
    }

    pub async fn register_application(
        &self,
        session: &Session,
        team_id: &TeamId,
        input: NewApplication,
    ) -> Result<Application, RegistryServiceError> {
        session.require_admin(team_id)?;
        let input = input.validate()?;
        self.repository
            .fetch_team(team_id)?
            .ok_or(RepositoryError::NotFound)?;

        let record = self.assets.lookup(&input.asset_id).await?;
        let tla = match input.tla {
            Some(tla) => tla,
            None => record
                .short_name
                .as_deref()
                .and_then(|short| normalize_tla(short).ok())
                .unwrap_or_else(|| derive_tla(&record.application_name)),
        };

        let now = self.clock.now();
        let application = Application {
            id: ApplicationId(self.repository.next_id("app")),
            team_id: team_id.clone(),
            asset_id: input.asset_id,
            name: record.application_name,
            tla,
            life_cycle_status: record.life_cycle_status,
            tier: record.tier,
            hierarchy: record.hierarchy,
            synced_at: now,
            created_by: session.actor(),
            created_at: now,
        };

        let stored = self.repository.insert_application(application)?;
        info!(
            application_id = %stored.id,
            %team_id,
            asset_id = %stored.asset_id,
            "application registered"
        );
        Ok(stored)
    }

    /// Refreshes registry-owned metadata; the TLA stays as registered.
    pub async fn sync_application(
        &self,
        session: &Session,
        application_id: &ApplicationId,
    ) -> Result<Application, RegistryServiceError> {
        let mut application = self.admin_application(session, application_id)?;
        let record = self.assets.lookup(&application.asset_id).await?;

        application.name = record.application_name;
        application.life_cycle_status = record.life_cycle_status;
        application.tier = record.tier;
        application.hierarchy = record.hierarchy;
        application.synced_at = self.clock.now();
        self.repository.update_application(application.clone())?;

        info!(application_id = %application.id, "application synced");
        Ok(application)
    }

    /// Cascades scorecard entries, their records, and turnover entries.
    pub fn delete_application(
        &self,
        session: &Session,
        application_id: &ApplicationId,
    ) -> Result<(), RegistryServiceError> {
        let application = self.admin_application(session, application_id)?;
        self.repository.delete_application(&application.id)?;
        info!(
            application_id = %application.id,
            team_id = %application.team_id,
            "application deleted"
        );
        Ok(())
    }

    pub async fn team_members(
        &self,
        session: &Session,
        team_id: &TeamId,
    ) -> Result<TeamMembers, RegistryServiceError> {
        let team = self.get_team(session, team_id)?;
        let admins = self.directory.group_members(&team.admin_group).await?;
        let users = self.directory.group_members(&team.user_group).await?;
        Ok(TeamMembers {
            team_id: team.id,
            admins: sorted_unique(admins),
            users: sorted_unique(users),
        })
    }

    fn admin_application(
        &self,
        session: &Session,
        application_id: &ApplicationId,
    ) -> Result<Application, RegistryServiceError> {
        let application = self
            .repository
            .fetch_application(application_id)?
            .ok_or(RepositoryError::NotFound)?;
        session.require_admin(&application.team_id)?;
        Ok(application)
    }
}

fn sorted_unique(names: Vec<String>) -> Vec<String> {
    let mut names: Vec<String> = names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    names.sort_by_key(|name| name.to_lowercase());
    names.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
    names
}

/// Error raised by the registry service.
#[derive(Debug, thiserror::Error)]
pub enum RegistryServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
