use super::domain::{Application, ApplicationId, Team, TeamId};
use crate::store::{IdSource, RepositoryError};

/// Storage abstraction for the team and application registries.
pub trait RegistryRepository: IdSource {
    fn insert_team(&self, team: Team) -> Result<Team, RepositoryError>;
    fn fetch_team(&self, id: &TeamId) -> Result<Option<Team>, RepositoryError>;
    fn list_teams(&self) -> Result<Vec<Team>, RepositoryError>;

    fn insert_application(&self, application: Application)
        -> Result<Application, RepositoryError>;
    fn update_application(&self, application: Application) -> Result<(), RepositoryError>;
    fn fetch_application(&self, id: &ApplicationId)
        -> Result<Option<Application>, RepositoryError>;
    fn list_applications(&self, team_id: &TeamId) -> Result<Vec<Application>, RepositoryError>;
    /// Removes the application together with its scorecard entries, their
    /// records, and its turnover entries.
    fn delete_application(&self, id: &ApplicationId) -> Result<(), RepositoryError>;
}
