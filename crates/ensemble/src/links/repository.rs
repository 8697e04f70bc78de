use super::domain::{Link, LinkCategory, LinkCategoryId, LinkId};
use crate::registry::TeamId;
use crate::store::{IdSource, RepositoryError};

/// Storage abstraction for team link categories and links.
pub trait LinkRepository: IdSource {
    /// Fails with `Conflict` when the team already has a category of that name.
    fn insert_category(&self, category: LinkCategory) -> Result<LinkCategory, RepositoryError>;
    fn update_category(&self, category: LinkCategory) -> Result<(), RepositoryError>;
    fn fetch_category(&self, id: &LinkCategoryId)
        -> Result<Option<LinkCategory>, RepositoryError>;
    fn list_categories(&self, team_id: &TeamId) -> Result<Vec<LinkCategory>, RepositoryError>;
    /// Removes the category; its links stay, uncategorised.
    fn delete_category(&self, id: &LinkCategoryId) -> Result<(), RepositoryError>;

    fn insert_link(&self, link: Link) -> Result<Link, RepositoryError>;
    fn update_link(&self, link: Link) -> Result<(), RepositoryError>;
    fn fetch_link(&self, id: &LinkId) -> Result<Option<Link>, RepositoryError>;
    fn delete_link(&self, id: &LinkId) -> Result<(), RepositoryError>;
    fn list_links(&self, team_id: &TeamId) -> Result<Vec<Link>, RepositoryError>;
}
