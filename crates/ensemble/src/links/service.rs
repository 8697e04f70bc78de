use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{
    CategoryInput, Link, LinkCategory, LinkCategoryId, LinkId, LinkPatch, NewLink,
};
use super::repository::LinkRepository;
use crate::clock::Clock;
use crate::registry::TeamId;
use crate::session::{AccessError, Session};
use crate::store::RepositoryError;
use crate::validation::ValidationError;

/// Links of one category, or the uncategorised remainder when `category` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub category: Option<LinkCategory>,
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDirectory {
    pub team_id: TeamId,
    pub groups: Vec<CategoryGroup>,
}

/// Link Manager operations; every call requires team membership.
pub struct LinkService<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> LinkService<R>
where
    R: LinkRepository + 'static,
{
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub fn create_category(
        &self,
        session: &Session,
        team_id: &TeamId,
        input: CategoryInput,
    ) -> Result<LinkCategory, LinkServiceError> {
        session.require_member(team_id)?;
        let input = input.validate()?;
        let category = LinkCategory {
            id: LinkCategoryId(self.repository.next_id("category")),
            team_id: team_id.clone(),
            name: input.name,
            created_at: self.clock.now(),
        };
        Ok(self.repository.insert_category(category)?)
    }

    pub fn rename_category(
        &self,
        session: &Session,
        category_id: &LinkCategoryId,
        input: CategoryInput,
    ) -> Result<LinkCategory, LinkServiceError> {
        let mut category = self.member_category(session, category_id)?;
        category.name = input.validate()?.name;
        self.repository.update_category(category.clone())?;
        Ok(category)
    }

    pub fn delete_category(
        &self,
        session: &Session,
        category_id: &LinkCategoryId,
    ) -> Result<(), LinkServiceError> {
        let category = self.member_category(session, category_id)?;
        self.repository.delete_category(&category.id)?;
        info!(category_id = %category.id, team_id = %category.team_id, "link category deleted");
        Ok(())
    }

    pub fn list_categories(
        &self,
        session: &Session,
        team_id: &TeamId,
    ) -> Result<Vec<LinkCategory>, LinkServiceError> {
        session.require_member(team_id)?;
        let mut categories = self.repository.list_categories(team_id)?;
        categories.sort_by_key(|category| category.name.to_lowercase());
        Ok(categories)
    }

    pub fn create_link(
        &self,
        session: &Session,
        team_id: &TeamId,
        input: NewLink,
    ) -> Result<Link, LinkServiceError> {
        session.require_member(team_id)?;
        let input = input.validate()?;
        if let Some(category_id) = &input.category_id {
            self.category_in_team(category_id, team_id)?;
        }

        let now = self.clock.now();
        let actor = session.actor();
        let link = Link {
            id: LinkId(self.repository.next_id("link")),
            team_id: team_id.clone(),
            category_id: input.category_id,
            title: input.title,
            url: input.url,
            description: input.description,
            is_pinned: input.is_pinned,
            created_by: actor.clone(),
            created_at: now,
            updated_by: actor,
            updated_at: now,
        };
        Ok(self.repository.insert_link(link)?)
    }

    pub fn update_link(
        &self,
        session: &Session,
        link_id: &LinkId,
        patch: LinkPatch,
    ) -> Result<Link, LinkServiceError> {
        let mut link = self.member_link(session, link_id)?;
        patch.apply(&mut link)?;
        if let Some(category_id) = &link.category_id {
            self.category_in_team(category_id, &link.team_id)?;
        }
        link.updated_by = session.actor();
        link.updated_at = self.clock.now();
        self.repository.update_link(link.clone())?;
        Ok(link)
    }

    pub fn delete_link(&self, session: &Session, link_id: &LinkId) -> Result<(), LinkServiceError> {
        let link = self.member_link(session, link_id)?;
        self.repository.delete_link(&link.id)?;
        Ok(())
    }

    /// Categories by name, uncategorised links last; pinned links lead each group.
    pub fn directory(
        &self,
        session: &Session,
        team_id: &TeamId,
    ) -> Result<LinkDirectory, LinkServiceError> {
        let categories = self.list_categories(session, team_id)?;
        let mut by_category: BTreeMap<Option<LinkCategoryId>, Vec<Link>> = BTreeMap::new();
        for link in self.repository.list_links(team_id)? {
            by_category
                .entry(link.category_id.clone())
                .or_default()
                .push(link);
        }

        let mut groups = Vec::with_capacity(categories.len() + 1);
        for category in categories {
            let links = by_category.remove(&Some(category.id.clone())).unwrap_or_default();
            groups.push(CategoryGroup {
                category: Some(category),
                links: ordered(links),
            });
        }
        let uncategorised: Vec<Link> = by_category.into_values().flatten().collect();
        if !uncategorised.is_empty() {
            groups.push(CategoryGroup {
                category: None,
                links: ordered(uncategorised),
            });
        }

        Ok(LinkDirectory {
            team_id: team_id.clone(),
            groups,
        })
    }

    fn category_in_team(
        &self,
        category_id: &LinkCategoryId,
        team_id: &TeamId,
    ) -> Result<LinkCategory, LinkServiceError> {
        let category = self
            .repository
            .fetch_category(category_id)?
            .filter(|category| &category.team_id == team_id)
            .ok_or_else(|| ValidationError::new("category_id", "is not a category of this team"))?;
        Ok(category)
    }

    fn member_category(
        &self,
        session: &Session,
        category_id: &LinkCategoryId,
    ) -> Result<LinkCategory, LinkServiceError> {
        let category = self
            .repository
            .fetch_category(category_id)?
            .ok_or(RepositoryError::NotFound)?;
        session.require_member(&category.team_id)?;
        Ok(category)
    }

    fn member_link(&self, session: &Session, link_id: &LinkId) -> Result<Link, LinkServiceError> {
        let link = self
            .repository
            .fetch_link(link_id)?
            .ok_or(RepositoryError::NotFound)?;
        session.require_member(&link.team_id)?;
        Ok(link)
    }
}

fn ordered(mut links: Vec<Link>) -> Vec<Link> {
    links.sort_by(|a, b| {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
    });
    links
}

/// Error raised by the link service.
#[derive(Debug, thiserror::Error)]
pub enum LinkServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
