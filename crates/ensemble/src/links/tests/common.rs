use std::sync::Arc;

use crate::http::PortalContext;
use crate::links::{CategoryInput, LinkService, NewLink};
use crate::registry::Team;
use crate::session::Session;
use crate::store::InMemoryStore;
use crate::testing;

pub(super) struct Fixture {
    pub(super) context: PortalContext,
    pub(super) service: Arc<LinkService<InMemoryStore>>,
    pub(super) team: Team,
}

impl Fixture {
    pub(super) fn member(&self) -> (Session, String) {
        testing::user_of(&self.context, &self.team)
    }
}

pub(super) fn build() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let clock = testing::manual_clock();
    let context = testing::context(clock.clone());
    let team = testing::seed_team(&store, "Observability");
    let service = Arc::new(LinkService::new(store, clock));
    Fixture {
        context,
        service,
        team,
    }
}

pub(super) fn category(name: &str) -> CategoryInput {
    CategoryInput {
        name: name.to_string(),
    }
}

pub(super) fn link(title: &str, pinned: bool) -> NewLink {
    NewLink {
        title: title.to_string(),
        url: format!("https://wiki.example.com/{}", title.to_lowercase().replace(' ', "-")),
        category_id: None,
        description: None,
        is_pinned: pinned,
    }
}
