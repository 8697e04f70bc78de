use std::sync::Arc;

use crate::clock::ManualClock;
use crate::http::PortalContext;
use crate::registry::{Application, Team};
use crate::session::Session;
use crate::store::InMemoryStore;
use crate::testing;
use crate::turnover::{
    NewTurnoverEntry, SectionDetails, SlaPolicy, TurnoverEntryView, TurnoverService,
};

pub(super) struct Fixture {
    pub(super) store: Arc<InMemoryStore>,
    pub(super) clock: Arc<ManualClock>,
    pub(super) context: PortalContext,
    pub(super) service: Arc<TurnoverService<InMemoryStore>>,
    pub(super) team: Team,
    pub(super) application: Application,
}

impl Fixture {
    pub(super) fn member(&self) -> (Session, String) {
        testing::user_of(&self.context, &self.team)
    }

    pub(super) fn log(&self, details: SectionDetails, important: bool) -> TurnoverEntryView {
        let (member, _) = self.member();
        self.service
            .create(&member, &self.team.id, new_entry(&self.application, details, important))
            .expect("entry created")
    }
}

pub(super) fn build() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let clock = testing::manual_clock();
    let context = testing::context(clock.clone());
    let team = testing::seed_team(&store, "Core Banking");
    let application = testing::seed_application(&store, &team, "General Ledger", "GLD");
    let service = Arc::new(TurnoverService::new(
        store.clone(),
        clock.clone(),
        SlaPolicy::default(),
    ));
    Fixture {
        store,
        clock,
        context,
        service,
        team,
        application,
    }
}

pub(super) fn new_entry(
    application: &Application,
    details: SectionDetails,
    important: bool,
) -> NewTurnoverEntry {
    NewTurnoverEntry {
        application_id: application.id.clone(),
        details,
        description: "Batch posting delayed by upstream feed".to_string(),
        comments: None,
        is_important: important,
    }
}

pub(super) fn incident(number: &str) -> SectionDetails {
    SectionDetails::Inc {
        incident_number: number.to_string(),
    }
}
