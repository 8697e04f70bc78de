use std::sync::Arc;

use crate::clock::ManualClock;
use crate::http::PortalContext;
use crate::registry::{Application, Team};
use crate::scorecard::{
    AvailabilityInput, NewScorecardEntry, ScorecardEntry, ScorecardService, VolumeInput,
};
use crate::session::Session;
use crate::store::InMemoryStore;
use crate::testing;

pub(super) struct Fixture {
    pub(super) store: Arc<InMemoryStore>,
    pub(super) clock: Arc<ManualClock>,
    pub(super) context: PortalContext,
    pub(super) service: Arc<ScorecardService<InMemoryStore>>,
    pub(super) team: Team,
    pub(super) application: Application,
}

impl Fixture {
    pub(super) fn admin(&self) -> (Session, String) {
        testing::admin_of(&self.context, &self.team)
    }

    pub(super) fn user(&self) -> (Session, String) {
        testing::user_of(&self.context, &self.team)
    }

    pub(super) fn entry(&self, identifier: &str, threshold: f64) -> ScorecardEntry {
        let (admin, _) = self.admin();
        self.service
            .create_entry(&admin, &self.team.id, new_entry(&self.application, identifier, threshold))
            .expect("entry created")
    }
}

pub(super) fn build() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let clock = testing::manual_clock();
    let context = testing::context(clock.clone());
    let team = testing::seed_team(&store, "Payments");
    let application = testing::seed_application(&store, &team, "Card Ledger", "CLG");
    let service = Arc::new(ScorecardService::new(store.clone(), clock.clone()));
    Fixture {
        store,
        clock,
        context,
        service,
        team,
        application,
    }
}

pub(super) fn new_entry(application: &Application, identifier: &str, threshold: f64) -> NewScorecardEntry {
    NewScorecardEntry {
        application_id: application.id.clone(),
        scorecard_identifier: identifier.to_string(),
        name: "Card authorisations".to_string(),
        availability_threshold: threshold,
        volume_change_threshold: 20.0,
    }
}

pub(super) fn availability(month: u32, value: f64, reason: Option<&str>) -> AvailabilityInput {
    AvailabilityInput {
        year: 2025,
        month,
        availability: value,
        reason: reason.map(str::to_string),
    }
}

pub(super) fn volume(month: u32, value: i64) -> VolumeInput {
    VolumeInput {
        year: 2025,
        month,
        volume: value,
        reason: None,
    }
}
