use chrono::NaiveDate;
use ensemble::clock::Clock;
use ensemble::http::PortalContext;
use ensemble::links::LinkService;
use ensemble::registry::{AssetRegistry, Directory, RegistryService};
use ensemble::scorecard::{ScorecardService, TimePeriod};
use ensemble::session::SessionManager;
use ensemble::store::InMemoryStore;
use ensemble::turnover::{SlaPolicy, TurnoverService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Every domain service wired onto one shared store.
pub(crate) struct Portal<A, D> {
    pub(crate) store: Arc<InMemoryStore>,
    pub(crate) context: PortalContext,
    pub(crate) registry: Arc<RegistryService<InMemoryStore, A, D>>,
    pub(crate) scorecard: Arc<ScorecardService<InMemoryStore>>,
    pub(crate) turnover: Arc<TurnoverService<InMemoryStore>>,
    pub(crate) links: Arc<LinkService<InMemoryStore>>,
}

impl<A, D> Portal<A, D>
where
    A: AssetRegistry + 'static,
    D: Directory + 'static,
{
    pub(crate) fn new(
        store: Arc<InMemoryStore>,
        sessions: Arc<SessionManager>,
        clock: Arc<dyn Clock>,
        upstream: (Arc<A>, Arc<D>),
        policy: SlaPolicy,
    ) -> Self {
        let (assets, directory) = upstream;
        Self {
            context: PortalContext::new(sessions, clock.clone()),
            registry: Arc::new(RegistryService::new(
                store.clone(),
                assets,
                directory,
                clock.clone(),
            )),
            scorecard: Arc::new(ScorecardService::new(store.clone(), clock.clone())),
            turnover: Arc::new(TurnoverService::new(store.clone(), clock.clone(), policy)),
            links: Arc::new(LinkService::new(store.clone(), clock)),
            store,
        }
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_period(raw: &str) -> Result<TimePeriod, String> {
    raw.parse::<TimePeriod>().map_err(|err| err.to_string())
}
