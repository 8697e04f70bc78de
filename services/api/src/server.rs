use crate::cli::ServeArgs;
use crate::demo::{demo_portal, seed_demo_portal};
use crate::infra::{AppState, Portal};
use crate::routes::with_portal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use ensemble::clock::{Clock, ManualClock, SystemClock};
use ensemble::config::AppConfig;
use ensemble::error::AppError;
use ensemble::registry::{HttpAssetRegistry, HttpDirectory};
use ensemble::session::SessionManager;
use ensemble::store::InMemoryStore;
use ensemble::telemetry;
use ensemble::turnover::SlaPolicy;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(InMemoryStore::new());

    if args.seed_demo {
        let now = clock.now();
        let seed_clock = Arc::new(ManualClock::new(now));
        let seeder = demo_portal(store.clone(), seed_clock.clone());
        let seed = seed_demo_portal(&seeder, &seed_clock, now)?;
        info!(team = %seed.team.name, team_id = %seed.team.id, "seeded demo team");
    }

    if config.upstream.asset_api_url.is_none() {
        warn!("ENSEMBLE_ASSET_API_URL unset; application registration is disabled");
    }
    if config.upstream.ldap_api_url.is_none() {
        warn!("ENSEMBLE_LDAP_API_URL unset; team member listing is disabled");
    }

    let portal = Portal::new(
        store,
        Arc::new(SessionManager::new(&config.session)),
        clock,
        (
            Arc::new(HttpAssetRegistry::new(&config.upstream)),
            Arc::new(HttpDirectory::new(&config.upstream)),
        ),
        SlaPolicy::from(&config.turnover),
    );

    let app = with_portal_routes(portal)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "ensemble portal ready");

    axum::serve(listener, app).await?;
    Ok(())
}
