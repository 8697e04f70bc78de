use crate::infra::{AppState, Portal};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use ensemble::links::link_router;
use ensemble::registry::{registry_router, AssetRegistry, Directory};
use ensemble::scorecard::scorecard_router;
use ensemble::session::session_router;
use ensemble::turnover::turnover_router;
use serde_json::json;

pub(crate) fn with_portal_routes<A, D>(portal: Portal<A, D>) -> axum::Router
where
    A: AssetRegistry + 'static,
    D: Directory + 'static,
{
    let Portal {
        store,
        context,
        registry,
        scorecard,
        turnover,
        links,
    } = portal;

    session_router(store, context.clone())
        .merge(registry_router(registry, context.clone()))
        .merge(scorecard_router(scorecard, context.clone()))
        .merge(turnover_router(turnover, context.clone()))
        .merge(link_router(links, context))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
