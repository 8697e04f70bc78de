//! Fixtures shared by the module test suites.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header::COOKIE, Method, Request};
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::clock::ManualClock;
use crate::config::SessionConfig;
use crate::http::PortalContext;
use crate::registry::{Application, ApplicationId, RegistryRepository, Team, TeamId};
use crate::session::{Session, SessionManager, SsoAssertion, SIGNATURE_HEADER};
use crate::store::{IdSource, InMemoryStore};

/// Saturday 15 March 2025, mid-morning.
pub(crate) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 15, 10, 0, 0).unwrap()
}

pub(crate) fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(fixed_now()))
}

pub(crate) fn session_config() -> SessionConfig {
    SessionConfig {
        secret: "fixture-secret-with-more-than-32-characters".to_string(),
        sso_secret: "fixture-gateway-secret-longer-than-32-chars".to_string(),
        ttl_hours: 12,
        cookie_name: "ensemble_session".to_string(),
        secure_cookie: false,
    }
}

pub(crate) fn context(clock: Arc<ManualClock>) -> PortalContext {
    PortalContext::new(Arc::new(SessionManager::new(&session_config())), clock)
}

pub(crate) fn seed_team(store: &InMemoryStore, name: &str) -> Team {
    let slug = name.to_ascii_uppercase().replace(' ', "-");
    store
        .insert_team(Team {
            id: TeamId(store.next_id("team")),
            name: name.to_string(),
            admin_group: format!("{slug}-ADMINS"),
            user_group: format!("{slug}-USERS"),
            is_active: true,
            created_by: "Fixture".to_string(),
            created_at: fixed_now(),
        })
        .expect("team inserted")
}

pub(crate) fn seed_application(store: &InMemoryStore, team: &Team, name: &str, tla: &str) -> Application {
    store
        .insert_application(Application {
            id: ApplicationId(store.next_id("app")),
            team_id: team.id.clone(),
            asset_id: format!("AST-{}", store.next_id("asset")),
            name: name.to_string(),
            tla: tla.to_string(),
            life_cycle_status: Some("Production".to_string()),
            tier: Some("1".to_string()),
            hierarchy: Vec::new(),
            synced_at: fixed_now(),
            created_by: "Fixture".to_string(),
            created_at: fixed_now(),
        })
        .expect("application inserted")
}

fn assertion(first_name: &str, groups: Vec<String>) -> SsoAssertion {
    SsoAssertion {
        first_name: first_name.to_string(),
        last_name: "Tester".to_string(),
        email: format!("{}@example.com", first_name.to_lowercase()),
        ads_id: format!("ads-{}", first_name.to_lowercase()),
        groups,
    }
}

/// Session holding the admin role on `team`.
pub(crate) fn admin_of(context: &PortalContext, team: &Team) -> (Session, String) {
    sign_in(context, "Ada", vec![team.admin_group.clone()], std::slice::from_ref(team))
}

/// Session holding the user role on `team`.
pub(crate) fn user_of(context: &PortalContext, team: &Team) -> (Session, String) {
    sign_in(context, "Uma", vec![team.user_group.clone()], std::slice::from_ref(team))
}

/// Signed-in session with no team roles at all.
pub(crate) fn outsider(context: &PortalContext) -> (Session, String) {
    sign_in(context, "Oscar", Vec::new(), &[])
}

/// Runs the real SSO handshake and returns the session plus a `Cookie` header value.
pub(crate) fn sign_in(
    context: &PortalContext,
    first_name: &str,
    groups: Vec<String>,
    teams: &[Team],
) -> (Session, String) {
    let established = context
        .sessions
        .establish(assertion(first_name, groups), teams, context.clock.now())
        .expect("session established");
    let cookie = format!(
        "{}={}",
        context.sessions.cookie_name(),
        established.cookie_value
    );
    (established.session, cookie)
}

pub(crate) fn request(method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

/// `POST /api/v1/session` carrying `body` signed the way the identity gateway signs it.
pub(crate) fn signed_handshake(context: &PortalContext, body: Value) -> Request<Body> {
    let payload = body.to_string();
    let signature = context
        .sessions
        .sign_assertion(payload.as_bytes())
        .expect("assertion signed");
    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/session")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(payload))
        .expect("request")
}

pub(crate) async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}
