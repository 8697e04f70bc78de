use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Extension, Json, Router,
};
use tracing::{error, info, warn};

use super::{SessionError, SIGNATURE_HEADER};
use crate::http::{ApiError, PortalContext};
use crate::registry::RegistryRepository;

/// Router builder for the SSO handshake and session inspection.
pub fn session_router<R>(repository: Arc<R>, context: PortalContext) -> Router
where
    R: RegistryRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/session",
            post(establish_handler::<R>)
                .get(current_handler)
                .delete(sign_out_handler),
        )
        .with_state(repository)
        .layer(Extension(context))
}

/// Called by the identity gateway once the provider has released the caller's
/// attributes. The body must carry the gateway's HMAC in `SIGNATURE_HEADER`.
pub(crate) async fn establish_handler<R>(
    State(repository): State<Arc<R>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + 'static,
{
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    let teams = repository.list_teams()?;
    let established = context
        .sessions
        .establish_signed(&body, signature, &teams, context.clock.now())
        .map_err(|err| match err {
            SessionError::Assertion(validation) => ApiError::Validation(validation),
            SessionError::Unsigned | SessionError::BadSignature => {
                warn!(reason = %err, "refusing SSO assertion");
                ApiError::Unauthorized {
                    reason: err.to_string(),
                    clear_cookie: context.sessions.clear_cookie(),
                }
            }
            other => {
                error!(error = %other, "failed to seal session");
                ApiError::Internal("session could not be established".to_string())
            }
        })?;

    info!(
        ads_id = %established.session.user.ads_id,
        teams = established.session.permissions.len(),
        "session established"
    );
    let cookie = context.sessions.set_cookie(&established.cookie_value);
    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, cookie)],
        Json(established.session),
    )
        .into_response())
}

pub(crate) async fn current_handler(
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let session = context.authenticate(&headers)?;
    Ok((StatusCode::OK, Json(session)).into_response())
}

pub(crate) async fn sign_out_handler(Extension(context): Extension<PortalContext>) -> Response {
    let cookie = context.sessions.clear_cookie();
    (StatusCode::NO_CONTENT, [(SET_COOKIE, cookie)]).into_response()
}
