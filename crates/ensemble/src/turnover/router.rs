use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Extension, Json, Router,
};

use super::domain::{NewTurnoverEntry, SnapshotId, TurnoverEntryId, TurnoverEntryPatch};
use super::repository::TurnoverRepository;
use super::service::{TurnoverService, TurnoverServiceError};
use super::views::TurnoverFilter;
use crate::http::{ApiError, PortalContext};
use crate::registry::{RegistryRepository, TeamId};

/// Router builder exposing the turnover log, dashboard and snapshots.
pub fn turnover_router<R>(service: Arc<TurnoverService<R>>, context: PortalContext) -> Router
where
    R: RegistryRepository + TurnoverRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/teams/:team_id/turnover",
            get(list_handler::<R>).post(create_handler::<R>),
        )
        .route(
            "/api/v1/teams/:team_id/turnover/dashboard",
            get(dashboard_handler::<R>),
        )
        .route(
            "/api/v1/teams/:team_id/turnover/snapshots",
            get(list_snapshots_handler::<R>).post(finalize_handler::<R>),
        )
        .route(
            "/api/v1/turnover/entries/:entry_id",
            patch(update_handler::<R>).delete(delete_handler::<R>),
        )
        .route(
            "/api/v1/turnover/entries/:entry_id/resolve",
            post(resolve_handler::<R>),
        )
        .route(
            "/api/v1/turnover/snapshots/:snapshot_id",
            get(snapshot_handler::<R>),
        )
        .with_state(service)
        .layer(Extension(context))
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<TurnoverService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(team_id): Path<String>,
    Query(filter): Query<TurnoverFilter>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + TurnoverRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    let entries = service.list(&session, &TeamId(team_id), filter)?;
    Ok((StatusCode::OK, Json(entries)).into_response())
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<TurnoverService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(team_id): Path<String>,
    Json(input): Json<NewTurnoverEntry>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + TurnoverRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    let entry = service.create(&session, &TeamId(team_id), input)?;
    Ok((StatusCode::CREATED, Json(entry)).into_response())
}

pub(crate) async fn dashboard_handler<R>(
    State(service): State<Arc<TurnoverService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(team_id): Path<String>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + TurnoverRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    let dashboard = service.dashboard(&session, &TeamId(team_id))?;
    Ok((StatusCode::OK, Json(dashboard)).into_response())
}

pub(crate) async fn update_handler<R>(
    State(service): State<Arc<TurnoverService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(entry_id): Path<String>,
    Json(patch): Json<TurnoverEntryPatch>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + TurnoverRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    let entry = service.update(&session, &TurnoverEntryId(entry_id), patch)?;
    Ok((StatusCode::OK, Json(entry)).into_response())
}

pub(crate) async fn resolve_handler<R>(
    State(service): State<Arc<TurnoverService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(entry_id): Path<String>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + TurnoverRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    let entry = service.resolve(&session, &TurnoverEntryId(entry_id))?;
    Ok((StatusCode::OK, Json(entry)).into_response())
}

pub(crate) async fn delete_handler<R>(
    State(service): State<Arc<TurnoverService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(entry_id): Path<String>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + TurnoverRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    service.delete(&session, &TurnoverEntryId(entry_id))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn finalize_handler<R>(
    State(service): State<Arc<TurnoverService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(team_id): Path<String>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + TurnoverRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    let snapshot = service.finalize(&session, &TeamId(team_id))?;
    Ok((StatusCode::CREATED, Json(snapshot)).into_response())
}

pub(crate) async fn list_snapshots_handler<R>(
    State(service): State<Arc<TurnoverService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(team_id): Path<String>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + TurnoverRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    let snapshots = service.list_snapshots(&session, &TeamId(team_id))?;
    Ok((StatusCode::OK, Json(snapshots)).into_response())
}

pub(crate) async fn snapshot_handler<R>(
    State(service): State<Arc<TurnoverService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(snapshot_id): Path<String>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + TurnoverRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    let snapshot = service.snapshot(&session, &SnapshotId(snapshot_id))?;
    Ok((StatusCode::OK, Json(snapshot)).into_response())
}

impl From<TurnoverServiceError> for ApiError {
    fn from(value: TurnoverServiceError) -> Self {
        match value {
            TurnoverServiceError::Validation(err) => ApiError::Validation(err),
            TurnoverServiceError::Access(err) => ApiError::Forbidden(err),
            TurnoverServiceError::Transition(err) => ApiError::Conflict(err.to_string()),
            TurnoverServiceError::Repository(err) => ApiError::from(err),
        }
    }
}
