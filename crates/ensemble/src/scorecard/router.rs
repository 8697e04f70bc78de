use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;

use super::domain::{AvailabilityInput, EntryId, NewScorecardEntry, ScorecardEntryPatch, VolumeInput};
use super::period::TimePeriod;
use super::repository::ScorecardRepository;
use super::service::{ScorecardService, ScorecardServiceError};
use crate::http::{ApiError, PortalContext};
use crate::registry::{RegistryRepository, TeamId};

/// Router builder exposing scorecard maintenance, publishing and the enterprise roll-up.
pub fn scorecard_router<R>(service: Arc<ScorecardService<R>>, context: PortalContext) -> Router
where
    R: RegistryRepository + ScorecardRepository + 'static,
{
    Router::new()
        .route("/api/v1/teams/:team_id/scorecard", get(scorecard_handler::<R>))
        .route(
            "/api/v1/teams/:team_id/scorecard/entries",
            get(list_entries_handler::<R>).post(create_entry_handler::<R>),
        )
        .route(
            "/api/v1/scorecard/entries/:entry_id",
            patch(update_entry_handler::<R>).delete(delete_entry_handler::<R>),
        )
        .route(
            "/api/v1/scorecard/entries/:entry_id/availability",
            put(availability_handler::<R>),
        )
        .route(
            "/api/v1/scorecard/entries/:entry_id/volume",
            put(volume_handler::<R>),
        )
        .route(
            "/api/v1/teams/:team_id/scorecard/publication/:year/:month",
            get(publication_handler::<R>),
        )
        .route(
            "/api/v1/teams/:team_id/scorecard/publication/:year/:month/publish",
            post(publish_handler::<R>),
        )
        .route(
            "/api/v1/teams/:team_id/scorecard/publication/:year/:month/unpublish",
            post(unpublish_handler::<R>),
        )
        .route(
            "/api/v1/scorecard/enterprise/:year/:month",
            get(enterprise_handler::<R>),
        )
        .with_state(service)
        .layer(Extension(context))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PeriodQuery {
    #[serde(default)]
    period: Option<TimePeriod>,
}

pub(crate) async fn scorecard_handler<R>(
    State(service): State<Arc<ScorecardService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(team_id): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + ScorecardRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    let period = query.period.unwrap_or_default();
    let scorecard =
        service.team_scorecard(&session, &TeamId(team_id), period, context.today())?;
    Ok((StatusCode::OK, Json(scorecard)).into_response())
}

pub(crate) async fn list_entries_handler<R>(
    State(service): State<Arc<ScorecardService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(team_id): Path<String>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + ScorecardRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    let entries = service.list_entries(&session, &TeamId(team_id))?;
    Ok((StatusCode::OK, Json(entries)).into_response())
}

pub(crate) async fn create_entry_handler<R>(
    State(service): State<Arc<ScorecardService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(team_id): Path<String>,
    Json(input): Json<NewScorecardEntry>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + ScorecardRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    let entry = service.create_entry(&session, &TeamId(team_id), input)?;
    Ok((StatusCode::CREATED, Json(entry)).into_response())
}

pub(crate) async fn update_entry_handler<R>(
    State(service): State<Arc<ScorecardService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(entry_id): Path<String>,
    Json(patch): Json<ScorecardEntryPatch>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + ScorecardRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    let entry = service.update_entry(&session, &EntryId(entry_id), patch)?;
    Ok((StatusCode::OK, Json(entry)).into_response())
}

pub(crate) async fn delete_entry_handler<R>(
    State(service): State<Arc<ScorecardService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(entry_id): Path<String>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + ScorecardRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    service.delete_entry(&session, &EntryId(entry_id))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn availability_handler<R>(
    State(service): State<Arc<ScorecardService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(entry_id): Path<String>,
    Json(input): Json<AvailabilityInput>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + ScorecardRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    let record = service.upsert_availability(&session, &EntryId(entry_id), input)?;
    Ok((StatusCode::OK, Json(record)).into_response())
}

pub(crate) async fn volume_handler<R>(
    State(service): State<Arc<ScorecardService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(entry_id): Path<String>,
    Json(input): Json<VolumeInput>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + ScorecardRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    let record = service.upsert_volume(&session, &EntryId(entry_id), input)?;
    Ok((StatusCode::OK, Json(record)).into_response())
}

pub(crate) async fn publication_handler<R>(
    State(service): State<Arc<ScorecardService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path((team_id, year, month)): Path<(String, i32, u32)>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + ScorecardRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    let view = service.publication(&session, &TeamId(team_id), year, month)?;
    Ok((StatusCode::OK, Json(view)).into_response())
}

pub(crate) async fn publish_handler<R>(
    State(service): State<Arc<ScorecardService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path((team_id, year, month)): Path<(String, i32, u32)>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + ScorecardRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    let view = service.publish_month(&session, &TeamId(team_id), year, month)?;
    Ok((StatusCode::OK, Json(view)).into_response())
}

pub(crate) async fn unpublish_handler<R>(
    State(service): State<Arc<ScorecardService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path((team_id, year, month)): Path<(String, i32, u32)>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + ScorecardRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    let view = service.unpublish_month(&session, &TeamId(team_id), year, month)?;
    Ok((StatusCode::OK, Json(view)).into_response())
}

/// Read-only roll-up; any signed-in user may view it.
pub(crate) async fn enterprise_handler<R>(
    State(service): State<Arc<ScorecardService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path((year, month)): Path<(i32, u32)>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + ScorecardRepository + 'static,
{
    context.authenticate(&headers)?;
    let rollup = service.enterprise_rollup(year, month, context.today())?;
    Ok((StatusCode::OK, Json(rollup)).into_response())
}

impl From<ScorecardServiceError> for ApiError {
    fn from(value: ScorecardServiceError) -> Self {
        match value {
            ScorecardServiceError::Validation(err) => ApiError::Validation(err),
            ScorecardServiceError::Access(err) => ApiError::Forbidden(err),
            ScorecardServiceError::Publish(err) => ApiError::Conflict(err.to_string()),
            ScorecardServiceError::Repository(err) => ApiError::from(err),
        }
    }
}
