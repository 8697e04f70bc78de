use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Extension, Json, Router,
};

use super::domain::{ApplicationId, NewApplication, NewTeam, TeamId};
use super::repository::RegistryRepository;
use super::service::{RegistryService, RegistryServiceError};
use super::upstream::{AssetRegistry, Directory, UpstreamError};
use crate::http::{ApiError, PortalContext};

type Service<R, A, D> = Arc<RegistryService<R, A, D>>;

/// Router builder exposing teams, applications, asset lookup and members.
pub fn registry_router<R, A, D>(service: Service<R, A, D>, context: PortalContext) -> Router
where
    R: RegistryRepository + 'static,
    A: AssetRegistry + 'static,
    D: Directory + 'static,
{
    Router::new()
        .route(
            "/api/v1/teams",
            get(list_teams_handler::<R, A, D>).post(create_team_handler::<R, A, D>),
        )
        .route("/api/v1/teams/:team_id", get(team_handler::<R, A, D>))
        .route(
            "/api/v1/teams/:team_id/members",
            get(members_handler::<R, A, D>),
        )
        .route(
            "/api/v1/teams/:team_id/applications",
            get(list_applications_handler::<R, A, D>).post(register_handler::<R, A, D>),
        )
        .route("/api/v1/assets/:asset_id", get(lookup_handler::<R, A, D>))
        .route(
            "/api/v1/applications/:application_id",
            delete(delete_application_handler::<R, A, D>),
        )
        .route(
            "/api/v1/applications/:application_id/sync",
            post(sync_handler::<R, A, D>),
        )
        .with_state(service)
        .layer(Extension(context))
}

pub(crate) async fn list_teams_handler<R, A, D>(
    State(service): State<Service<R, A, D>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + 'static,
    A: AssetRegistry + 'static,
    D: Directory + 'static,
{
    context.authenticate(&headers)?;
    let teams = service.list_teams()?;
    Ok((StatusCode::OK, Json(teams)).into_response())
}

pub(crate) async fn create_team_handler<R, A, D>(
    State(service): State<Service<R, A, D>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Json(input): Json<NewTeam>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + 'static,
    A: AssetRegistry + 'static,
    D: Directory + 'static,
{
    let session = context.authenticate(&headers)?;
    let team = service.create_team(&session, input)?;
    Ok((StatusCode::CREATED, Json(team)).into_response())
}

pub(crate) async fn team_handler<R, A, D>(
    State(service): State<Service<R, A, D>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(team_id): Path<String>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + 'static,
    A: AssetRegistry + 'static,
    D: Directory + 'static,
{
    let session = context.authenticate(&headers)?;
    let team = service.get_team(&session, &TeamId(team_id))?;
    Ok((StatusCode::OK, Json(team)).into_response())
}

pub(crate) async fn members_handler<R, A, D>(
    State(service): State<Service<R, A, D>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(team_id): Path<String>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + 'static,
    A: AssetRegistry + 'static,
    D: Directory + 'static,
{
    let session = context.authenticate(&headers)?;
    let members = service.team_members(&session, &TeamId(team_id)).await?;
    Ok((StatusCode::OK, Json(members)).into_response())
}

pub(crate) async fn list_applications_handler<R, A, D>(
    State(service): State<Service<R, A, D>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(team_id): Path<String>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + 'static,
    A: AssetRegistry + 'static,
    D: Directory + 'static,
{
    let session = context.authenticate(&headers)?;
    let applications = service.list_applications(&session, &TeamId(team_id))?;
    Ok((StatusCode::OK, Json(applications)).into_response())
}

pub(crate) async fn register_handler<R, A, D>(
    State(service): State<Service<R, A, D>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(team_id): Path<String>,
    Json(input): Json<NewApplication>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + 'static,
    A: AssetRegistry + 'static,
    D: Directory + 'static,
{
    let session = context.authenticate(&headers)?;
    let application = service
        .register_application(&session, &TeamId(team_id), input)
        .await?;
    Ok((StatusCode::CREATED, Json(application)).into_response())
}

pub(crate) async fn lookup_handler<R, A, D>(
    State(service): State<Service<R, A, D>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(asset_id): Path<String>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + 'static,
    A: AssetRegistry + 'static,
    D: Directory + 'static,
{
    context.authenticate(&headers)?;
    let record = service.lookup_asset(&asset_id).await?;
    Ok((StatusCode::OK, Json(record)).into_response())
}

pub(crate) async fn sync_handler<R, A, D>(
    State(service): State<Service<R, A, D>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + 'static,
    A: AssetRegistry + 'static,
    D: Directory + 'static,
{
    let session = context.authenticate(&headers)?;
    let application = service
        .sync_application(&session, &ApplicationId(application_id))
        .await?;
    Ok((StatusCode::OK, Json(application)).into_response())
}

pub(crate) async fn delete_application_handler<R, A, D>(
    State(service): State<Service<R, A, D>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Result<Response, ApiError>
where
    R: RegistryRepository + 'static,
    A: AssetRegistry + 'static,
    D: Directory + 'static,
{
    let session = context.authenticate(&headers)?;
    service.delete_application(&session, &ApplicationId(application_id))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

impl From<RegistryServiceError> for ApiError {
    fn from(value: RegistryServiceError) -> Self {
        match value {
            RegistryServiceError::Validation(err) => ApiError::Validation(err),
            RegistryServiceError::Access(err) => ApiError::Forbidden(err),
            RegistryServiceError::Upstream(err @ UpstreamError::NotFound { .. }) => {
                ApiError::NotFound(err.to_string())
            }
            RegistryServiceError::Upstream(err) => ApiError::from(err),
            RegistryServiceError::Repository(err) => ApiError::from(err),
        }
    }
}
