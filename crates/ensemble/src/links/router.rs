use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch},
    Extension, Json, Router,
};

use super::domain::{CategoryInput, LinkCategoryId, LinkId, LinkPatch, NewLink};
use super::repository::LinkRepository;
use super::service::{LinkService, LinkServiceError};
use crate::http::{ApiError, PortalContext};
use crate::registry::TeamId;

/// Router builder exposing the Link Manager.
pub fn link_router<R>(service: Arc<LinkService<R>>, context: PortalContext) -> Router
where
    R: LinkRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/teams/:team_id/links",
            get(directory_handler::<R>).post(create_link_handler::<R>),
        )
        .route(
            "/api/v1/teams/:team_id/link-categories",
            get(list_categories_handler::<R>).post(create_category_handler::<R>),
        )
        .route(
            "/api/v1/links/:link_id",
            patch(update_link_handler::<R>).delete(delete_link_handler::<R>),
        )
        .route(
            "/api/v1/link-categories/:category_id",
            patch(rename_category_handler::<R>).delete(delete_category_handler::<R>),
        )
        .with_state(service)
        .layer(Extension(context))
}

pub(crate) async fn directory_handler<R>(
    State(service): State<Arc<LinkService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(team_id): Path<String>,
) -> Result<Response, ApiError>
where
    R: LinkRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    let directory = service.directory(&session, &TeamId(team_id))?;
    Ok((StatusCode::OK, Json(directory)).into_response())
}

pub(crate) async fn create_link_handler<R>(
    State(service): State<Arc<LinkService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(team_id): Path<String>,
    Json(input): Json<NewLink>,
) -> Result<Response, ApiError>
where
    R: LinkRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    let link = service.create_link(&session, &TeamId(team_id), input)?;
    Ok((StatusCode::CREATED, Json(link)).into_response())
}

pub(crate) async fn update_link_handler<R>(
    State(service): State<Arc<LinkService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(link_id): Path<String>,
    Json(patch): Json<LinkPatch>,
) -> Result<Response, ApiError>
where
    R: LinkRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    let link = service.update_link(&session, &LinkId(link_id), patch)?;
    Ok((StatusCode::OK, Json(link)).into_response())
}

pub(crate) async fn delete_link_handler<R>(
    State(service): State<Arc<LinkService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(link_id): Path<String>,
) -> Result<Response, ApiError>
where
    R: LinkRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    service.delete_link(&session, &LinkId(link_id))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn list_categories_handler<R>(
    State(service): State<Arc<LinkService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(team_id): Path<String>,
) -> Result<Response, ApiError>
where
    R: LinkRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    let categories = service.list_categories(&session, &TeamId(team_id))?;
    Ok((StatusCode::OK, Json(categories)).into_response())
}

pub(crate) async fn create_category_handler<R>(
    State(service): State<Arc<LinkService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(team_id): Path<String>,
    Json(input): Json<CategoryInput>,
) -> Result<Response, ApiError>
where
    R: LinkRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    let category = service.create_category(&session, &TeamId(team_id), input)?;
    Ok((StatusCode::CREATED, Json(category)).into_response())
}

pub(crate) async fn rename_category_handler<R>(
    State(service): State<Arc<LinkService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(category_id): Path<String>,
    Json(input): Json<CategoryInput>,
) -> Result<Response, ApiError>
where
    R: LinkRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    let category = service.rename_category(&session, &LinkCategoryId(category_id), input)?;
    Ok((StatusCode::OK, Json(category)).into_response())
}

pub(crate) async fn delete_category_handler<R>(
    State(service): State<Arc<LinkService<R>>>,
    Extension(context): Extension<PortalContext>,
    headers: HeaderMap,
    Path(category_id): Path<String>,
) -> Result<Response, ApiError>
where
    R: LinkRepository + 'static,
{
    let session = context.authenticate(&headers)?;
    service.delete_category(&session, &LinkCategoryId(category_id))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

impl From<LinkServiceError> for ApiError {
    fn from(value: LinkServiceError) -> Self {
        match value {
            LinkServiceError::Validation(err) => ApiError::Validation(err),
            LinkServiceError::Access(err) => ApiError::Forbidden(err),
            LinkServiceError::Repository(err) => ApiError::from(err),
        }
    }
}
