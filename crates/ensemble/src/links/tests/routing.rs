use super::common::*;
use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::links::link_router;
use crate::testing::{json_body, request};

fn router(fixture: &Fixture) -> axum::Router {
    link_router(fixture.service.clone(), fixture.context.clone())
}

#[tokio::test]
async fn create_and_list_links() {
    let fixture = build();
    let (_, cookie) = fixture.member();
    let app = router(&fixture);

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/teams/{}/link-categories", fixture.team.id),
            Some(&cookie),
            Some(json!({ "name": "Runbooks" })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let category_id = json_body(response).await["id"]
        .as_str()
        .expect("id")
        .to_string();

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/teams/{}/links", fixture.team.id),
            Some(&cookie),
            Some(json!({
                "title": "Failover",
                "url": "https://wiki.example.com/failover",
                "category_id": category_id,
                "is_pinned": true
            })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(request(
            Method::GET,
            &format!("/api/v1/teams/{}/links", fixture.team.id),
            Some(&cookie),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["groups"][0]["category"]["name"], "Runbooks");
    assert_eq!(body["groups"][0]["links"][0]["title"], "Failover");
}

#[tokio::test]
async fn non_http_urls_are_rejected() {
    let fixture = build();
    let (_, cookie) = fixture.member();
    let response = router(&fixture)
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/teams/{}/links", fixture.team.id),
            Some(&cookie),
            Some(json!({ "title": "Share", "url": "file:///etc/passwd" })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["field"], "url");
}

#[tokio::test]
async fn delete_missing_link_is_not_found() {
    let fixture = build();
    let (_, cookie) = fixture.member();
    let response = router(&fixture)
        .oneshot(request(
            Method::DELETE,
            "/api/v1/links/link-999999",
            Some(&cookie),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
