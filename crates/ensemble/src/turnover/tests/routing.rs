use super::common::*;
use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::testing::{json_body, request};
use crate::turnover::turnover_router;

fn router(fixture: &Fixture) -> axum::Router {
    turnover_router(fixture.service.clone(), fixture.context.clone())
}

#[tokio::test]
async fn create_accepts_section_tagged_details() {
    let fixture = build();
    let (_, cookie) = fixture.member();
    let response = router(&fixture)
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/teams/{}/turnover", fixture.team.id),
            Some(&cookie),
            Some(json!({
                "application_id": fixture.application.id,
                "details": {
                    "section": "RFC",
                    "rfc_number": "CHG0012345",
                    "rfc_status": "Scheduled"
                },
                "description": "Patch database cluster",
                "is_important": true
            })),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["details"]["section"], "RFC");
    assert_eq!(body["status"], "OPEN");
    assert_eq!(body["sla"], "HEALTHY");
}

#[tokio::test]
async fn missing_section_fields_are_unprocessable() {
    let fixture = build();
    let (_, cookie) = fixture.member();
    let response = router(&fixture)
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/teams/{}/turnover", fixture.team.id),
            Some(&cookie),
            Some(json!({
                "application_id": fixture.application.id,
                "details": { "section": "COMMS", "email_subject": "  " },
                "description": "Customer notice"
            })),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["field"], "email_subject");
}

#[tokio::test]
async fn second_resolve_conflicts() {
    let fixture = build();
    let view = fixture.log(incident("INC0042"), false);
    let (_, cookie) = fixture.member();
    let app = router(&fixture);
    let uri = format!("/api/v1/turnover/entries/{}/resolve", view.entry.id);

    let response = app
        .clone()
        .oneshot(request(Method::POST, &uri, Some(&cookie), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request(Method::POST, &uri, Some(&cookie), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn list_accepts_filters_and_dashboard_renders() {
    let fixture = build();
    fixture.log(incident("INC0001"), false);
    fixture.log(crate::turnover::SectionDetails::Fyi, false);
    let (_, cookie) = fixture.member();
    let app = router(&fixture);

    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            &format!("/api/v1/teams/{}/turnover?section=INC&status=OPEN", fixture.team.id),
            Some(&cookie),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await.as_array().expect("list").len(), 1);

    let response = app
        .oneshot(request(
            Method::GET,
            &format!("/api/v1/teams/{}/turnover/dashboard", fixture.team.id),
            Some(&cookie),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["open"], 2);
}

#[tokio::test]
async fn finalize_then_fetch_snapshot() {
    let fixture = build();
    fixture.log(incident("INC0001"), false);
    let (_, cookie) = fixture.member();
    let app = router(&fixture);

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/teams/{}/turnover/snapshots", fixture.team.id),
            Some(&cookie),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let summary = json_body(response).await;
    let snapshot_id = summary["id"].as_str().expect("id").to_string();

    let response = app
        .oneshot(request(
            Method::GET,
            &format!("/api/v1/turnover/snapshots/{snapshot_id}"),
            Some(&cookie),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["entry_count"], 1);
}
