use super::common::*;
use axum::http::header::SET_COOKIE;
use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::scorecard::scorecard_router;
use crate::testing::{self, json_body, request};

fn router(fixture: &Fixture) -> axum::Router {
    scorecard_router(fixture.service.clone(), fixture.context.clone())
}

#[tokio::test]
async fn missing_cookie_is_unauthorized() {
    let fixture = build();
    let uri = format!("/api/v1/teams/{}/scorecard", fixture.team.id);
    let response = router(&fixture)
        .oneshot(request(Method::GET, &uri, None, None))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let cookie = response.headers().get(SET_COOKIE).expect("cookie cleared");
    assert!(cookie.to_str().expect("ascii").contains("Max-Age=0"));
}

#[tokio::test]
async fn tampered_cookie_is_unauthorized() {
    let fixture = build();
    let (_, cookie) = fixture.user();
    let tampered = format!("{}00", cookie);
    let uri = format!("/api/v1/teams/{}/scorecard", fixture.team.id);
    let response = router(&fixture)
        .oneshot(request(Method::GET, &uri, Some(&tampered), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_creates_entry_and_member_records_month() {
    let fixture = build();
    let (_, admin_cookie) = fixture.admin();
    let (_, user_cookie) = fixture.user();
    let app = router(&fixture);

    let create_uri = format!("/api/v1/teams/{}/scorecard/entries", fixture.team.id);
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            &create_uri,
            Some(&admin_cookie),
            Some(json!({
                "application_id": fixture.application.id,
                "scorecard_identifier": "PAY-AUTH",
                "name": "Card authorisations",
                "availability_threshold": 98.0,
                "volume_change_threshold": 15.0
            })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let entry = json_body(response).await;
    let entry_id = entry["id"].as_str().expect("id").to_string();

    let response = app
        .clone()
        .oneshot(request(
            Method::PUT,
            &format!("/api/v1/scorecard/entries/{entry_id}/availability"),
            Some(&user_cookie),
            Some(json!({ "year": 2025, "month": 2, "availability": 97.5, "reason": "Vendor outage" })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request(
            Method::GET,
            &format!("/api/v1/teams/{}/scorecard?period=last-3", fixture.team.id),
            Some(&user_cookie),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["period"], "last-3");
    assert_eq!(body["months"].as_array().expect("months").len(), 3);
    assert_eq!(body["entries"][0]["evaluation"]["availability_breaches"], 1);
}

#[tokio::test]
async fn member_cannot_create_entries() {
    let fixture = build();
    let (_, user_cookie) = fixture.user();
    let response = router(&fixture)
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/teams/{}/scorecard/entries", fixture.team.id),
            Some(&user_cookie),
            Some(json!({
                "application_id": fixture.application.id,
                "scorecard_identifier": "PAY-AUTH",
                "name": "Card authorisations",
                "availability_threshold": 98.0,
                "volume_change_threshold": 15.0
            })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn validation_errors_name_the_field() {
    let fixture = build();
    let entry = fixture.entry("PAY-AUTH", 98.0);
    let (_, user_cookie) = fixture.user();
    let response = router(&fixture)
        .oneshot(request(
            Method::PUT,
            &format!("/api/v1/scorecard/entries/{}/availability", entry.id),
            Some(&user_cookie),
            Some(json!({ "year": 2025, "month": 13, "availability": 99.0 })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["field"], "month");
}

#[tokio::test]
async fn unpublishing_twice_conflicts() {
    let fixture = build();
    let (_, admin_cookie) = fixture.admin();
    let app = router(&fixture);
    let base = format!("/api/v1/teams/{}/scorecard/publication/2025/2", fixture.team.id);

    let response = app
        .clone()
        .oneshot(request(Method::POST, &format!("{base}/publish"), Some(&admin_cookie), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["published"], true);

    let response = app
        .clone()
        .oneshot(request(Method::POST, &format!("{base}/unpublish"), Some(&admin_cookie), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request(Method::POST, &format!("{base}/unpublish"), Some(&admin_cookie), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_entry_is_not_found() {
    let fixture = build();
    let (_, outsider_cookie) = testing::outsider(&fixture.context);
    let response = router(&fixture)
        .oneshot(request(
            Method::DELETE,
            "/api/v1/scorecard/entries/entry-999999",
            Some(&outsider_cookie),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
