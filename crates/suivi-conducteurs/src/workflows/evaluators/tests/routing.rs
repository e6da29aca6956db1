use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use super::common::Fixture;
use crate::workflows::evaluators::evaluator_router;

async fn get_json(router: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn evaluators_are_listed_with_their_service() {
    let fixture = Fixture::new();
    let rh = fixture.group("RH");
    let exploitation = fixture.group("Exploitation");
    let marie = fixture.user("mdupont", "Marie", "Dupont");
    let anne = fixture.user("aleroy", "Anne", "Leroy");
    fixture.join(&rh, &marie);
    fixture.join(&exploitation, &anne);
    let router = evaluator_router(Arc::new(fixture.evaluators));

    let (status, body) = get_json(router, "/api/v1/evaluators").await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|view| view["display_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Anne Leroy", "Marie Dupont"]);
    assert_eq!(body[1]["service"]["abbreviation"], "RH");
}

#[tokio::test]
async fn user_without_evaluator_is_not_found() {
    let fixture = Fixture::new();
    let user = fixture.user("compta", "Paul", "Roux");
    let router = evaluator_router(Arc::new(fixture.evaluators));

    let (status, body) = get_json(router, &format!("/api/v1/users/{}/evaluator", user.id)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("evaluator of user"));
}
