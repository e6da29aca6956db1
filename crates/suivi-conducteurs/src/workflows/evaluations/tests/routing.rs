use axum::http::StatusCode;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::evaluations::evaluation_router;

fn payload(catalogue: &Catalogue, punctuality: Value) -> Value {
    json!({
        "driver_id": catalogue.driver.id,
        "evaluator_id": catalogue.evaluator_id,
        "evaluation_type_id": catalogue.evaluation_type.id,
        "evaluated_on": "2024-01-10",
        "notes": {
            catalogue.punctuality.id.to_string(): punctuality,
            format!("note_{}", catalogue.safety.id): "7",
        }
    })
}

#[tokio::test]
async fn submit_route_creates_then_reports_duplicates() {
    let catalogue = catalogue();
    let router = evaluation_router(catalogue.service.clone());
    let body = payload(&catalogue, json!(4));

    let created = router
        .clone()
        .oneshot(json_request("POST", "/api/v1/evaluations", &body))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let evaluation = read_json_body(created).await;
    assert_eq!(evaluation["evaluated_on"], "2024-01-10");

    let duplicate = router
        .oneshot(json_request("POST", "/api/v1/evaluations", &body))
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn submit_route_rejects_out_of_range_notes() {
    let catalogue = catalogue();
    let router = evaluation_router(catalogue.service.clone());

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/evaluations",
            &payload(&catalogue, json!("7")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(
        body["error"],
        "La note pour Ponctualité doit être entre 1 et 5."
    );
}

#[tokio::test]
async fn submit_route_reports_unknown_driver() {
    let catalogue = catalogue();
    let router = evaluation_router(catalogue.service.clone());
    let mut body = payload(&catalogue, json!(3));
    body["driver_id"] = json!(404);

    let response = router
        .oneshot(json_request("POST", "/api/v1/evaluations", &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn validate_note_route_returns_the_check() {
    let catalogue = catalogue();
    let router = evaluation_router(catalogue.service.clone());

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/evaluations/validate-note",
            &json!({ "criterion_id": catalogue.punctuality.id, "value": "9" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body, json!({ "valid": false, "error": "Note entre 1 et 5" }));
}

#[tokio::test]
async fn list_route_filters_by_driver() {
    let catalogue = catalogue();
    catalogue
        .service
        .submit(catalogue.complete(january_10()))
        .unwrap();
    let router = evaluation_router(catalogue.service.clone());

    let response = router
        .oneshot(
            axum::http::Request::get(format!(
                "/api/v1/evaluations?driver_id={}",
                catalogue.driver.id
            ))
            .body(axum::body::Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["driver_name"], "Martin Paul");
}

async fn submit(catalogue: &Catalogue, body: &Value) -> (StatusCode, Value) {
    let response = evaluation_router(catalogue.service.clone())
        .oneshot(json_request("POST", "/api/v1/evaluations", body))
        .await
        .unwrap();
    let status = response.status();
    (status, read_json_body(response).await)
}

#[tokio::test]
async fn fractional_note_is_reported_as_not_a_number() {
    let catalogue = catalogue();

    let (status, body) = submit(&catalogue, &payload(&catalogue, json!(3.5))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "La note pour Ponctualité doit être un nombre.");
}

#[tokio::test]
async fn missing_field_wins_over_a_bad_note() {
    let catalogue = catalogue();
    let mut body = payload(&catalogue, json!(3.5));
    body.as_object_mut().unwrap().remove("driver_id");

    let (status, body) = submit(&catalogue, &body).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["error"],
        "Tous les champs obligatoires doivent être remplis."
    );
}

#[tokio::test]
async fn malformed_date_is_a_json_validation_error() {
    let catalogue = catalogue();
    let mut body = payload(&catalogue, json!(4));
    body["evaluated_on"] = json!("2024-13-45");

    let (status, body) = submit(&catalogue, &body).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["error"],
        "La date d'évaluation 2024-13-45 est invalide (format attendu AAAA-MM-JJ)."
    );
    assert!(catalogue
        .service
        .list(crate::workflows::evaluations::EvaluationFilter::default())
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn undecodable_body_still_answers_in_json() {
    let catalogue = catalogue();
    let mut body = payload(&catalogue, json!(4));
    body["driver_id"] = json!("abc");

    let (status, body) = submit(&catalogue, &body).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("invalid payload"));
}

#[tokio::test]
async fn validate_note_route_flags_fractional_values() {
    let catalogue = catalogue();
    let router = evaluation_router(catalogue.service.clone());

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/evaluations/validate-note",
            &json!({ "criterion_id": catalogue.punctuality.id, "value": 3.5 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body, json!({ "valid": false, "error": "Nombre requis" }));
}
