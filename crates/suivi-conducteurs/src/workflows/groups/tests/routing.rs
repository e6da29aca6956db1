use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::workflows::groups::group_router;

#[tokio::test]
async fn create_user_route_returns_created() {
    let router = group_router(Arc::new(directory()));

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/users",
            json!({ "username": "bnoel", "first_name": "Bruno", "last_name": "Noel" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["username"], "bnoel");
    assert_eq!(body["is_active"], true);
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
    let directory = directory();
    alice(&directory);
    let router = group_router(Arc::new(directory));

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/users",
            json!({ "username": "alice" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = read_json_body(response).await;
    assert_eq!(body["error"], "username already taken");
}

#[tokio::test]
async fn members_route_on_unknown_group_is_not_found() {
    let directory = directory();
    let user = alice(&directory);
    let router = group_router(Arc::new(directory));

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/groups/7/members",
            json!({ "user_ids": [user.id] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn members_route_reports_added_users_and_history() {
    let directory = Arc::new(directory());
    let user = alice(&directory);
    let rh = group(&directory, "RH");
    let router = group_router(directory.clone());

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/groups/{}/members", rh.id),
            json!({ "user_ids": [user.id] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["user_ids"], json!([user.id]));

    let history = router
        .oneshot(
            axum::http::Request::get(format!("/api/v1/groups/{}/history", rh.id))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(history.status(), StatusCode::OK);
    let entries = read_json_body(history).await;
    assert_eq!(entries[0]["action"], "add_user");
    assert_eq!(entries[0]["details"], "Ajout de alice au groupe RH");
}
