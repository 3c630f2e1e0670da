use axum::http::StatusCode;
use sea_orm::EntityTrait;
use serde_json::{Value, json};

use beacon_users_schema::users;

use crate::helpers::{outbox_rows, reject_outbox_inserts, test_server};

#[tokio::test]
async fn should_create_user_and_record_user_created_event() {
    let (server, db) = test_server().await;

    let response = server
        .post("/users")
        .json(&json!({
            "email": "test@email.com",
            "first_name": "Test",
            "last_name": "Testovich",
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["email"], "test@email.com");
    assert!(body["created_at"].as_str().unwrap().ends_with('Z'));

    let rows = outbox_rows(&db).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event_type, "user_created");
    assert_eq!(rows[0].environment, "test");
    assert!(!rows[0].processed);
    let payload: Value = serde_json::from_str(&rows[0].event_context).unwrap();
    assert_eq!(
        payload,
        json!({"email": "test@email.com", "first_name": "Test", "last_name": "Testovich"})
    );
}

#[tokio::test]
async fn should_reject_duplicate_email_with_conflict() {
    let (server, db) = test_server().await;
    let body = json!({ "email": "test@email.com" });

    server
        .post("/users")
        .json(&body)
        .await
        .assert_status(StatusCode::CREATED);
    let response = server.post("/users").json(&body).await;

    response.assert_status(StatusCode::CONFLICT);
    let error: Value = response.json();
    assert_eq!(error["kind"], "USER_ALREADY_EXISTS");
    assert_eq!(error["message"], "user with this email already exists");

    assert_eq!(users::Entity::find().all(&db).await.unwrap().len(), 1);
    assert_eq!(outbox_rows(&db).await.len(), 1);
}

#[tokio::test]
async fn should_reject_invalid_email_without_writing_rows() {
    let (server, db) = test_server().await;

    let response = server
        .post("/users")
        .json(&json!({ "email": "nope" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(users::Entity::find().all(&db).await.unwrap().is_empty());
    assert!(outbox_rows(&db).await.is_empty());
}

#[tokio::test]
async fn should_answer_health_probes_with_request_id() {
    let (server, _db) = test_server().await;

    server.get("/healthz").await.assert_status_ok();
    let ready = server.get("/readyz").await;
    ready.assert_status_ok();
    assert!(ready.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn should_keep_user_when_outbox_write_fails() {
    let (server, db) = test_server().await;
    reject_outbox_inserts(&db).await;

    let response = server
        .post("/users")
        .json(&json!({ "email": "test@email.com" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let users = users::Entity::find().all(&db).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].email, "test@email.com");
    assert!(outbox_rows(&db).await.is_empty());
}
