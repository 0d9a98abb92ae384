use axum::{
    body::Body,
    http::{self, StatusCode},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

mod common;
use common::*;

#[tokio::test]
async fn test_message_notifies_receiver() {
    // Setup
    let db = setup_test_db().await.expect("Failed to set up test database");
    let group = create_test_group(&db, "G1").await;
    let teacher = create_teacher(&db, "teacher1").await;
    let student = create_student_in_group(&db, "student1", &group).await;
    let app = create_test_app(Arc::new(db));
    let content = "x".repeat(150);

    // Send message
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::POST,
            "/api/messages",
            &create_test_token(&teacher),
            json_body(json!({ "receiver": student.id, "content": content })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let message: Value = parse_json(response.into_body()).await;
    assert_eq!(message["sender"], teacher.id.to_string());
    assert_eq!(message["is_read"], false);

    // Receiver sees the notification
    let student_token = create_test_token(&student);
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::GET,
            "/api/notifications",
            &student_token,
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let notifications: Vec<Value> = parse_json(response.into_body()).await;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["title"], "New Message from Test teacher1");
    assert_eq!(notifications[0]["notification_type"], "MESSAGE");
    let body = notifications[0]["message"].as_str().unwrap();
    assert_eq!(body, format!("{}...", "x".repeat(100)));

    // Receiver sees the conversation
    let response = app
        .oneshot(create_authorized_request(
            http::Method::GET,
            &format!("/api/messages?with_user={}", teacher.id),
            &student_token,
            Body::empty(),
        ))
        .await
        .unwrap();
    let messages: Vec<Value> = parse_json(response.into_body()).await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["content"], content);
}

#[tokio::test]
async fn test_message_to_unknown_user_is_not_found() {
    let db = setup_test_db().await.expect("Failed to set up test database");
    let teacher = create_teacher(&db, "teacher1").await;
    let app = create_test_app(Arc::new(db));

    let response = app
        .oneshot(create_authorized_request(
            http::Method::POST,
            "/api/messages",
            &create_test_token(&teacher),
            json_body(json!({ "receiver": Uuid::new_v4(), "content": "Hello" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_conversation_excludes_other_users() {
    let db = setup_test_db().await.expect("Failed to set up test database");
    let alice = create_teacher(&db, "alice").await;
    let bob = create_teacher(&db, "bob").await;
    let carol = create_teacher(&db, "carol").await;
    let app = create_test_app(Arc::new(db));

    for (from, to) in [(&alice, &bob), (&carol, &bob), (&bob, &alice)] {
        let response = app
            .clone()
            .oneshot(create_authorized_request(
                http::Method::POST,
                "/api/messages",
                &create_test_token(from),
                json_body(json!({ "receiver": to.id, "content": "ping" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(create_authorized_request(
            http::Method::GET,
            &format!("/api/messages?with_user={}", alice.id),
            &create_test_token(&bob),
            Body::empty(),
        ))
        .await
        .unwrap();
    let messages: Vec<Value> = parse_json(response.into_body()).await;
    assert_eq!(messages.len(), 2);
}

#[tokio::test]
async fn test_notification_owner_marks_read() {
    // Setup
    let db = setup_test_db().await.expect("Failed to set up test database");
    let admin = create_admin(&db, "admin").await;
    let teacher = create_teacher(&db, "teacher1").await;
    let other = create_teacher(&db, "teacher2").await;
    let app = create_test_app(Arc::new(db));

    // Admin notifies the teacher
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::POST,
            "/api/notifications",
            &create_test_token(&admin),
            json_body(json!({
                "user": teacher.id,
                "title": "Exam room changed",
                "message": "Room B12",
                "notification_type": "EXAM"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let notification: Value = parse_json(response.into_body()).await;
    let uri = format!("/api/notifications/{}/read", notification["id"].as_str().unwrap());

    // Someone else's notification looks missing
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::POST,
            &uri,
            &create_test_token(&other),
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The owner marks it read
    let token = create_test_token(&teacher);
    let response = app
        .clone()
        .oneshot(create_authorized_request(http::Method::POST, &uri, &token, Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(create_authorized_request(
            http::Method::GET,
            "/api/notifications",
            &token,
            Body::empty(),
        ))
        .await
        .unwrap();
    let notifications: Vec<Value> = parse_json(response.into_body()).await;
    assert_eq!(notifications[0]["is_read"], true);
}

#[tokio::test]
async fn test_only_admin_creates_notifications() {
    let db = setup_test_db().await.expect("Failed to set up test database");
    let teacher = create_teacher(&db, "teacher1").await;
    let app = create_test_app(Arc::new(db));

    let response = app
        .oneshot(create_authorized_request(
            http::Method::POST,
            "/api/notifications",
            &create_test_token(&teacher),
            json_body(json!({
                "user": teacher.id,
                "title": "Hi",
                "message": "Hello",
                "notification_type": "INFO"
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
