use axum::{
    body::Body,
    http::{self, Request, StatusCode},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

mod common;
use common::*;

use campus_records::entities::user::UserRole;

fn registration_body(username: &str) -> String {
    json_body(json!({
        "username": username,
        "email": format!("{}@example.com", username),
        "password": TEST_PASSWORD,
        "password2": TEST_PASSWORD,
        "first_name": "Jane",
        "last_name": "Doe",
        "student_id": format!("S-{}", username),
        "role": "ADMIN"
    }))
}

fn login_body(username: &str) -> String {
    json_body(json!({ "username": username, "password": TEST_PASSWORD }))
}

async fn register(app: &axum::Router, username: &str) -> Value {
    let response = app
        .clone()
        .oneshot(create_request(
            http::Method::POST,
            "/api/auth/register",
            registration_body(username),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    parse_json(response.into_body()).await
}

#[tokio::test]
async fn test_registration_creates_pending_student() {
    // Setup
    let db = setup_test_db().await.expect("Failed to set up test database");
    let app = create_test_app(Arc::new(db));

    // Send request
    let body = register(&app, "jane").await;

    // Assert response
    assert_eq!(body["user"]["role"], "STUDENT");
    assert_eq!(body["user"]["is_approved"], false);
    assert!(body["user"]["rejection_reason"].is_null());
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_pending_student_cannot_log_in() {
    let db = setup_test_db().await.expect("Failed to set up test database");
    let app = create_test_app(Arc::new(db));
    register(&app, "jane").await;

    let response = app
        .oneshot(create_request(http::Method::POST, "/api/auth/login", login_body("jane")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = parse_json(response.into_body()).await;
    assert_eq!(body["message"], "Account pending approval");
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let db = setup_test_db().await.expect("Failed to set up test database");
    create_teacher(&db, "teacher1").await;
    let app = create_test_app(Arc::new(db));

    let response = app
        .oneshot(create_request(
            http::Method::POST,
            "/api/auth/login",
            json_body(json!({ "username": "teacher1", "password": "wrong-password" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_approved_student_can_log_in_and_refresh() {
    // Setup
    let db = setup_test_db().await.expect("Failed to set up test database");
    let admin = create_admin(&db, "admin").await;
    let app = create_test_app(Arc::new(db));
    let registered = register(&app, "jane").await;
    let student_id = registered["user"]["id"].as_str().unwrap().to_string();

    // Approve
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::POST,
            &format!("/api/admin/approve-student/{}", student_id),
            &create_test_token(&admin),
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = parse_json(response.into_body()).await;
    assert_eq!(body["message"], "Student approved successfully");
    assert_eq!(body["user"]["is_approved"], true);

    // Login
    let response = app
        .clone()
        .oneshot(create_request(http::Method::POST, "/api/auth/login", login_body("jane")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let tokens: Value = parse_json(response.into_body()).await;
    assert_eq!(tokens["user"]["username"], "jane");

    // Refresh
    let response = app
        .clone()
        .oneshot(create_request(
            http::Method::POST,
            "/api/auth/refresh",
            json_body(json!({ "refresh": tokens["refresh"] })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let refreshed: Value = parse_json(response.into_body()).await;

    // The new access token reaches protected routes
    let response = app
        .oneshot(create_authorized_request(
            http::Method::GET,
            "/api/auth/profile",
            refreshed["access"].as_str().unwrap(),
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_access_token_cannot_refresh() {
    let db = setup_test_db().await.expect("Failed to set up test database");
    let teacher = create_teacher(&db, "teacher1").await;
    let app = create_test_app(Arc::new(db));

    let response = app
        .oneshot(create_request(
            http::Method::POST,
            "/api/auth/refresh",
            json_body(json!({ "refresh": create_test_token(&teacher) })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reject_without_body_uses_default_reason() {
    // Setup
    let db = setup_test_db().await.expect("Failed to set up test database");
    let admin = create_admin(&db, "admin").await;
    let app = create_test_app(Arc::new(db));
    let registered = register(&app, "jane").await;
    let student_id = registered["user"]["id"].as_str().unwrap().to_string();

    // Send request without a body
    let request = Request::builder()
        .method(http::Method::POST)
        .uri(format!("/api/admin/reject-student/{}", student_id))
        .header(
            http::header::AUTHORIZATION,
            format!("Bearer {}", create_test_token(&admin)),
        )
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    // Assert response
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = parse_json(response.into_body()).await;
    assert_eq!(body["message"], "Student rejected");
    assert_eq!(body["reason"], "Requirements not met");

    // Rejected accounts still cannot log in
    let response = app
        .oneshot(create_request(http::Method::POST, "/api/auth/login", login_body("jane")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_approving_rejected_student_clears_reason() {
    let db = setup_test_db().await.expect("Failed to set up test database");
    let admin = create_admin(&db, "admin").await;
    let token = create_test_token(&admin);
    let app = create_test_app(Arc::new(db));
    let registered = register(&app, "jane").await;
    let student_id = registered["user"]["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::POST,
            &format!("/api/admin/reject-student/{}", student_id),
            &token,
            json_body(json!({ "reason": "Missing transcript" })),
        ))
        .await
        .unwrap();
    let body: Value = parse_json(response.into_body()).await;
    assert_eq!(body["reason"], "Missing transcript");

    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::POST,
            &format!("/api/admin/approve-student/{}", student_id),
            &token,
            Body::empty(),
        ))
        .await
        .unwrap();
    let body: Value = parse_json(response.into_body()).await;
    assert_eq!(body["user"]["is_approved"], true);
    assert!(body["user"]["rejection_reason"].is_null());

    let response = app
        .oneshot(create_request(http::Method::POST, "/api/auth/login", login_body("jane")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let db = setup_test_db().await.expect("Failed to set up test database");
    let app = create_test_app(Arc::new(db));
    register(&app, "jane").await;

    let response = app
        .oneshot(create_request(
            http::Method::POST,
            "/api/auth/register",
            registration_body("jane"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_mismatched_passwords_are_rejected() {
    let db = setup_test_db().await.expect("Failed to set up test database");
    let app = create_test_app(Arc::new(db));

    let response = app
        .oneshot(create_request(
            http::Method::POST,
            "/api/auth/register",
            json_body(json!({
                "username": "jane",
                "email": "jane@example.com",
                "password": TEST_PASSWORD,
                "password2": "something-else"
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pending_list_is_admin_only() {
    let db = setup_test_db().await.expect("Failed to set up test database");
    let admin = create_admin(&db, "admin").await;
    let teacher = create_teacher(&db, "teacher1").await;
    create_test_user(&db, "pending1", UserRole::Student, false)
        .await
        .unwrap();
    create_test_user(&db, "approved1", UserRole::Student, true)
        .await
        .unwrap();
    let app = create_test_app(Arc::new(db));

    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::GET,
            "/api/admin/pending-students",
            &create_test_token(&teacher),
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(create_authorized_request(
            http::Method::GET,
            "/api/admin/pending-students",
            &create_test_token(&admin),
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let pending: Vec<Value> = parse_json(response.into_body()).await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["username"], "pending1");
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let db = setup_test_db().await.expect("Failed to set up test database");
    let app = create_test_app(Arc::new(db));

    let response = app
        .oneshot(create_request(http::Method::GET, "/api/auth/profile", Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rejected_student_token_stops_working() {
    // Setup
    let db = setup_test_db().await.expect("Failed to set up test database");
    let admin = create_admin(&db, "admin").await;
    let teacher = create_teacher(&db, "teacher1").await;
    let student = create_test_user(&db, "student1", UserRole::Student, true)
        .await
        .unwrap();
    let student_token = create_test_token(&student);
    let app = create_test_app(Arc::new(db));

    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::GET,
            "/api/files",
            &student_token,
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Admin rejects the account after the token was issued
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::POST,
            &format!("/api/admin/reject-student/{}", student.id),
            &create_test_token(&admin),
            json_body(json!({ "reason": "Duplicate account" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Send request with the earlier token
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::POST,
            "/api/messages",
            &student_token,
            json_body(json!({ "receiver": teacher.id, "content": "hello" })),
        ))
        .await
        .unwrap();

    // Assert response
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = parse_json(response.into_body()).await;
    assert_eq!(body["message"], "Account pending approval");

    let response = app
        .oneshot(create_authorized_request(
            http::Method::GET,
            "/api/files",
            &student_token,
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
