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

use campus_records::{
    entities::user::{UpdateUserRequest, UserRole},
    services::user_service,
    ApiError,
};

#[tokio::test]
async fn test_get_profile() {
    // Setup
    let db = setup_test_db().await.expect("Failed to set up test database");
    let group = create_test_group(&db, "G1").await;
    let student = create_student_in_group(&db, "student1", &group).await;
    let app = create_test_app(Arc::new(db));

    // Send request
    let response = app
        .oneshot(create_authorized_request(
            http::Method::GET,
            "/api/auth/profile",
            &create_test_token(&student),
            Body::empty(),
        ))
        .await
        .unwrap();

    // Assert response
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = parse_json(response.into_body()).await;
    assert_eq!(body["username"], "student1");
    assert_eq!(body["role"], "STUDENT");
    assert_eq!(body["group_name"], "G1");
}

#[tokio::test]
async fn test_update_own_profile() {
    let db = setup_test_db().await.expect("Failed to set up test database");
    let teacher = create_teacher(&db, "teacher1").await;
    let app = create_test_app(Arc::new(db));

    let response = app
        .oneshot(create_authorized_request(
            http::Method::PUT,
            "/api/auth/profile",
            &create_test_token(&teacher),
            json_body(json!({ "phone": "0600000000", "first_name": "Ada" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = parse_json(response.into_body()).await;
    assert_eq!(body["phone"], "0600000000");
    assert_eq!(body["first_name"], "Ada");
}

#[tokio::test]
async fn test_cannot_update_someone_else() {
    let db = setup_test_db().await.expect("Failed to set up test database");
    let teacher = create_teacher(&db, "teacher1").await;
    let other = create_teacher(&db, "teacher2").await;
    let app = create_test_app(Arc::new(db));

    let response = app
        .oneshot(create_authorized_request(
            http::Method::PUT,
            &format!("/api/users/{}", other.id),
            &create_test_token(&teacher),
            json_body(json!({ "phone": "0600000000" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_academic_fields_need_admin() {
    let db = setup_test_db().await.expect("Failed to set up test database");
    let admin = create_admin(&db, "admin").await;
    let student = create_test_user(&db, "student1", UserRole::Student, true)
        .await
        .unwrap();

    // The student's own change to the program is ignored
    let updated = user_service::update_user(
        &db,
        &caller_of(&student),
        student.id,
        UpdateUserRequest {
            program: Some("Physics".to_string()),
            address: Some("1 Main Street".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.program, None);
    assert_eq!(updated.address, "1 Main Street");

    // An admin's is applied
    let updated = user_service::update_user(
        &db,
        &caller_of(&admin),
        student.id,
        UpdateUserRequest {
            program: Some("Physics".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.program.as_deref(), Some("Physics"));
}

#[tokio::test]
async fn test_get_missing_user() {
    let db = setup_test_db().await.expect("Failed to set up test database");
    let teacher = create_teacher(&db, "teacher1").await;
    let app = create_test_app(Arc::new(db));

    let response = app
        .oneshot(create_authorized_request(
            http::Method::GET,
            &format!("/api/users/{}", Uuid::new_v4()),
            &create_test_token(&teacher),
            Body::empty(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_hides_pending_students_and_self() {
    let db = setup_test_db().await.expect("Failed to set up test database");
    let teacher = create_teacher(&db, "teacher1").await;
    create_teacher(&db, "teacher2").await;
    create_test_user(&db, "student1", UserRole::Student, true)
        .await
        .unwrap();
    create_test_user(&db, "student2", UserRole::Student, false)
        .await
        .unwrap();

    let found = user_service::search_users(&db, &caller_of(&teacher), None)
        .await
        .unwrap();
    let names: Vec<&str> = found.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["student1", "teacher2"]);

    let found = user_service::search_users(&db, &caller_of(&teacher), Some("student"))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn test_admin_creates_and_deletes_teacher() {
    // Setup
    let db = setup_test_db().await.expect("Failed to set up test database");
    let admin = create_admin(&db, "admin").await;
    let db = Arc::new(db);
    let app = create_test_app(db.clone());
    let token = create_test_token(&admin);

    // Create
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::POST,
            "/api/admin/teachers/create",
            &token,
            json_body(json!({
                "username": "newteacher",
                "email": "newteacher@example.com",
                "password": TEST_PASSWORD
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = parse_json(response.into_body()).await;
    assert_eq!(body["user"]["role"], "TEACHER");
    let teacher_id: Uuid = body["user"]["id"].as_str().unwrap().parse().unwrap();

    // The new teacher can log in right away
    let response = app
        .clone()
        .oneshot(create_request(
            http::Method::POST,
            "/api/auth/login",
            json_body(json!({ "username": "newteacher", "password": TEST_PASSWORD })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Delete
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::DELETE,
            &format!("/api/admin/teachers/{}", teacher_id),
            &token,
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let result =
        user_service::find_with_role(db.as_ref(), teacher_id, UserRole::Teacher).await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));

    // A student id is not a teacher id
    let student = create_test_user(db.as_ref(), "student1", UserRole::Student, true)
        .await
        .unwrap();
    let response = app
        .oneshot(create_authorized_request(
            http::Method::DELETE,
            &format!("/api/admin/teachers/{}", student.id),
            &token,
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleted_account_token_is_rejected() {
    let db = setup_test_db().await.expect("Failed to set up test database");
    let teacher = create_teacher(&db, "teacher1").await;
    let token = create_test_token(&teacher);
    user_service::delete_user_with_role(&db, teacher.id, UserRole::Teacher)
        .await
        .unwrap();
    let app = create_test_app(Arc::new(db));

    let response = app
        .oneshot(create_authorized_request(
            http::Method::GET,
            "/api/auth/profile",
            &token,
            Body::empty(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
