use axum::{
    body::Body,
    http::{self, StatusCode},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

mod common;
use common::*;

use campus_records::{entities::user::UserRole, services::user_service};

#[tokio::test]
async fn test_admin_manages_courses() {
    // Setup
    let db = setup_test_db().await.expect("Failed to set up test database");
    let admin = create_admin(&db, "admin").await;
    let app = create_test_app(Arc::new(db));
    let token = create_test_token(&admin);

    // Create
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::POST,
            "/api/courses",
            &token,
            json_body(json!({ "code": "DAM301", "name": "Mobile Development", "credits": 4 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let course: Value = parse_json(response.into_body()).await;
    let uri = format!("/api/courses/{}", course["id"].as_str().unwrap());

    // Duplicate code
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::POST,
            "/api/courses",
            &token,
            json_body(json!({ "code": "DAM301", "name": "Copy" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Update
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::PUT,
            &uri,
            &token,
            json_body(json!({ "credits": 6 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = parse_json(response.into_body()).await;
    assert_eq!(updated["credits"], 6);
    assert_eq!(updated["code"], "DAM301");

    // Delete
    let response = app
        .clone()
        .oneshot(create_authorized_request(http::Method::DELETE, &uri, &token, Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(create_authorized_request(http::Method::GET, &uri, &token, Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_teacher_cannot_create_course() {
    let db = setup_test_db().await.expect("Failed to set up test database");
    let teacher = create_teacher(&db, "teacher1").await;
    let app = create_test_app(Arc::new(db));

    let response = app
        .oneshot(create_authorized_request(
            http::Method::POST,
            "/api/courses",
            &create_test_token(&teacher),
            json_body(json!({ "code": "CS101", "name": "Intro" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_assignment_rules() {
    // Setup
    let db = setup_test_db().await.expect("Failed to set up test database");
    let admin = create_admin(&db, "admin").await;
    let teacher = create_teacher(&db, "teacher1").await;
    let group = create_test_group(&db, "G1").await;
    let course = create_test_course(&db, "CS101").await;
    let student = create_student_in_group(&db, "student1", &group).await;
    let app = create_test_app(Arc::new(db));
    let token = create_test_token(&admin);
    let assign = |teacher_id| {
        json_body(json!({
            "teacher_id": teacher_id,
            "course_id": course.id,
            "group_id": group.id,
            "academic_year": "2024-2025"
        }))
    };

    // A student cannot be assigned as teacher
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::POST,
            "/api/admin/assignments",
            &token,
            assign(student.id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::POST,
            "/api/admin/assignments",
            &token,
            assign(teacher.id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let assignment: Value = parse_json(response.into_body()).await;
    assert_eq!(assignment["course_code"], "CS101");

    // Same course, group and year again
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::POST,
            "/api/admin/assignments",
            &token,
            assign(teacher.id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The teacher and the group's students see the assignment
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::GET,
            "/api/courses/my-courses",
            &create_test_token(&teacher),
            Body::empty(),
        ))
        .await
        .unwrap();
    let taught: Vec<Value> = parse_json(response.into_body()).await;
    assert_eq!(taught.len(), 1);

    let response = app
        .oneshot(create_authorized_request(
            http::Method::GET,
            "/api/courses/student-courses",
            &create_test_token(&student),
            Body::empty(),
        ))
        .await
        .unwrap();
    let followed: Vec<Value> = parse_json(response.into_body()).await;
    assert_eq!(followed.len(), 1);
    assert_eq!(followed[0]["group_name"], "G1");
}

#[tokio::test]
async fn test_group_listing_and_deletion() {
    // Setup
    let db = setup_test_db().await.expect("Failed to set up test database");
    let admin = create_admin(&db, "admin").await;
    let teacher = create_teacher(&db, "teacher1").await;
    let group = create_test_group(&db, "G1").await;
    let course = create_test_course(&db, "CS101").await;
    let student = create_student_in_group(&db, "student1", &group).await;
    create_test_assignment(&db, &teacher, &course, &group).await;
    let db = Arc::new(db);
    let app = create_test_app(db.clone());
    let token = create_test_token(&admin);

    // Link the course to the group
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::POST,
            "/api/courses/assign-to-group",
            &token,
            json_body(json!({ "course_id": course.id, "group_id": group.id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::GET,
            &format!("/api/groups/{}", group.id),
            &token,
            Body::empty(),
        ))
        .await
        .unwrap();
    let listed: Value = parse_json(response.into_body()).await;
    assert_eq!(listed["student_count"], 1);
    assert_eq!(listed["courses"].as_array().unwrap().len(), 1);

    // Delete the group
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::DELETE,
            &format!("/api/groups/{}", group.id),
            &token,
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The student stays without a group; the assignment is gone
    let student = user_service::find_with_role(db.as_ref(), student.id, UserRole::Student)
        .await
        .unwrap();
    assert_eq!(student.group_id, None);

    let response = app
        .oneshot(create_authorized_request(
            http::Method::GET,
            "/api/admin/assignments",
            &token,
            Body::empty(),
        ))
        .await
        .unwrap();
    let assignments: Vec<Value> = parse_json(response.into_body()).await;
    assert!(assignments.is_empty());
}

#[tokio::test]
async fn test_assign_student_to_group() {
    let db = setup_test_db().await.expect("Failed to set up test database");
    let admin = create_admin(&db, "admin").await;
    let group = create_test_group(&db, "G2").await;
    let student = create_test_user(&db, "student1", UserRole::Student, true)
        .await
        .unwrap();
    let teacher = create_teacher(&db, "teacher1").await;
    let app = create_test_app(Arc::new(db));
    let token = create_test_token(&admin);

    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::POST,
            "/api/admin/assign-group",
            &token,
            json_body(json!({ "student_id": student.id, "group_id": group.id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Only students can join a group
    let response = app
        .oneshot(create_authorized_request(
            http::Method::POST,
            "/api/admin/assign-group",
            &token,
            json_body(json!({ "student_id": teacher.id, "group_id": group.id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
