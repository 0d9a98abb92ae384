use axum::{
    body::Body,
    http::{self, StatusCode},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

mod common;
use common::*;

use campus_records::entities::user::UserRole;

fn file_body(course: uuid::Uuid, title: &str) -> String {
    json_body(json!({
        "course": course,
        "title": title,
        "file_path": format!("files/{}.pdf", title),
        "file_type": "LECTURE"
    }))
}

#[tokio::test]
async fn test_course_files_follow_groups_and_uploader() {
    // Setup
    let db = setup_test_db().await.expect("Failed to set up test database");
    let group = create_test_group(&db, "G1").await;
    let other_group = create_test_group(&db, "G2").await;
    let course = create_test_course(&db, "CS101").await;
    let teacher = create_teacher(&db, "teacher1").await;
    let outsider = create_teacher(&db, "teacher2").await;
    let student = create_student_in_group(&db, "student1", &group).await;
    let stranger = create_student_in_group(&db, "student2", &other_group).await;
    create_test_assignment(&db, &teacher, &course, &group).await;
    let app = create_test_app(Arc::new(db));

    // Any signed-in account can add a file, and is recorded as its uploader
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::POST,
            "/api/files",
            &create_test_token(&student),
            json_body(json!({
                "course": course.id,
                "title": "summary",
                "file_path": "files/summary.pdf",
                "file_type": "OTHER",
                "uploaded_by": teacher.id
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let shared: Value = parse_json(response.into_body()).await;
    assert_eq!(shared["uploaded_by"], student.id.to_string());
    assert_eq!(shared["uploaded_by_name"], "Test student1");

    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::POST,
            "/api/files",
            &create_test_token(&teacher),
            file_body(course.id, "week1"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let file: Value = parse_json(response.into_body()).await;
    assert_eq!(file["uploaded_by"], teacher.id.to_string());
    assert_eq!(file["course_code"], "CS101");
    let uri = format!("/api/files/{}", file["id"].as_str().unwrap());

    // Students of the group see it, others do not
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::GET,
            "/api/files",
            &create_test_token(&student),
            Body::empty(),
        ))
        .await
        .unwrap();
    let files: Vec<Value> = parse_json(response.into_body()).await;
    assert_eq!(files.len(), 2);

    // Out of scope reads the same as missing
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::GET,
            &uri,
            &create_test_token(&stranger),
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let hidden: Value = parse_json(response.into_body()).await;

    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::GET,
            &format!("/api/files/{}", uuid::Uuid::new_v4()),
            &create_test_token(&stranger),
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let missing: Value = parse_json(response.into_body()).await;
    assert_eq!(hidden, missing);

    // Only the uploader or an admin deletes
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::DELETE,
            &uri,
            &create_test_token(&outsider),
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(create_authorized_request(
            http::Method::DELETE,
            &uri,
            &create_test_token(&teacher),
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_timetables_per_group() {
    // Setup
    let db = setup_test_db().await.expect("Failed to set up test database");
    let admin = create_admin(&db, "admin").await;
    let group = create_test_group(&db, "G1").await;
    let student = create_student_in_group(&db, "student1", &group).await;
    let loner = create_test_user(&db, "student2", UserRole::Student, true)
        .await
        .unwrap();
    let app = create_test_app(Arc::new(db));

    // No timetable yet
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::GET,
            "/api/timetables/my-timetable",
            &create_test_token(&student),
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = parse_json(response.into_body()).await;
    assert_eq!(body["message"], "No timetable available for your group");

    // Admin publishes one
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::POST,
            "/api/timetables",
            &create_test_token(&admin),
            json_body(json!({
                "group": group.id,
                "title": "Spring",
                "image_path": "timetables/g1.png",
                "semester": "S2",
                "academic_year": "2024-2025"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::GET,
            "/api/timetables/my-timetable",
            &create_test_token(&student),
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let timetable: Value = parse_json(response.into_body()).await;
    assert_eq!(timetable["title"], "Spring");
    assert_eq!(timetable["group_name"], "G1");

    // A student without a group
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::GET,
            "/api/timetables/my-timetable",
            &create_test_token(&loner),
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = parse_json(response.into_body()).await;
    assert_eq!(body["message"], "You are not assigned to any group yet");

    let response = app
        .oneshot(create_authorized_request(
            http::Method::GET,
            "/api/timetables",
            &create_test_token(&loner),
            Body::empty(),
        ))
        .await
        .unwrap();
    let timetables: Vec<Value> = parse_json(response.into_body()).await;
    assert!(timetables.is_empty());
}

#[tokio::test]
async fn test_schedule_sessions() {
    // Setup
    let db = setup_test_db().await.expect("Failed to set up test database");
    let admin = create_admin(&db, "admin").await;
    let group = create_test_group(&db, "G1").await;
    let course = create_test_course(&db, "CS101").await;
    let teacher = create_teacher(&db, "teacher1").await;
    let student = create_student_in_group(&db, "student1", &group).await;
    let assignment = create_test_assignment(&db, &teacher, &course, &group).await;
    let app = create_test_app(Arc::new(db));
    let token = create_test_token(&admin);
    let session = |day: &str, start: &str, end: &str| {
        json_body(json!({
            "assignment_id": assignment.id,
            "day": day,
            "start_time": start,
            "end_time": end,
            "room": "A1",
            "session_type": "LECTURE"
        }))
    };

    // End before start
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::POST,
            "/api/schedule",
            &token,
            session("MONDAY", "10:00:00", "08:00:00"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    for (day, start, end) in [
        ("WEDNESDAY", "08:00:00", "10:00:00"),
        ("MONDAY", "14:00:00", "16:00:00"),
        ("MONDAY", "08:30:00", "10:00:00"),
    ] {
        let response = app
            .clone()
            .oneshot(create_authorized_request(
                http::Method::POST,
                "/api/schedule",
                &token,
                session(day, start, end),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    // Students see their group's week in order
    let response = app
        .oneshot(create_authorized_request(
            http::Method::GET,
            "/api/schedule/my-schedule",
            &create_test_token(&student),
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let sessions: Vec<Value> = parse_json(response.into_body()).await;
    let order: Vec<(String, String)> = sessions
        .iter()
        .map(|s| {
            (
                s["day"].as_str().unwrap().to_string(),
                s["start_time"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        order,
        vec![
            ("MONDAY".to_string(), "08:30:00".to_string()),
            ("MONDAY".to_string(), "14:00:00".to_string()),
            ("WEDNESDAY".to_string(), "08:00:00".to_string()),
        ]
    );
    assert_eq!(sessions[0]["teacher_name"], "Test teacher1");
}
