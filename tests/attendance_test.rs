use axum::{
    body::Body,
    http::{self, StatusCode},
};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

mod common;
use common::*;

use campus_records::{
    entities::{
        attendance::{AttendanceRequest, AttendanceStatus, SkipReason},
        prelude::Attendance,
    },
    services::attendance_service,
    ApiError,
};

fn record(student: Uuid, course: Uuid, week_number: i32, status: AttendanceStatus) -> AttendanceRequest {
    AttendanceRequest {
        student,
        course,
        week_number,
        date: None,
        status,
        notes: String::new(),
    }
}

#[tokio::test]
async fn test_single_upsert_keeps_one_record_per_week() {
    let db = setup_test_db().await.expect("Failed to set up test database");
    let group = create_test_group(&db, "G1").await;
    let course = create_test_course(&db, "CS101").await;
    let teacher = create_teacher(&db, "teacher1").await;
    let student = create_student_in_group(&db, "student1", &group).await;
    create_test_assignment(&db, &teacher, &course, &group).await;
    let caller = caller_of(&teacher);

    attendance_service::upsert_attendance(
        &db,
        &caller,
        record(student.id, course.id, 3, AttendanceStatus::Absent),
    )
    .await
    .unwrap();
    let updated = attendance_service::upsert_attendance(
        &db,
        &caller,
        record(student.id, course.id, 3, AttendanceStatus::Late),
    )
    .await
    .unwrap();

    assert_eq!(updated.status, AttendanceStatus::Late);
    assert_eq!(Attendance::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_week_number_must_be_positive() {
    let db = setup_test_db().await.expect("Failed to set up test database");
    let group = create_test_group(&db, "G1").await;
    let course = create_test_course(&db, "CS101").await;
    let teacher = create_teacher(&db, "teacher1").await;
    let student = create_student_in_group(&db, "student1", &group).await;
    create_test_assignment(&db, &teacher, &course, &group).await;

    let result = attendance_service::upsert_attendance(
        &db,
        &caller_of(&teacher),
        record(student.id, course.id, 0, AttendanceStatus::Present),
    )
    .await;

    assert!(matches!(result, Err(ApiError::Validation(_))));
}

#[tokio::test]
async fn test_bulk_skips_records_of_untaught_courses() {
    // Setup
    let db = setup_test_db().await.expect("Failed to set up test database");
    let group = create_test_group(&db, "G1").await;
    let taught = create_test_course(&db, "CS101").await;
    let foreign = create_test_course(&db, "CS102").await;
    let teacher = create_teacher(&db, "teacher1").await;
    let colleague = create_teacher(&db, "teacher2").await;
    let student = create_student_in_group(&db, "student1", &group).await;
    create_test_assignment(&db, &teacher, &taught, &group).await;
    create_test_assignment(&db, &colleague, &foreign, &group).await;

    // Process a mixed batch
    let report = attendance_service::bulk_upsert(
        &db,
        &caller_of(&teacher),
        vec![
            record(student.id, taught.id, 1, AttendanceStatus::Present),
            record(student.id, foreign.id, 1, AttendanceStatus::Absent),
            record(Uuid::new_v4(), taught.id, 1, AttendanceStatus::Present),
            record(student.id, taught.id, -2, AttendanceStatus::Present),
            record(student.id, taught.id, 2, AttendanceStatus::Excused),
        ],
    )
    .await
    .unwrap();

    // Assert report
    assert_eq!(report.accepted.len(), 2);
    assert!(report.accepted.iter().all(|a| a.course == taught.id));
    let reasons: Vec<(usize, SkipReason)> = report
        .skipped
        .iter()
        .map(|s| (s.index, s.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            (1, SkipReason::NotTeacherOfCourse),
            (2, SkipReason::StudentNotFound),
            (3, SkipReason::InvalidWeekNumber),
        ]
    );
    assert_eq!(Attendance::find().count(&db).await.unwrap(), 2);
}

#[tokio::test]
async fn test_bulk_endpoint_report_mode() {
    // Setup
    let db = setup_test_db().await.expect("Failed to set up test database");
    let group = create_test_group(&db, "G1").await;
    let taught = create_test_course(&db, "CS101").await;
    let foreign = create_test_course(&db, "CS102").await;
    let teacher = create_teacher(&db, "teacher1").await;
    let student = create_student_in_group(&db, "student1", &group).await;
    create_test_assignment(&db, &teacher, &taught, &group).await;
    let app = create_test_app(Arc::new(db));
    let token = create_test_token(&teacher);
    let payload = json!({
        "attendance": [
            { "student": student.id, "course": taught.id, "week_number": 1, "status": "PRESENT" },
            { "student": student.id, "course": foreign.id, "week_number": 1, "status": "ABSENT" }
        ]
    });

    // Default response lists the accepted records
    let response = app
        .clone()
        .oneshot(create_authorized_request(
            http::Method::POST,
            "/api/attendance/bulk",
            &token,
            json_body(payload.clone()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let accepted: Vec<Value> = parse_json(response.into_body()).await;
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0]["course_code"], "CS101");

    // Report mode adds the skipped records
    let response = app
        .oneshot(create_authorized_request(
            http::Method::POST,
            "/api/attendance/bulk?report=true",
            &token,
            json_body(payload),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report: Value = parse_json(response.into_body()).await;
    assert_eq!(report["accepted"].as_array().unwrap().len(), 1);
    assert_eq!(report["skipped"][0]["index"], 1);
    assert_eq!(report["skipped"][0]["reason"], "not_teacher_of_course");
}

#[tokio::test]
async fn test_student_reads_own_attendance() {
    let db = setup_test_db().await.expect("Failed to set up test database");
    let group = create_test_group(&db, "G1").await;
    let course = create_test_course(&db, "CS101").await;
    let teacher = create_teacher(&db, "teacher1").await;
    let student = create_student_in_group(&db, "student1", &group).await;
    let classmate = create_student_in_group(&db, "student2", &group).await;
    create_test_assignment(&db, &teacher, &course, &group).await;
    for who in [&student, &classmate] {
        attendance_service::upsert_attendance(
            &db,
            &caller_of(&teacher),
            record(who.id, course.id, 1, AttendanceStatus::Present),
        )
        .await
        .unwrap();
    }
    let app = create_test_app(Arc::new(db));

    let response = app
        .oneshot(create_authorized_request(
            http::Method::GET,
            "/api/attendance/my-attendance",
            &create_test_token(&student),
            Body::empty(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let records: Vec<Value> = parse_json(response.into_body()).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["student"], student.id.to_string());
}
