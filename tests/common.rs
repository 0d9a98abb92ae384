#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{self, Request},
    Router,
};
use chrono::Utc;
use dotenvy::dotenv;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, DbErr, Set};
use serde_json::Value;
use std::{env, sync::Arc};
use uuid::Uuid;

use campus_records::{
    app_router,
    auth::{
        caller::Caller,
        jwt::{self, TokenType},
        password,
    },
    entities::{
        course, course_assignment, group,
        user::{self, Model as UserModel, UserRole},
    },
};

// Define a constant for the body size limit (16MB)
const BODY_SIZE_LIMIT: usize = 16 * 1024 * 1024;

pub const TEST_PASSWORD: &str = "password123";

/// Sets up the JWT_SECRET environment variable for tests
pub fn setup_jwt_secret() {
    env::set_var("JWT_SECRET", "test_secret_for_tests");
}

/// Creates an in-memory SQLite database for testing
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    dotenv().ok();
    setup_jwt_secret();
    let db = Database::connect("sqlite::memory:").await?;
    campus_records::db::ensure_schema_exists(&db).await?;
    Ok(db)
}

/// Creates the full application router for testing
pub fn create_test_app(db: Arc<DatabaseConnection>) -> Router {
    app_router(db, None)
}

/// Creates a test user in the database. Students get a student id; only
/// `approved` students can log in.
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    role: UserRole,
    approved: bool,
) -> Result<UserModel, DbErr> {
    let now = Utc::now();
    let user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(format!("{}@example.com", username)),
        password_hash: Set(password::hash_password(TEST_PASSWORD).unwrap()),
        first_name: Set("Test".to_string()),
        last_name: Set(username.to_string()),
        role: Set(role),
        student_id: Set((role == UserRole::Student).then(|| format!("S-{}", username))),
        program: Set(None),
        semester: Set(None),
        birth_date: Set(None),
        phone: Set(String::new()),
        address: Set(String::new()),
        profile_picture: Set(None),
        is_approved: Set(approved),
        rejection_reason: Set(None),
        group_id: Set(None),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    user.insert(db).await
}

pub async fn create_admin(db: &DatabaseConnection, username: &str) -> UserModel {
    create_test_user(db, username, UserRole::Admin, true).await.unwrap()
}

pub async fn create_teacher(db: &DatabaseConnection, username: &str) -> UserModel {
    create_test_user(db, username, UserRole::Teacher, true).await.unwrap()
}

/// Approved student placed in `group`.
pub async fn create_student_in_group(
    db: &DatabaseConnection,
    username: &str,
    group: &group::Model,
) -> UserModel {
    let student = create_test_user(db, username, UserRole::Student, true)
        .await
        .unwrap();
    let mut model: user::ActiveModel = student.into();
    model.group_id = Set(Some(group.id));
    model.update(db).await.unwrap()
}

pub async fn create_test_group(db: &DatabaseConnection, name: &str) -> group::Model {
    group::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        academic_year: Set("2024-2025".to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_test_course(db: &DatabaseConnection, code: &str) -> course::Model {
    course::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(code.to_string()),
        name: Set(format!("Course {}", code)),
        description: Set(String::new()),
        credits: Set(3),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_test_assignment(
    db: &DatabaseConnection,
    teacher: &UserModel,
    course: &course::Model,
    group: &group::Model,
) -> course_assignment::Model {
    course_assignment::ActiveModel {
        id: Set(Uuid::new_v4()),
        teacher_id: Set(teacher.id),
        course_id: Set(course.id),
        group_id: Set(group.id),
        academic_year: Set("2024-2025".to_string()),
    }
    .insert(db)
    .await
    .unwrap()
}

/// Creates an access token for testing
pub fn create_test_token(user: &UserModel) -> String {
    setup_jwt_secret();
    jwt::create_token(user.id, &user.username, user.role, TokenType::Access)
        .expect("Failed to create test token")
}

pub fn caller_of(user: &UserModel) -> Caller {
    Caller::from(user)
}

/// Creates a test request with authorization header
pub fn create_authorized_request<B>(
    method: http::Method,
    uri: &str,
    token: &str,
    body: B,
) -> Request<Body>
where
    B: Into<Body>,
{
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .header(http::header::AUTHORIZATION, format!("Bearer {}", token))
        .body(body.into())
        .unwrap()
}

/// Creates a test request without authorization
pub fn create_request<B>(method: http::Method, uri: &str, body: B) -> Request<Body>
where
    B: Into<Body>,
{
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .body(body.into())
        .unwrap()
}

pub fn json_body(value: Value) -> String {
    value.to_string()
}

/// Helper to parse response body as JSON
pub async fn parse_json<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = to_bytes(body, BODY_SIZE_LIMIT).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
