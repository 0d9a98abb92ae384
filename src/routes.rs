use axum::http::HeaderValue;
use axum::{
    middleware,
    routing::{get, post, put},
    Extension, Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_docs::ApiDoc;
use crate::auth::middleware::auth_middleware;
use crate::handlers::{
    admin_handler, attendance_handler, auth_handler, course_handler, file_handler, grade_handler,
    group_handler, message_handler, notification_handler, schedule_handler, timetable_handler,
    user_handler,
};

fn public_routes() -> Router {
    Router::new()
        .route("/api/auth/register", post(auth_handler::register))
        .route("/api/auth/login", post(auth_handler::login))
        .route("/api/auth/refresh", post(auth_handler::refresh))
}

fn protected_routes() -> Router {
    Router::new()
        .route("/api/auth/logout", post(auth_handler::logout))
        .route(
            "/api/auth/profile",
            get(auth_handler::get_profile).put(auth_handler::update_profile),
        )
        .route("/api/users/search", get(user_handler::search_users))
        .route(
            "/api/users/{id}",
            get(user_handler::get_user).put(user_handler::update_user),
        )
        // Admin
        .route("/api/admin/pending-students", get(admin_handler::pending_students))
        .route("/api/admin/approve-student/{id}", post(admin_handler::approve_student))
        .route("/api/admin/reject-student/{id}", post(admin_handler::reject_student))
        .route("/api/admin/students", get(admin_handler::list_students))
        .route(
            "/api/admin/students/{id}",
            axum::routing::delete(admin_handler::delete_student),
        )
        .route("/api/admin/assign-group", post(admin_handler::assign_group))
        .route("/api/admin/teachers", get(admin_handler::list_teachers))
        .route("/api/admin/teachers/create", post(admin_handler::create_teacher))
        .route(
            "/api/admin/teachers/{id}",
            axum::routing::delete(admin_handler::delete_teacher),
        )
        .route(
            "/api/admin/assignments",
            get(admin_handler::list_assignments).post(admin_handler::create_assignment),
        )
        .route(
            "/api/admin/assignments/{id}",
            get(admin_handler::get_assignment)
                .put(admin_handler::update_assignment)
                .delete(admin_handler::delete_assignment),
        )
        .route(
            "/api/admin/assignments/{id}/enroll",
            post(admin_handler::enroll_assignment),
        )
        // Courses and groups
        .route(
            "/api/courses",
            get(course_handler::list_courses).post(course_handler::create_course),
        )
        .route("/api/courses/my-courses", get(course_handler::my_courses))
        .route("/api/courses/student-courses", get(course_handler::student_courses))
        .route("/api/courses/assign-to-group", post(course_handler::assign_to_group))
        .route(
            "/api/courses/{id}",
            get(course_handler::get_course)
                .put(course_handler::update_course)
                .delete(course_handler::delete_course),
        )
        .route(
            "/api/groups",
            get(group_handler::list_groups).post(group_handler::create_group),
        )
        .route(
            "/api/groups/{id}",
            get(group_handler::get_group)
                .put(group_handler::update_group)
                .delete(group_handler::delete_group),
        )
        // Academic records
        .route(
            "/api/grades",
            get(grade_handler::list_grades).post(grade_handler::upsert_grade),
        )
        .route("/api/grades/my-grades", get(grade_handler::my_grades))
        .route("/api/grades/{id}", put(grade_handler::update_grade))
        .route(
            "/api/grades/course/{assignment_id}/students",
            get(grade_handler::course_roster),
        )
        .route(
            "/api/attendance",
            get(attendance_handler::list_attendance).post(attendance_handler::upsert_attendance),
        )
        .route("/api/attendance/bulk", post(attendance_handler::bulk_attendance))
        .route(
            "/api/attendance/my-attendance",
            get(attendance_handler::my_attendance),
        )
        .route(
            "/api/files",
            get(file_handler::list_files).post(file_handler::create_file),
        )
        .route(
            "/api/files/{id}",
            get(file_handler::get_file).delete(file_handler::delete_file),
        )
        .route(
            "/api/timetables",
            get(timetable_handler::list_timetables).post(timetable_handler::create_timetable),
        )
        .route("/api/timetables/my-timetable", get(timetable_handler::my_timetable))
        .route(
            "/api/timetables/{id}",
            get(timetable_handler::get_timetable)
                .put(timetable_handler::update_timetable)
                .delete(timetable_handler::delete_timetable),
        )
        .route(
            "/api/schedule",
            get(schedule_handler::list_sessions).post(schedule_handler::create_session),
        )
        .route("/api/schedule/my-schedule", get(schedule_handler::my_schedule))
        .route(
            "/api/schedule/{id}",
            get(schedule_handler::get_session)
                .put(schedule_handler::update_session)
                .delete(schedule_handler::delete_session),
        )
        // Interaction
        .route(
            "/api/messages",
            get(message_handler::list_messages).post(message_handler::send_message),
        )
        .route(
            "/api/notifications",
            get(notification_handler::list_notifications)
                .post(notification_handler::create_notification),
        )
        .route(
            "/api/notifications/{id}/read",
            post(notification_handler::mark_read),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

fn cors_layer(allow_origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match allow_origin.and_then(|origin| origin.parse::<HeaderValue>().ok()) {
        Some(origin) => layer.allow_origin(origin),
        None => layer.allow_origin(Any),
    }
}

/// Full application router. The database handle is shared through an
/// `Extension` so that handlers and the `Caller` extractor can reach it.
pub fn app_router(db: Arc<DatabaseConnection>, cors_allow_origin: Option<&str>) -> Router {
    Router::new()
        .route("/", get(|| async { "Campus records service" }))
        .merge(public_routes())
        .merge(protected_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors_layer(cors_allow_origin))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(db))
}
