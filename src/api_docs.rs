use serde::{Deserialize, Serialize};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use crate::entities::user::UserDTO;

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

/// Plain acknowledgement
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Acknowledgement carrying the affected account
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserActionResponse {
    pub message: String,
    pub user: UserDTO,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RejectionResponse {
    pub message: String,
    pub reason: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::auth_handler::register,
        crate::handlers::auth_handler::login,
        crate::handlers::auth_handler::refresh,
        crate::handlers::auth_handler::logout,
        crate::handlers::auth_handler::get_profile,
        crate::handlers::auth_handler::update_profile,
        crate::handlers::user_handler::search_users,
        crate::handlers::user_handler::get_user,
        crate::handlers::user_handler::update_user,
        crate::handlers::admin_handler::pending_students,
        crate::handlers::admin_handler::approve_student,
        crate::handlers::admin_handler::reject_student,
        crate::handlers::admin_handler::list_students,
        crate::handlers::admin_handler::delete_student,
        crate::handlers::admin_handler::assign_group,
        crate::handlers::admin_handler::list_teachers,
        crate::handlers::admin_handler::create_teacher,
        crate::handlers::admin_handler::delete_teacher,
        crate::handlers::admin_handler::list_assignments,
        crate::handlers::admin_handler::create_assignment,
        crate::handlers::admin_handler::get_assignment,
        crate::handlers::admin_handler::update_assignment,
        crate::handlers::admin_handler::delete_assignment,
        crate::handlers::admin_handler::enroll_assignment,
        crate::handlers::course_handler::list_courses,
        crate::handlers::course_handler::create_course,
        crate::handlers::course_handler::get_course,
        crate::handlers::course_handler::update_course,
        crate::handlers::course_handler::delete_course,
        crate::handlers::course_handler::my_courses,
        crate::handlers::course_handler::student_courses,
        crate::handlers::course_handler::assign_to_group,
        crate::handlers::group_handler::list_groups,
        crate::handlers::group_handler::create_group,
        crate::handlers::group_handler::get_group,
        crate::handlers::group_handler::update_group,
        crate::handlers::group_handler::delete_group,
        crate::handlers::grade_handler::list_grades,
        crate::handlers::grade_handler::upsert_grade,
        crate::handlers::grade_handler::update_grade,
        crate::handlers::grade_handler::my_grades,
        crate::handlers::grade_handler::course_roster,
        crate::handlers::attendance_handler::list_attendance,
        crate::handlers::attendance_handler::upsert_attendance,
        crate::handlers::attendance_handler::bulk_attendance,
        crate::handlers::attendance_handler::my_attendance,
        crate::handlers::file_handler::list_files,
        crate::handlers::file_handler::create_file,
        crate::handlers::file_handler::get_file,
        crate::handlers::file_handler::delete_file,
        crate::handlers::timetable_handler::list_timetables,
        crate::handlers::timetable_handler::create_timetable,
        crate::handlers::timetable_handler::get_timetable,
        crate::handlers::timetable_handler::update_timetable,
        crate::handlers::timetable_handler::delete_timetable,
        crate::handlers::timetable_handler::my_timetable,
        crate::handlers::schedule_handler::list_sessions,
        crate::handlers::schedule_handler::create_session,
        crate::handlers::schedule_handler::get_session,
        crate::handlers::schedule_handler::update_session,
        crate::handlers::schedule_handler::delete_session,
        crate::handlers::schedule_handler::my_schedule,
        crate::handlers::message_handler::list_messages,
        crate::handlers::message_handler::send_message,
        crate::handlers::notification_handler::list_notifications,
        crate::handlers::notification_handler::create_notification,
        crate::handlers::notification_handler::mark_read,
    ),
    components(
        schemas(
            ErrorResponse,
            MessageResponse,
            UserActionResponse,
            RejectionResponse,
            crate::services::auth_service::LoginResponse,
            crate::services::auth_service::RefreshResponse,
            crate::entities::user::RegisterRequest,
            crate::entities::user::LoginRequest,
            crate::entities::user::RefreshRequest,
            crate::entities::user::CreateTeacherRequest,
            crate::entities::user::UpdateUserRequest,
            crate::entities::user::RejectStudentRequest,
            crate::entities::user::AssignGroupRequest,
            crate::entities::user::UserRole,
            crate::entities::user::UserDTO,
            crate::entities::user::UserSearchDTO,
            crate::entities::user::TeacherDTO,
            crate::entities::course::Model,
            crate::entities::course::CreateCourseRequest,
            crate::entities::course::UpdateCourseRequest,
            crate::entities::course::AssignCourseToGroupRequest,
            crate::entities::group::CreateGroupRequest,
            crate::entities::group::UpdateGroupRequest,
            crate::entities::group::GroupDTO,
            crate::entities::course_assignment::AssignmentRequest,
            crate::entities::course_assignment::AssignmentDTO,
            crate::entities::course_assignment::EnrollmentResponse,
            crate::entities::schedule_session::Model,
            crate::entities::schedule_session::Weekday,
            crate::entities::schedule_session::SessionType,
            crate::entities::schedule_session::ScheduleSessionRequest,
            crate::entities::schedule_session::ScheduleSessionDTO,
            crate::entities::grade::GradeMarks,
            crate::entities::grade::UpsertGradeRequest,
            crate::entities::grade::GradeDTO,
            crate::entities::attendance::AttendanceStatus,
            crate::entities::attendance::AttendanceRequest,
            crate::entities::attendance::BulkAttendanceRequest,
            crate::entities::attendance::AttendanceDTO,
            crate::entities::attendance::SkipReason,
            crate::entities::attendance::SkippedRecord,
            crate::entities::attendance::BulkAttendanceReport,
            crate::entities::course_file::Model,
            crate::entities::course_file::FileType,
            crate::entities::course_file::CreateCourseFileRequest,
            crate::entities::course_file::CourseFileDTO,
            crate::entities::timetable::Model,
            crate::entities::timetable::CreateTimetableRequest,
            crate::entities::timetable::UpdateTimetableRequest,
            crate::entities::timetable::TimetableDTO,
            crate::entities::message::SendMessageRequest,
            crate::entities::message::MessageDTO,
            crate::entities::notification::Model,
            crate::entities::notification::NotificationType,
            crate::entities::notification::CreateNotificationRequest
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "authentication", description = "Registration, login and profile"),
        (name = "users", description = "User lookup and profile updates"),
        (name = "admin", description = "Approval workflow, accounts and course assignments"),
        (name = "courses", description = "Course catalogue"),
        (name = "groups", description = "Student groups"),
        (name = "grades", description = "Grade records"),
        (name = "attendance", description = "Weekly attendance"),
        (name = "files", description = "Course files"),
        (name = "timetables", description = "Group timetables"),
        (name = "schedule", description = "Weekly schedule sessions"),
        (name = "messages", description = "Direct messages"),
        (name = "notifications", description = "In-app notifications")
    ),
    info(
        title = "Campus Records API",
        version = "0.1.0",
        description = "Academic records backend for admins, teachers and students",
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
