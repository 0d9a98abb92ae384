pub mod admin_handler;
pub mod attendance_handler;
pub mod auth_handler;
pub mod course_handler;
pub mod file_handler;
pub mod grade_handler;
pub mod group_handler;
pub mod message_handler;
pub mod notification_handler;
pub mod schedule_handler;
pub mod timetable_handler;
pub mod user_handler;
