pub mod approval_service;
pub mod attendance_service;
pub mod auth_service;
pub mod course_service;
pub mod file_service;
pub mod grade_service;
pub mod message_service;
pub mod notification_service;
pub mod schedule_service;
pub mod seed_service;
pub mod timetable_service;
pub mod user_service;
