pub mod attendance;
pub mod course;
pub mod course_assignment;
pub mod course_file;
pub mod grade;
pub mod group;
pub mod group_course;
pub mod message;
pub mod notification;
pub mod prelude;
pub mod schedule_session;
pub mod timetable;
pub mod user;
