pub use super::attendance::Entity as Attendance;
pub use super::course::Entity as Course;
pub use super::course_assignment::Entity as CourseAssignment;
pub use super::course_file::Entity as CourseFile;
pub use super::grade::Entity as Grade;
pub use super::group::Entity as Group;
pub use super::group_course::Entity as GroupCourse;
pub use super::message::Entity as Message;
pub use super::notification::Entity as Notification;
pub use super::schedule_session::Entity as ScheduleSession;
pub use super::timetable::Entity as Timetable;
pub use super::user::Entity as User;
