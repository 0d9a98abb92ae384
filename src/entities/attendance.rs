use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// One attendance record per (student, course, week_number).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "attendance")]
#[schema(as = Attendance)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub date: NaiveDate,
    pub week_number: i32,
    pub status: AttendanceStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Student,
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id",
        on_delete = "Cascade"
    )]
    Course,
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    #[default]
    #[sea_orm(string_value = "PRESENT")]
    Present,
    #[sea_orm(string_value = "ABSENT")]
    Absent,
    #[sea_orm(string_value = "LATE")]
    Late,
    #[sea_orm(string_value = "EXCUSED")]
    Excused,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct AttendanceRequest {
    pub student: Uuid,
    pub course: Uuid,
    #[validate(range(min = 1, message = "Week number must be at least 1"))]
    pub week_number: i32,
    /// Defaults to today when omitted.
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub status: AttendanceStatus,
    #[serde(default)]
    pub notes: String,
}

/// Records are validated one by one; an invalid record is skipped rather
/// than failing the whole batch.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct BulkAttendanceRequest {
    #[serde(default)]
    pub attendance: Vec<AttendanceRequest>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AttendanceFilter {
    pub course_id: Option<Uuid>,
    pub week: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BulkAttendanceQuery {
    #[serde(default)]
    pub report: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceDTO {
    pub id: Uuid,
    pub student: Uuid,
    pub student_name: Option<String>,
    pub student_id: Option<String>,
    pub course: Uuid,
    pub course_code: Option<String>,
    pub date: NaiveDate,
    pub week_number: i32,
    pub status: AttendanceStatus,
    pub notes: String,
}

impl AttendanceDTO {
    pub fn new(
        record: Model,
        student: Option<&super::user::Model>,
        course: Option<&super::course::Model>,
    ) -> Self {
        Self {
            id: record.id,
            student: record.student_id,
            student_name: student.map(|s| s.display_name()),
            student_id: student.and_then(|s| s.student_id.clone()),
            course: record.course_id,
            course_code: course.map(|c| c.code.clone()),
            date: record.date,
            week_number: record.week_number,
            status: record.status,
            notes: record.notes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotTeacherOfCourse,
    StudentNotFound,
    InvalidWeekNumber,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SkippedRecord {
    /// Position of the record in the submitted list.
    pub index: usize,
    pub student: Uuid,
    pub course: Uuid,
    pub reason: SkipReason,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkAttendanceReport {
    pub accepted: Vec<AttendanceDTO>,
    pub skipped: Vec<SkippedRecord>,
}
