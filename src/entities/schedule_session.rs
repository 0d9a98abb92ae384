use chrono::NaiveTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Recurring weekly slot of a course assignment.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "schedule_sessions")]
#[schema(as = ScheduleSession)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub day: Weekday,
    #[schema(value_type = String, examples("08:30:00"))]
    pub start_time: NaiveTime,
    #[schema(value_type = String, examples("10:00:00"))]
    pub end_time: NaiveTime,
    pub room: String,
    pub session_type: SessionType,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course_assignment::Entity",
        from = "Column::AssignmentId",
        to = "super::course_assignment::Column::Id",
        on_delete = "Cascade"
    )]
    Assignment,
}

impl Related<super::course_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Weekday {
    #[sea_orm(string_value = "MONDAY")]
    Monday,
    #[sea_orm(string_value = "TUESDAY")]
    Tuesday,
    #[sea_orm(string_value = "WEDNESDAY")]
    Wednesday,
    #[sea_orm(string_value = "THURSDAY")]
    Thursday,
    #[sea_orm(string_value = "FRIDAY")]
    Friday,
    #[sea_orm(string_value = "SATURDAY")]
    Saturday,
    #[sea_orm(string_value = "SUNDAY")]
    Sunday,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionType {
    #[sea_orm(string_value = "LECTURE")]
    Lecture,
    #[sea_orm(string_value = "TD")]
    Td,
    #[sea_orm(string_value = "TP")]
    Tp,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct ScheduleSessionRequest {
    pub assignment_id: Uuid,
    pub day: Weekday,
    #[schema(value_type = String, examples("08:30:00"))]
    pub start_time: NaiveTime,
    #[schema(value_type = String, examples("10:00:00"))]
    pub end_time: NaiveTime,
    #[serde(default)]
    #[validate(length(max = 50, message = "Room is too long"))]
    pub room: String,
    pub session_type: SessionType,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleFilter {
    pub group_id: Option<Uuid>,
    pub day: Option<Weekday>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScheduleSessionDTO {
    #[serde(flatten)]
    pub session: Model,
    pub course_code: Option<String>,
    pub course_name: Option<String>,
    pub group_name: Option<String>,
    pub teacher_name: Option<String>,
}
