use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Who teaches which course to which group, for one academic year.
/// Unique per (course, group, academic_year).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "course_assignments")]
#[schema(as = CourseAssignment)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub course_id: Uuid,
    pub group_id: Uuid,
    pub academic_year: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TeacherId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Teacher,
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id",
        on_delete = "Cascade"
    )]
    Course,
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id",
        on_delete = "Cascade"
    )]
    Group,
    #[sea_orm(has_many = "super::schedule_session::Entity")]
    Sessions,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::schedule_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct AssignmentRequest {
    pub teacher_id: Uuid,
    pub course_id: Uuid,
    pub group_id: Uuid,
    #[schema(examples("2024-2025"))]
    #[validate(length(min = 1, max = 10, message = "Academic year must be 1 to 10 characters"))]
    pub academic_year: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssignmentFilter {
    pub group_id: Option<Uuid>,
    pub teacher_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
}

/// Assignment with the names a client needs to render it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignmentDTO {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub teacher_name: Option<String>,
    pub course_id: Uuid,
    pub course_code: Option<String>,
    pub course_name: Option<String>,
    pub group_id: Uuid,
    pub group_name: Option<String>,
    pub academic_year: String,
    pub sessions: Vec<super::schedule_session::Model>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EnrollmentResponse {
    pub assignment_id: Uuid,
    pub created: u64,
}
