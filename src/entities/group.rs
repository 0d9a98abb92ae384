use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "groups")]
#[schema(as = Group)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub academic_year: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user::Entity")]
    Students,
    #[sea_orm(has_many = "super::course_assignment::Entity")]
    Assignments,
    #[sea_orm(has_many = "super::timetable::Entity")]
    Timetables,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl Related<super::course_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignments.def()
    }
}

impl Related<super::timetable::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Timetables.def()
    }
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        super::group_course::Relation::Course.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::group_course::Relation::Group.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateGroupRequest {
    #[schema(examples("IFA G1"))]
    #[validate(length(min = 1, max = 50, message = "Group name must be 1 to 50 characters"))]
    pub name: String,
    #[schema(examples("2024-2025"))]
    #[validate(length(min = 1, max = 10, message = "Academic year must be 1 to 10 characters"))]
    pub academic_year: String,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateGroupRequest {
    #[validate(length(min = 1, max = 50, message = "Group name must be 1 to 50 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 10, message = "Academic year must be 1 to 10 characters"))]
    pub academic_year: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupDTO {
    pub id: Uuid,
    pub name: String,
    pub academic_year: String,
    pub student_count: u64,
    pub courses: Vec<super::course::Model>,
}
