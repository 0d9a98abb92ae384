use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "courses")]
#[schema(as = Course)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub description: String,
    pub credits: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::course_assignment::Entity")]
    Assignments,
    #[sea_orm(has_many = "super::grade::Entity")]
    Grades,
}

impl Related<super::course_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignments.def()
    }
}

impl Related<super::grade::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Grades.def()
    }
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        super::group_course::Relation::Group.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::group_course::Relation::Course.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn default_credits() -> i32 {
    3
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateCourseRequest {
    #[schema(examples("DAM301"))]
    #[validate(length(min = 1, max = 10, message = "Course code must be 1 to 10 characters"))]
    pub code: String,
    #[schema(examples("Mobile Development"))]
    #[validate(length(min = 1, max = 200, message = "Course name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_credits")]
    #[validate(range(min = 0, max = 60, message = "Credits must be between 0 and 60"))]
    pub credits: i32,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, max = 10, message = "Course code must be 1 to 10 characters"))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Course name is required"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0, max = 60, message = "Credits must be between 0 and 60"))]
    pub credits: Option<i32>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AssignCourseToGroupRequest {
    pub course_id: Uuid,
    pub group_id: Uuid,
}
