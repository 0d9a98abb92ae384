use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "timetables")]
#[schema(as = Timetable)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub group_id: Uuid,
    pub title: String,
    pub image_path: String,
    pub semester: String,
    pub academic_year: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id",
        on_delete = "Cascade"
    )]
    Group,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateTimetableRequest {
    pub group: Uuid,
    #[schema(examples("Spring 2025 Schedule"))]
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Image path is required"))]
    pub image_path: String,
    #[serde(default)]
    pub semester: String,
    #[validate(length(min = 1, max = 10, message = "Academic year must be 1 to 10 characters"))]
    pub academic_year: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateTimetableRequest {
    pub group: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Image path is required"))]
    pub image_path: Option<String>,
    pub semester: Option<String>,
    #[validate(length(min = 1, max = 10, message = "Academic year must be 1 to 10 characters"))]
    pub academic_year: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimetableDTO {
    #[serde(flatten)]
    pub timetable: Model,
    pub group_name: Option<String>,
}
