use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "course_files")]
#[schema(as = CourseFile)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub course_id: Uuid,
    pub uploaded_by: Uuid,
    pub title: String,
    pub description: String,
    /// Location of the stored file, managed outside this service.
    pub file_path: String,
    pub file_type: FileType,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id",
        on_delete = "Cascade"
    )]
    Course,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UploadedBy",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Uploader,
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
pub enum FileType {
    #[sea_orm(string_value = "LECTURE")]
    Lecture,
    #[sea_orm(string_value = "LAB")]
    Lab,
    #[sea_orm(string_value = "ASSIGNMENT")]
    Assignment,
    #[sea_orm(string_value = "SOLUTION")]
    Solution,
    #[default]
    #[sea_orm(string_value = "OTHER")]
    Other,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateCourseFileRequest {
    pub course: Uuid,
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, message = "File path is required"))]
    pub file_path: String,
    #[serde(default)]
    pub file_type: FileType,
}

#[derive(Debug, Default, Deserialize)]
pub struct CourseFileFilter {
    pub course_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseFileDTO {
    #[serde(flatten)]
    pub file: Model,
    pub course_code: Option<String>,
    pub uploaded_by_name: Option<String>,
}
