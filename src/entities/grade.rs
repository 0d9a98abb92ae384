use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

pub const MIN_MARK: f64 = 0.0;
pub const MAX_MARK: f64 = 20.0;

/// One grade record per (student, course).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "grades")]
#[schema(as = Grade)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub td_mark: Option<f64>,
    pub tp_mark: Option<f64>,
    pub exam_mark: Option<f64>,
    pub comments: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
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

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Mean of the marks that are present, `None` when no mark is set.
    pub fn average(&self) -> Option<f64> {
        let marks: Vec<f64> = [self.td_mark, self.tp_mark, self.exam_mark]
            .into_iter()
            .flatten()
            .collect();
        if marks.is_empty() {
            None
        } else {
            Some(marks.iter().sum::<f64>() / marks.len() as f64)
        }
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Mark changes. An omitted mark is left untouched, an explicit `null` clears it.
#[derive(Debug, Default, Clone, Deserialize, Serialize, ToSchema)]
pub struct GradeMarks {
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub td_mark: Option<Option<f64>>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub tp_mark: Option<Option<f64>>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub exam_mark: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl GradeMarks {
    /// Returns the name of the first mark outside [0, 20].
    pub fn out_of_range(&self) -> Option<&'static str> {
        [
            ("td_mark", self.td_mark),
            ("tp_mark", self.tp_mark),
            ("exam_mark", self.exam_mark),
        ]
        .into_iter()
        .find(|(_, mark)| {
            matches!(mark, Some(Some(value)) if !(MIN_MARK..=MAX_MARK).contains(value))
        })
        .map(|(name, _)| name)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UpsertGradeRequest {
    pub student: Uuid,
    pub course: Uuid,
    #[serde(flatten)]
    pub marks: GradeMarks,
}

#[derive(Debug, Default, Deserialize)]
pub struct GradeFilter {
    pub course_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GradeDTO {
    pub id: Uuid,
    pub student: Uuid,
    pub student_name: Option<String>,
    pub student_id: Option<String>,
    pub course: Uuid,
    pub course_code: Option<String>,
    pub course_name: Option<String>,
    pub td_mark: Option<f64>,
    pub tp_mark: Option<f64>,
    pub exam_mark: Option<f64>,
    pub average: Option<f64>,
    pub comments: String,
    pub updated_at: DateTime<Utc>,
}

impl GradeDTO {
    pub fn new(
        grade: Model,
        student: Option<&super::user::Model>,
        course: Option<&super::course::Model>,
    ) -> Self {
        let average = grade.average().map(|avg| (avg * 100.0).round() / 100.0);
        Self {
            id: grade.id,
            student: grade.student_id,
            student_name: student.map(|s| s.display_name()),
            student_id: student.and_then(|s| s.student_id.clone()),
            course: grade.course_id,
            course_code: course.map(|c| c.code.clone()),
            course_name: course.map(|c| c.name.clone()),
            td_mark: grade.td_mark,
            tp_mark: grade.tp_mark,
            exam_mark: grade.exam_mark,
            average,
            comments: grade.comments,
            updated_at: grade.updated_at,
        }
    }
}
