use axum::extract::{Extension, Json, Path, Query};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    api_docs::ErrorResponse,
    auth::caller::Caller,
    auth::permissions::{require_approved_student, require_teacher},
    entities::grade::{GradeDTO, GradeFilter, GradeMarks, UpsertGradeRequest},
    errors::ApiError,
    services::grade_service,
};

#[utoipa::path(
    get,
    path = "/api/grades",
    tag = "grades",
    security(("bearer_auth" = [])),
    params(("course_id" = Option<Uuid>, Query, description = "Course filter")),
    responses(
        (status = 200, description = "Grades of the caller's courses", body = Vec<GradeDTO>),
        (status = 403, description = "Teacher access required", body = ErrorResponse)
    )
)]
pub async fn list_grades(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Query(filter): Query<GradeFilter>,
) -> Result<Json<Vec<GradeDTO>>, ApiError> {
    require_teacher(&caller)?;
    Ok(Json(grade_service::list_grades(db.as_ref(), &caller, filter).await?))
}

#[utoipa::path(
    post,
    path = "/api/grades",
    tag = "grades",
    security(("bearer_auth" = [])),
    request_body = UpsertGradeRequest,
    responses(
        (status = 200, description = "Grade created or updated", body = GradeDTO),
        (status = 400, description = "Mark outside [0, 20]", body = ErrorResponse),
        (status = 403, description = "Not a teacher of the course", body = ErrorResponse),
        (status = 404, description = "Student or course not found", body = ErrorResponse)
    )
)]
pub async fn upsert_grade(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Json(payload): Json<UpsertGradeRequest>,
) -> Result<Json<GradeDTO>, ApiError> {
    require_teacher(&caller)?;
    Ok(Json(grade_service::upsert_grade(db.as_ref(), &caller, payload).await?))
}

#[utoipa::path(
    put,
    path = "/api/grades/{id}",
    tag = "grades",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Grade id")),
    request_body = GradeMarks,
    responses(
        (status = 200, description = "Grade updated", body = GradeDTO),
        (status = 400, description = "Mark outside [0, 20]", body = ErrorResponse),
        (status = 404, description = "Grade not found", body = ErrorResponse)
    )
)]
pub async fn update_grade(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<GradeMarks>,
) -> Result<Json<GradeDTO>, ApiError> {
    require_teacher(&caller)?;
    Ok(Json(grade_service::update_grade(db.as_ref(), &caller, id, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/grades/my-grades",
    tag = "grades",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The caller's grades", body = Vec<GradeDTO>),
        (status = 403, description = "Approved student access required", body = ErrorResponse)
    )
)]
pub async fn my_grades(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
) -> Result<Json<Vec<GradeDTO>>, ApiError> {
    require_approved_student(&caller)?;
    Ok(Json(grade_service::student_grades(db.as_ref(), &caller).await?))
}

#[utoipa::path(
    get,
    path = "/api/grades/course/{assignment_id}/students",
    tag = "grades",
    security(("bearer_auth" = [])),
    params(("assignment_id" = Uuid, Path, description = "Course assignment id")),
    responses(
        (status = 200, description = "Grade of every student in the assignment's group", body = Vec<GradeDTO>),
        (status = 403, description = "Teacher access required", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse)
    )
)]
pub async fn course_roster(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(assignment_id): Path<Uuid>,
) -> Result<Json<Vec<GradeDTO>>, ApiError> {
    require_teacher(&caller)?;
    Ok(Json(grade_service::course_roster(db.as_ref(), &caller, assignment_id).await?))
}
