use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    api_docs::{ErrorResponse, MessageResponse},
    auth::caller::Caller,
    auth::permissions::{require_admin, require_approved_student, require_teacher},
    entities::course::{self, AssignCourseToGroupRequest, CreateCourseRequest, UpdateCourseRequest},
    entities::course_assignment::AssignmentDTO,
    errors::ApiError,
    services::course_service,
};

#[utoipa::path(
    get,
    path = "/api/courses",
    tag = "courses",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All courses", body = Vec<course::Model>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn list_courses(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    _caller: Caller,
) -> Result<Json<Vec<course::Model>>, ApiError> {
    Ok(Json(course_service::list_courses(db.as_ref()).await?))
}

#[utoipa::path(
    post,
    path = "/api/courses",
    tag = "courses",
    security(("bearer_auth" = [])),
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = course::Model),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 409, description = "Course code already exists", body = ErrorResponse)
    )
)]
pub async fn create_course(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<course::Model>), ApiError> {
    require_admin(&caller)?;
    payload.validate()?;
    let course = course_service::create_course(db.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    tag = "courses",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course", body = course::Model),
        (status = 404, description = "Course not found", body = ErrorResponse)
    )
)]
pub async fn get_course(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    _caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<course::Model>, ApiError> {
    Ok(Json(course_service::find_course(db.as_ref(), id).await?))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    tag = "courses",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Course id")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated", body = course::Model),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 409, description = "Course code already exists", body = ErrorResponse)
    )
)]
pub async fn update_course(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCourseRequest>,
) -> Result<Json<course::Model>, ApiError> {
    require_admin(&caller)?;
    payload.validate()?;
    Ok(Json(course_service::update_course(db.as_ref(), id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    tag = "courses",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    )
)]
pub async fn delete_course(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_admin(&caller)?;
    course_service::delete_course(db.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/courses/my-courses",
    tag = "courses",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Assignments taught by the caller", body = Vec<AssignmentDTO>),
        (status = 403, description = "Teacher access required", body = ErrorResponse)
    )
)]
pub async fn my_courses(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
) -> Result<Json<Vec<AssignmentDTO>>, ApiError> {
    require_teacher(&caller)?;
    Ok(Json(course_service::teacher_courses(db.as_ref(), &caller).await?))
}

#[utoipa::path(
    get,
    path = "/api/courses/student-courses",
    tag = "courses",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Assignments of the caller's group", body = Vec<AssignmentDTO>),
        (status = 403, description = "Approved student access required", body = ErrorResponse)
    )
)]
pub async fn student_courses(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
) -> Result<Json<Vec<AssignmentDTO>>, ApiError> {
    require_approved_student(&caller)?;
    Ok(Json(course_service::student_courses(db.as_ref(), &caller).await?))
}

#[utoipa::path(
    post,
    path = "/api/courses/assign-to-group",
    tag = "courses",
    security(("bearer_auth" = [])),
    request_body = AssignCourseToGroupRequest,
    responses(
        (status = 200, description = "Course linked to the group", body = MessageResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Course or group not found", body = ErrorResponse)
    )
)]
pub async fn assign_to_group(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Json(payload): Json<AssignCourseToGroupRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_admin(&caller)?;
    let (course, group) =
        course_service::assign_course_to_group(db.as_ref(), payload.course_id, payload.group_id)
            .await?;
    Ok(Json(MessageResponse::new(format!(
        "Course {} assigned to group {}",
        course.name, group.name
    ))))
}
