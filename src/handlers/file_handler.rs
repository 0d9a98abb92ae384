use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    api_docs::ErrorResponse,
    auth::caller::Caller,
    entities::course_file::{CourseFileDTO, CourseFileFilter, CreateCourseFileRequest},
    errors::ApiError,
    services::file_service,
};

#[utoipa::path(
    get,
    path = "/api/files",
    tag = "files",
    security(("bearer_auth" = [])),
    params(("course_id" = Option<Uuid>, Query, description = "Course filter")),
    responses(
        (status = 200, description = "Files visible to the caller", body = Vec<CourseFileDTO>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn list_files(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Query(filter): Query<CourseFileFilter>,
) -> Result<Json<Vec<CourseFileDTO>>, ApiError> {
    Ok(Json(file_service::list_files(db.as_ref(), &caller, filter).await?))
}

#[utoipa::path(
    post,
    path = "/api/files",
    tag = "files",
    security(("bearer_auth" = [])),
    request_body = CreateCourseFileRequest,
    responses(
        (status = 201, description = "File registered", body = CourseFileDTO),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    )
)]
pub async fn create_file(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Json(payload): Json<CreateCourseFileRequest>,
) -> Result<(StatusCode, Json<CourseFileDTO>), ApiError> {
    payload.validate()?;
    let file = file_service::create_file(db.as_ref(), &caller, payload).await?;
    Ok((StatusCode::CREATED, Json(file)))
}

#[utoipa::path(
    get,
    path = "/api/files/{id}",
    tag = "files",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "File id")),
    responses(
        (status = 200, description = "File", body = CourseFileDTO),
        (status = 404, description = "File not found or not visible to the caller", body = ErrorResponse)
    )
)]
pub async fn get_file(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<CourseFileDTO>, ApiError> {
    Ok(Json(file_service::get_file(db.as_ref(), &caller, id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "files",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "File id")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 403, description = "Only the uploader or an admin can delete", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
pub async fn delete_file(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    file_service::delete_file(db.as_ref(), &caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
