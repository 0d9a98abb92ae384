use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    api_docs::ErrorResponse,
    auth::caller::Caller,
    auth::permissions::{require_admin, require_approved_student},
    entities::timetable::{CreateTimetableRequest, TimetableDTO, UpdateTimetableRequest},
    errors::ApiError,
    services::timetable_service,
};

#[utoipa::path(
    get,
    path = "/api/timetables",
    tag = "timetables",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active timetables visible to the caller", body = Vec<TimetableDTO>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn list_timetables(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
) -> Result<Json<Vec<TimetableDTO>>, ApiError> {
    Ok(Json(timetable_service::list_timetables(db.as_ref(), &caller).await?))
}

#[utoipa::path(
    post,
    path = "/api/timetables",
    tag = "timetables",
    security(("bearer_auth" = [])),
    request_body = CreateTimetableRequest,
    responses(
        (status = 201, description = "Timetable published", body = TimetableDTO),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn create_timetable(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Json(payload): Json<CreateTimetableRequest>,
) -> Result<(StatusCode, Json<TimetableDTO>), ApiError> {
    require_admin(&caller)?;
    payload.validate()?;
    let timetable = timetable_service::create_timetable(db.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(timetable)))
}

#[utoipa::path(
    get,
    path = "/api/timetables/{id}",
    tag = "timetables",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Timetable id")),
    responses(
        (status = 200, description = "Timetable", body = TimetableDTO),
        (status = 404, description = "Timetable not found", body = ErrorResponse)
    )
)]
pub async fn get_timetable(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    _caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<TimetableDTO>, ApiError> {
    Ok(Json(timetable_service::get_timetable(db.as_ref(), id).await?))
}

#[utoipa::path(
    put,
    path = "/api/timetables/{id}",
    tag = "timetables",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Timetable id")),
    request_body = UpdateTimetableRequest,
    responses(
        (status = 200, description = "Timetable updated", body = TimetableDTO),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Timetable or group not found", body = ErrorResponse)
    )
)]
pub async fn update_timetable(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTimetableRequest>,
) -> Result<Json<TimetableDTO>, ApiError> {
    require_admin(&caller)?;
    payload.validate()?;
    Ok(Json(timetable_service::update_timetable(db.as_ref(), id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/timetables/{id}",
    tag = "timetables",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Timetable id")),
    responses(
        (status = 204, description = "Timetable deleted"),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Timetable not found", body = ErrorResponse)
    )
)]
pub async fn delete_timetable(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_admin(&caller)?;
    timetable_service::delete_timetable(db.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/timetables/my-timetable",
    tag = "timetables",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active timetable of the caller's group", body = TimetableDTO),
        (status = 403, description = "Approved student access required", body = ErrorResponse),
        (status = 404, description = "No group or no active timetable", body = ErrorResponse)
    )
)]
pub async fn my_timetable(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
) -> Result<Json<TimetableDTO>, ApiError> {
    require_approved_student(&caller)?;
    Ok(Json(timetable_service::my_timetable(db.as_ref(), &caller).await?))
}
