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
    auth::permissions::require_admin,
    entities::schedule_session::{ScheduleFilter, ScheduleSessionDTO, ScheduleSessionRequest},
    errors::ApiError,
    services::schedule_service,
};

#[utoipa::path(
    get,
    path = "/api/schedule",
    tag = "schedule",
    security(("bearer_auth" = [])),
    params(
        ("group_id" = Option<Uuid>, Query, description = "Group filter"),
        ("day" = Option<String>, Query, description = "Day filter, e.g. MONDAY")
    ),
    responses(
        (status = 200, description = "Schedule sessions", body = Vec<ScheduleSessionDTO>),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    )
)]
pub async fn list_sessions(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Query(filter): Query<ScheduleFilter>,
) -> Result<Json<Vec<ScheduleSessionDTO>>, ApiError> {
    require_admin(&caller)?;
    Ok(Json(schedule_service::list_sessions(db.as_ref(), filter).await?))
}

#[utoipa::path(
    post,
    path = "/api/schedule",
    tag = "schedule",
    security(("bearer_auth" = [])),
    request_body = ScheduleSessionRequest,
    responses(
        (status = 201, description = "Session created", body = ScheduleSessionDTO),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse)
    )
)]
pub async fn create_session(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Json(payload): Json<ScheduleSessionRequest>,
) -> Result<(StatusCode, Json<ScheduleSessionDTO>), ApiError> {
    require_admin(&caller)?;
    payload.validate()?;
    let session = schedule_service::create_session(db.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[utoipa::path(
    get,
    path = "/api/schedule/{id}",
    tag = "schedule",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session", body = ScheduleSessionDTO),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    )
)]
pub async fn get_session(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<ScheduleSessionDTO>, ApiError> {
    require_admin(&caller)?;
    Ok(Json(schedule_service::get_session(db.as_ref(), id).await?))
}

#[utoipa::path(
    put,
    path = "/api/schedule/{id}",
    tag = "schedule",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = ScheduleSessionRequest,
    responses(
        (status = 200, description = "Session updated", body = ScheduleSessionDTO),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Session or assignment not found", body = ErrorResponse)
    )
)]
pub async fn update_session(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<ScheduleSessionRequest>,
) -> Result<Json<ScheduleSessionDTO>, ApiError> {
    require_admin(&caller)?;
    payload.validate()?;
    Ok(Json(schedule_service::update_session(db.as_ref(), id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/schedule/{id}",
    tag = "schedule",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 204, description = "Session deleted"),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    )
)]
pub async fn delete_session(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_admin(&caller)?;
    schedule_service::delete_session(db.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/schedule/my-schedule",
    tag = "schedule",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Weekly sessions relevant to the caller", body = Vec<ScheduleSessionDTO>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn my_schedule(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
) -> Result<Json<Vec<ScheduleSessionDTO>>, ApiError> {
    Ok(Json(schedule_service::my_schedule(db.as_ref(), &caller).await?))
}
