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
    auth::permissions::require_admin,
    entities::group::{CreateGroupRequest, GroupDTO, UpdateGroupRequest},
    errors::ApiError,
    services::course_service,
};

#[utoipa::path(
    get,
    path = "/api/groups",
    tag = "groups",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Groups with student count and courses", body = Vec<GroupDTO>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn list_groups(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    _caller: Caller,
) -> Result<Json<Vec<GroupDTO>>, ApiError> {
    Ok(Json(course_service::list_groups(db.as_ref()).await?))
}

#[utoipa::path(
    post,
    path = "/api/groups",
    tag = "groups",
    security(("bearer_auth" = [])),
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = GroupDTO),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 409, description = "Group name already exists", body = ErrorResponse)
    )
)]
pub async fn create_group(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupDTO>), ApiError> {
    require_admin(&caller)?;
    payload.validate()?;
    let group = course_service::create_group(db.as_ref(), payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(course_service::group_dto(db.as_ref(), group).await?),
    ))
}

#[utoipa::path(
    get,
    path = "/api/groups/{id}",
    tag = "groups",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Group id")),
    responses(
        (status = 200, description = "Group", body = GroupDTO),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn get_group(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    _caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<GroupDTO>, ApiError> {
    let group = course_service::find_group(db.as_ref(), id).await?;
    Ok(Json(course_service::group_dto(db.as_ref(), group).await?))
}

#[utoipa::path(
    put,
    path = "/api/groups/{id}",
    tag = "groups",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Group id")),
    request_body = UpdateGroupRequest,
    responses(
        (status = 200, description = "Group updated", body = GroupDTO),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 409, description = "Group name already exists", body = ErrorResponse)
    )
)]
pub async fn update_group(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateGroupRequest>,
) -> Result<Json<GroupDTO>, ApiError> {
    require_admin(&caller)?;
    payload.validate()?;
    let group = course_service::update_group(db.as_ref(), id, payload).await?;
    Ok(Json(course_service::group_dto(db.as_ref(), group).await?))
}

#[utoipa::path(
    delete,
    path = "/api/groups/{id}",
    tag = "groups",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Group id")),
    responses(
        (status = 204, description = "Group deleted, its students keep their accounts"),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn delete_group(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_admin(&caller)?;
    course_service::delete_group(db.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
