use axum::extract::{Extension, Json, Path, Query};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    api_docs::ErrorResponse,
    auth::caller::Caller,
    auth::permissions::{self, Access},
    entities::user::{UpdateUserRequest, UserDTO, UserSearchDTO},
    errors::ApiError,
    services::user_service,
};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/users/search",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("q" = Option<String>, Query, description = "Matches name, username or email")),
    responses(
        (status = 200, description = "Matching users", body = Vec<UserSearchDTO>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn search_users(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<UserSearchDTO>>, ApiError> {
    let users = user_service::search_users(db.as_ref(), &caller, query.q.as_deref()).await?;
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User information", body = UserDTO),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn get_user(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<UserDTO>, ApiError> {
    let user = user_service::find_by_id(db.as_ref(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    if !permissions::is_owner_or_admin(&caller, user.id, Access::Read) {
        return Err(ApiError::Forbidden("Access denied".to_string()));
    }

    Ok(Json(user_service::to_dto(db.as_ref(), user).await?))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserDTO),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Not the owner or an admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn update_user(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserDTO>, ApiError> {
    payload.validate()?;
    let user = user_service::update_user(db.as_ref(), &caller, id, payload).await?;
    Ok(Json(user_service::to_dto(db.as_ref(), user).await?))
}
