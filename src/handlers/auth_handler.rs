use axum::{
    extract::{Extension, Json},
    http::StatusCode,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use validator::Validate;

use crate::{
    api_docs::{ErrorResponse, MessageResponse, UserActionResponse},
    auth::caller::Caller,
    entities::user::{LoginRequest, RefreshRequest, RegisterRequest, UpdateUserRequest, UserDTO},
    errors::ApiError,
    services::auth_service::{self, LoginResponse, RefreshResponse},
    services::user_service,
};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Student registered, pending approval", body = UserActionResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Username or student id already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn register(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserActionResponse>), ApiError> {
    payload.validate()?;

    let student = user_service::register_student(db.as_ref(), payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserActionResponse {
            message: "Registration successful. Please wait for admin approval.".to_string(),
            user: UserDTO::from(student),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token pair and user", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account pending approval", body = ErrorResponse)
    )
)]
pub async fn login(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    payload.validate()?;
    Ok(Json(auth_service::login(db.as_ref(), payload).await?))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "authentication",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 401, description = "Invalid or expired refresh token", body = ErrorResponse)
    )
)]
pub async fn refresh(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    payload.validate()?;
    Ok(Json(auth_service::refresh(db.as_ref(), &payload.refresh).await?))
}

/// Tokens are stateless; the client discards them.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn logout(caller: Caller) -> Json<MessageResponse> {
    tracing::debug!("User {} logged out", caller.username);
    Json(MessageResponse::new("Logout successful"))
}

#[utoipa::path(
    get,
    path = "/api/auth/profile",
    tag = "authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user information", body = UserDTO),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn get_profile(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
) -> Result<Json<UserDTO>, ApiError> {
    let user = user_service::find_by_id(db.as_ref(), caller.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    Ok(Json(user_service::to_dto(db.as_ref(), user).await?))
}

#[utoipa::path(
    put,
    path = "/api/auth/profile",
    tag = "authentication",
    security(("bearer_auth" = [])),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserDTO),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn update_profile(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserDTO>, ApiError> {
    payload.validate()?;
    let user = user_service::update_user(db.as_ref(), &caller, caller.id, payload).await?;
    Ok(Json(user_service::to_dto(db.as_ref(), user).await?))
}
