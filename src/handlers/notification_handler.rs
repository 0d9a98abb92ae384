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
    auth::permissions::require_admin,
    entities::notification::{self, CreateNotificationRequest},
    errors::ApiError,
    services::notification_service,
};

#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The caller's notifications, newest first", body = Vec<notification::Model>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn list_notifications(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
) -> Result<Json<Vec<notification::Model>>, ApiError> {
    Ok(Json(notification_service::list_notifications(db.as_ref(), &caller).await?))
}

#[utoipa::path(
    post,
    path = "/api/notifications",
    tag = "notifications",
    security(("bearer_auth" = [])),
    request_body = CreateNotificationRequest,
    responses(
        (status = 201, description = "Notification created", body = notification::Model),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn create_notification(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Json(payload): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<notification::Model>), ApiError> {
    require_admin(&caller)?;
    payload.validate()?;
    let notification = notification_service::notify_user(db.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

#[utoipa::path(
    post,
    path = "/api/notifications/{id}/read",
    tag = "notifications",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification marked as read", body = MessageResponse),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    )
)]
pub async fn mark_read(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    notification_service::mark_read(db.as_ref(), &caller, id).await?;
    Ok(Json(MessageResponse::new("Notification marked as read")))
}
