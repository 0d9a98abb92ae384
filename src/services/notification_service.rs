use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::auth::caller::Caller;
use crate::entities::notification::{self, CreateNotificationRequest, NotificationType};
use crate::entities::prelude::*;
use crate::errors::ApiError;
use crate::services::user_service;

pub async fn create_notification<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    title: String,
    message: String,
    notification_type: NotificationType,
) -> Result<notification::Model, ApiError> {
    let notification = notification::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        title: Set(title),
        message: Set(message),
        notification_type: Set(notification_type),
        is_read: Set(false),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    Ok(notification)
}

/// Admin-issued notification for any user.
pub async fn notify_user(
    db: &DatabaseConnection,
    request: CreateNotificationRequest,
) -> Result<notification::Model, ApiError> {
    let recipient = user_service::find_by_id(db, request.user)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let notification = create_notification(
        db,
        recipient.id,
        request.title,
        request.message,
        request.notification_type,
    )
    .await?;

    tracing::info!(
        "Sent {:?} notification to {}",
        notification.notification_type,
        recipient.username
    );
    Ok(notification)
}

/// The caller's notifications, newest first.
pub async fn list_notifications(
    db: &DatabaseConnection,
    caller: &Caller,
) -> Result<Vec<notification::Model>, ApiError> {
    Ok(Notification::find()
        .filter(notification::Column::UserId.eq(caller.id))
        .order_by_desc(notification::Column::CreatedAt)
        .all(db)
        .await?)
}

/// Marks one of the caller's notifications as read. Anyone else's
/// notification is reported as missing.
pub async fn mark_read(
    db: &DatabaseConnection,
    caller: &Caller,
    notification_id: Uuid,
) -> Result<notification::Model, ApiError> {
    let notification = Notification::find_by_id(notification_id)
        .filter(notification::Column::UserId.eq(caller.id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Notification"))?;

    if notification.is_read {
        return Ok(notification);
    }

    let mut model: notification::ActiveModel = notification.into();
    model.is_read = Set(true);
    Ok(model.update(db).await?)
}
