use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::caller::Caller;
use crate::entities::message::{self, ConversationQuery, MessageDTO, SendMessageRequest};
use crate::entities::notification::NotificationType;
use crate::entities::prelude::*;
use crate::entities::user;
use crate::errors::ApiError;
use crate::services::{notification_service, user_service};

pub const PREVIEW_LENGTH: usize = 100;

/// Notification body for a message: the first 100 characters, followed by
/// "..." when the content is longer.
pub fn preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_LENGTH {
        let truncated: String = content.chars().take(PREVIEW_LENGTH).collect();
        format!("{}...", truncated)
    } else {
        content.to_string()
    }
}

pub fn notification_title(sender_display_name: &str) -> String {
    format!("New Message from {}", sender_display_name)
}

/// Stores the message from the caller and notifies the receiver, atomically.
pub async fn send_message(
    db: &DatabaseConnection,
    caller: &Caller,
    request: SendMessageRequest,
) -> Result<MessageDTO, ApiError> {
    let receiver = user_service::find_by_id(db, request.receiver)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::not_found("Receiver"))?;

    let txn = db.begin().await?;

    let saved = message::ActiveModel {
        id: Set(Uuid::new_v4()),
        sender_id: Set(caller.id),
        receiver_id: Set(receiver.id),
        content: Set(request.content),
        timestamp: Set(Utc::now()),
        is_read: Set(false),
    }
    .insert(&txn)
    .await?;

    notification_service::create_notification(
        &txn,
        receiver.id,
        notification_title(&caller.display_name),
        preview(&saved.content),
        NotificationType::Message,
    )
    .await?;

    txn.commit().await?;

    tracing::debug!("{} sent a message to {}", caller.username, receiver.username);
    let sender = user_service::find_by_id(db, caller.id).await?;
    Ok(MessageDTO::new(saved, sender.as_ref(), Some(&receiver)))
}

/// Messages the caller sent or received, oldest first. With `with_user` set,
/// only the conversation with that user.
pub async fn list_messages(
    db: &DatabaseConnection,
    caller: &Caller,
    query: ConversationQuery,
) -> Result<Vec<MessageDTO>, ApiError> {
    let scope = match query.with_user {
        Some(other) => Condition::any()
            .add(
                Condition::all()
                    .add(message::Column::SenderId.eq(caller.id))
                    .add(message::Column::ReceiverId.eq(other)),
            )
            .add(
                Condition::all()
                    .add(message::Column::SenderId.eq(other))
                    .add(message::Column::ReceiverId.eq(caller.id)),
            ),
        None => Condition::any()
            .add(message::Column::SenderId.eq(caller.id))
            .add(message::Column::ReceiverId.eq(caller.id)),
    };

    let messages = Message::find()
        .filter(scope)
        .order_by_asc(message::Column::Timestamp)
        .all(db)
        .await?;
    if messages.is_empty() {
        return Ok(Vec::new());
    }

    let mut ids: Vec<Uuid> = messages
        .iter()
        .flat_map(|m| [m.sender_id, m.receiver_id])
        .collect();
    ids.sort();
    ids.dedup();
    let users: HashMap<Uuid, user::Model> = User::find()
        .filter(user::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    Ok(messages
        .into_iter()
        .map(|m| {
            let sender = users.get(&m.sender_id);
            let receiver = users.get(&m.receiver_id);
            MessageDTO::new(m, sender, receiver)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_is_kept() {
        assert_eq!(preview("See you at 10"), "See you at 10");
        assert_eq!(preview(&"a".repeat(100)), "a".repeat(100));
    }

    #[test]
    fn long_content_is_truncated() {
        let body = preview(&"x".repeat(150));
        assert_eq!(body.len(), 103);
        assert!(body.ends_with("..."));
    }

    #[test]
    fn truncation_counts_characters() {
        let body = preview(&"é".repeat(120));
        assert_eq!(body.chars().count(), 103);
    }
}
