use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "messages")]
#[schema(as = Message)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SenderId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Sender,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReceiverId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Receiver,
}

impl ActiveModelBehavior for ActiveModel {}

// The sender is always the authenticated caller, so it is not part of the request.
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct SendMessageRequest {
    pub receiver: Uuid,
    #[validate(length(min = 1, message = "Message content is required"))]
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConversationQuery {
    pub with_user: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageDTO {
    pub id: Uuid,
    pub sender: Uuid,
    pub sender_name: Option<String>,
    pub receiver: Uuid,
    pub receiver_name: Option<String>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
}

impl MessageDTO {
    pub fn new(
        message: Model,
        sender: Option<&super::user::Model>,
        receiver: Option<&super::user::Model>,
    ) -> Self {
        Self {
            id: message.id,
            sender: message.sender_id,
            sender_name: sender.map(|u| u.display_name()),
            receiver: message.receiver_id,
            receiver_name: receiver.map(|u| u.display_name()),
            content: message.content,
            timestamp: message.timestamp,
            is_read: message.is_read,
        }
    }
}
