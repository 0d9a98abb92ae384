use axum::{
    extract::{Extension, Json, Query},
    http::StatusCode,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use validator::Validate;

use crate::{
    api_docs::ErrorResponse,
    auth::caller::Caller,
    entities::message::{ConversationQuery, MessageDTO, SendMessageRequest},
    errors::ApiError,
    services::message_service,
};

#[utoipa::path(
    get,
    path = "/api/messages",
    tag = "messages",
    security(("bearer_auth" = [])),
    params(("with_user" = Option<Uuid>, Query, description = "Only the conversation with this user")),
    responses(
        (status = 200, description = "Messages sent or received by the caller", body = Vec<MessageDTO>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn list_messages(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Query(query): Query<ConversationQuery>,
) -> Result<Json<Vec<MessageDTO>>, ApiError> {
    Ok(Json(message_service::list_messages(db.as_ref(), &caller, query).await?))
}

#[utoipa::path(
    post,
    path = "/api/messages",
    tag = "messages",
    security(("bearer_auth" = [])),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message sent and receiver notified", body = MessageDTO),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Receiver not found", body = ErrorResponse)
    )
)]
pub async fn send_message(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Json(payload): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageDTO>), ApiError> {
    payload.validate()?;
    let message = message_service::send_message(db.as_ref(), &caller, payload).await?;
    Ok((StatusCode::CREATED, Json(message)))
}
