use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::jwt::{self, TokenType};
use crate::auth::password;
use crate::entities::user::{LoginRequest, Model, UserDTO};
use crate::errors::ApiError;
use crate::services::approval_service::ApprovalState;
use crate::services::user_service;

pub const PENDING_APPROVAL_MESSAGE: &str = "Account pending approval";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: UserDTO,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    pub access: String,
}

/// Checks credentials, then the approval gate. Only an account passing both
/// gets a token pair.
pub async fn authenticate(db: &DatabaseConnection, request: &LoginRequest) -> Result<Model, ApiError> {
    let invalid = || ApiError::Unauthenticated("Invalid credentials".to_string());

    let user = user_service::find_by_username(db, &request.username)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(invalid)?;

    if !password::verify_password(&request.password, &user.password_hash) {
        return Err(invalid());
    }

    if !ApprovalState::of(&user).can_log_in() {
        tracing::info!("Login refused for unapproved student {}", user.username);
        return Err(ApiError::Forbidden(PENDING_APPROVAL_MESSAGE.to_string()));
    }

    Ok(user)
}

pub async fn login(db: &DatabaseConnection, request: LoginRequest) -> Result<LoginResponse, ApiError> {
    let user = authenticate(db, &request).await?;
    let tokens = jwt::create_token_pair(user.id, &user.username, user.role)?;

    tracing::info!("User {} logged in", user.username);
    Ok(LoginResponse {
        access: tokens.access,
        refresh: tokens.refresh,
        user: user_service::to_dto(db, user).await?,
    })
}

/// Issues a new access token. The account is re-checked so that deleted,
/// deactivated or rejected accounts cannot renew their session.
pub async fn refresh(db: &DatabaseConnection, refresh_token: &str) -> Result<RefreshResponse, ApiError> {
    let claims = jwt::validate_token(refresh_token, TokenType::Refresh)
        .map_err(|_| ApiError::Unauthenticated("Invalid or expired refresh token".to_string()))?;

    let user_id = claims
        .user_id()
        .ok_or_else(|| ApiError::Unauthenticated("Invalid user ID in token".to_string()))?;

    let user = user_service::find_by_id(db, user_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| ApiError::Unauthenticated("User not found".to_string()))?;

    if !ApprovalState::of(&user).can_log_in() {
        return Err(ApiError::Forbidden(PENDING_APPROVAL_MESSAGE.to_string()));
    }

    let access = jwt::create_token(user.id, &user.username, user.role, TokenType::Access)?;
    Ok(RefreshResponse { access })
}
