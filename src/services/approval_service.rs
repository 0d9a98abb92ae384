use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::user::{ActiveModel, Model, UserRole};
use crate::errors::ApiError;
use crate::services::user_service;

pub const DEFAULT_REJECTION_REASON: &str = "Requirements not met";

/// Where a student account stands in the registration workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalState {
    Pending,
    Approved,
    Rejected(String),
}

impl ApprovalState {
    pub fn of(user: &Model) -> Self {
        // Staff accounts are never gated.
        if user.role != UserRole::Student || user.is_approved {
            return ApprovalState::Approved;
        }
        match &user.rejection_reason {
            Some(reason) => ApprovalState::Rejected(reason.clone()),
            None => ApprovalState::Pending,
        }
    }

    pub fn can_log_in(&self) -> bool {
        matches!(self, ApprovalState::Approved)
    }
}

/// PENDING or REJECTED -> APPROVED. Clears any previous rejection reason.
pub async fn approve(db: &DatabaseConnection, user_id: Uuid) -> Result<Model, ApiError> {
    let user = user_service::find_by_id(db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let mut model: ActiveModel = user.into();
    model.is_approved = Set(true);
    model.rejection_reason = Set(None);
    model.updated_at = Set(Utc::now());
    let user = model.update(db).await?;

    tracing::info!("Approved {} {}", user.role, user.username);
    Ok(user)
}

/// Moves the account to REJECTED. The account is kept so that a later
/// approval can still correct the decision.
pub async fn reject(
    db: &DatabaseConnection,
    user_id: Uuid,
    reason: Option<String>,
) -> Result<(Model, String), ApiError> {
    let user = user_service::find_by_id(db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let reason = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string());

    let mut model: ActiveModel = user.into();
    model.is_approved = Set(false);
    model.rejection_reason = Set(Some(reason.clone()));
    model.updated_at = Set(Utc::now());
    let user = model.update(db).await?;

    tracing::info!("Rejected {} {}: {}", user.role, user.username, reason);
    Ok((user, reason))
}
