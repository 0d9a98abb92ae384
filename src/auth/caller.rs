use axum::{extract::FromRequestParts, http::request::Parts};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::jwt::Claims;
use crate::entities::user::{self, UserRole};
use crate::errors::ApiError;
use crate::services::user_service;

/// Attributes that only exist for student accounts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StudentProfile {
    pub student_id: Option<String>,
    pub program: Option<String>,
    pub semester: Option<String>,
    pub group_id: Option<Uuid>,
    pub is_approved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Admin,
    Teacher,
    Student(StudentProfile),
}

impl Identity {
    pub fn role(&self) -> UserRole {
        match self {
            Identity::Admin => UserRole::Admin,
            Identity::Teacher => UserRole::Teacher,
            Identity::Student(_) => UserRole::Student,
        }
    }
}

/// The authenticated user a request acts on behalf of.
///
/// Resolved once per request from the validated access token and the stored
/// account, then passed explicitly to every permission check and service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub identity: Identity,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        matches!(self.identity, Identity::Admin)
    }

    pub fn is_teacher(&self) -> bool {
        matches!(self.identity, Identity::Teacher)
    }

    pub fn is_student(&self) -> bool {
        matches!(self.identity, Identity::Student(_))
    }

    pub fn student_profile(&self) -> Option<&StudentProfile> {
        match &self.identity {
            Identity::Student(profile) => Some(profile),
            _ => None,
        }
    }

    /// Group of a student caller; always `None` for staff.
    pub fn group_id(&self) -> Option<Uuid> {
        self.student_profile().and_then(|profile| profile.group_id)
    }

    pub fn role(&self) -> UserRole {
        self.identity.role()
    }
}

impl From<&user::Model> for Caller {
    fn from(user: &user::Model) -> Self {
        let identity = match user.role {
            UserRole::Admin => Identity::Admin,
            UserRole::Teacher => Identity::Teacher,
            UserRole::Student => Identity::Student(StudentProfile {
                student_id: user.student_id.clone(),
                program: user.program.clone(),
                semester: user.semester.clone(),
                group_id: user.group_id,
                is_approved: user.is_approved,
            }),
        };

        Caller {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name(),
            identity,
        }
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthenticated("Missing Authorization header".to_string()))?;

        let db = parts
            .extensions
            .get::<Arc<DatabaseConnection>>()
            .cloned()
            .ok_or_else(|| ApiError::Internal("Database connection not configured".to_string()))?;

        let user_id = claims
            .user_id()
            .ok_or_else(|| ApiError::Unauthenticated("Invalid user ID in token".to_string()))?;

        // The account is re-read on every request so role and approval
        // changes apply to tokens that were issued earlier.
        let user = user_service::find_by_id(db.as_ref(), user_id)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| ApiError::Unauthenticated("User not found".to_string()))?;

        // Tokens issued before a rejection stop working at once.
        if user.role == UserRole::Student && !user.is_approved {
            return Err(ApiError::Forbidden("Account pending approval".to_string()));
        }

        Ok(Caller::from(&user))
    }
}
