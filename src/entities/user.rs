use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    #[sea_orm(unique)]
    pub student_id: Option<String>,
    pub program: Option<String>,
    pub semester: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub phone: String,
    pub address: String,
    pub profile_picture: Option<String>,
    pub is_approved: bool,
    pub rejection_reason: Option<String>,
    pub group_id: Option<Uuid>,
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id",
        on_delete = "SetNull"
    )]
    Group,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Full name when one is set, otherwise the username.
    pub fn display_name(&self) -> String {
        let full_name = format!("{} {}", self.first_name, self.last_name);
        let full_name = full_name.trim();
        if full_name.is_empty() {
            self.username.clone()
        } else {
            full_name.to_string()
        }
    }

    pub fn is_student(&self) -> bool {
        self.role == UserRole::Student
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum UserRole {
    #[sea_orm(string_value = "ADMIN")]
    #[serde(rename = "ADMIN")]
    Admin,
    #[sea_orm(string_value = "TEACHER")]
    #[serde(rename = "TEACHER")]
    Teacher,
    #[sea_orm(string_value = "STUDENT")]
    #[serde(rename = "STUDENT")]
    Student,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Teacher => "TEACHER",
            UserRole::Student => "STUDENT",
        }
    }

    /// Title-case name used in user-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::Teacher => "Teacher",
            UserRole::Student => "Student",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(role: &str) -> Result<Self, Self::Err> {
        match role {
            "ADMIN" => Ok(UserRole::Admin),
            "TEACHER" => Ok(UserRole::Teacher),
            "STUDENT" => Ok(UserRole::Student),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

// Self-registration request. Any submitted role is accepted and discarded:
// the account is always created as a pending student.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[schema(examples("jdoe"))]
    #[validate(length(min = 1, max = 150, message = "Username is required"))]
    pub username: String,
    #[schema(examples("john.doe@email.com"))]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[schema(examples("password123"))]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[validate(must_match(other = "password2", message = "Passwords don't match"))]
    pub password: String,
    pub password2: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[validate(length(max = 20, message = "Student id is too long"))]
    pub student_id: Option<String>,
    pub program: Option<String>,
    pub semester: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    #[validate(length(max = 15, message = "Phone number is too long"))]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub role: Option<String>,
}

// Login request model with validation
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[schema(examples("jdoe"))]
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[schema(examples("password123"))]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh: String,
}

// Admin-side teacher creation
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateTeacherRequest {
    #[validate(length(min = 1, max = 150, message = "Username is required"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
}

/// Profile update. Contact fields are editable by the owner; academic
/// fields are only honoured when an admin performs the update.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(length(max = 15, message = "Phone number is too long"))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub profile_picture: Option<String>,
    #[validate(length(max = 20, message = "Student id is too long"))]
    pub student_id: Option<String>,
    pub program: Option<String>,
    pub semester: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct RejectStudentRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AssignGroupRequest {
    pub student_id: Uuid,
    pub group_id: Uuid,
}

/// Data Transfer Object for User information
/// Contains only the non-sensitive user information
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDTO {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub student_id: Option<String>,
    pub program: Option<String>,
    pub semester: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub phone: String,
    pub address: String,
    pub profile_picture: Option<String>,
    pub is_approved: bool,
    pub rejection_reason: Option<String>,
    pub group_id: Option<Uuid>,
    pub group_name: Option<String>,
}

impl UserDTO {
    pub fn with_group_name(mut self, group_name: Option<String>) -> Self {
        self.group_name = group_name;
        self
    }
}

impl From<Model> for UserDTO {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            role: model.role,
            student_id: model.student_id,
            program: model.program,
            semester: model.semester,
            birth_date: model.birth_date,
            phone: model.phone,
            address: model.address,
            profile_picture: model.profile_picture,
            is_approved: model.is_approved,
            rejection_reason: model.rejection_reason,
            group_id: model.group_id,
            group_name: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserSearchDTO {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub role: UserRole,
    pub profile_picture: Option<String>,
}

impl From<Model> for UserSearchDTO {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            full_name: model.display_name(),
            username: model.username,
            role: model.role,
            profile_picture: model.profile_picture,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TeacherDTO {
    #[serde(flatten)]
    pub user: UserDTO,
    pub course_count: usize,
}
