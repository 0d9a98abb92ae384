use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::caller::Caller;
use crate::auth::password;
use crate::auth::permissions::{self, Access};
use crate::config::AdminSeed;
use crate::entities::prelude::*;
use crate::entities::user::{
    ActiveModel, Column, CreateTeacherRequest, Model, RegisterRequest, TeacherDTO,
    UpdateUserRequest, UserDTO, UserRole, UserSearchDTO,
};
use crate::entities::{
    attendance, course_assignment, course_file, grade, group, message, notification,
    schedule_session,
};
use crate::errors::ApiError;

pub async fn find_by_id<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<Option<Model>, ApiError> {
    Ok(User::find_by_id(user_id).one(db).await?)
}

pub async fn find_by_username<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> Result<Option<Model>, ApiError> {
    Ok(User::find()
        .filter(Column::Username.eq(username))
        .one(db)
        .await?)
}

/// Loads a user that must have the given role; any other user is reported
/// as not found.
pub async fn find_with_role<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    role: UserRole,
) -> Result<Model, ApiError> {
    find_by_id(db, user_id)
        .await?
        .filter(|user| user.role == role)
        .ok_or_else(|| match role {
            UserRole::Student => ApiError::not_found("Student"),
            UserRole::Teacher => ApiError::not_found("Teacher"),
            UserRole::Admin => ApiError::not_found("User"),
        })
}

async fn ensure_username_available(db: &DatabaseConnection, username: &str) -> Result<(), ApiError> {
    if find_by_username(db, username).await?.is_some() {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }
    Ok(())
}

async fn ensure_student_id_available(
    db: &DatabaseConnection,
    student_id: Option<&str>,
    except: Option<Uuid>,
) -> Result<(), ApiError> {
    let Some(student_id) = student_id else {
        return Ok(());
    };

    let existing = User::find()
        .filter(Column::StudentId.eq(student_id))
        .one(db)
        .await?;

    match existing {
        Some(user) if Some(user.id) != except => {
            Err(ApiError::Conflict("Student id already exists".to_string()))
        }
        _ => Ok(()),
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Self-registration. Always creates a student awaiting approval, whatever
/// role the request carries.
pub async fn register_student(db: &DatabaseConnection, request: RegisterRequest) -> Result<Model, ApiError> {
    if let Some(role) = request.role.as_deref() {
        if role != UserRole::Student.as_str() {
            tracing::warn!(
                "Ignoring role {} submitted during registration of {}",
                role,
                request.username
            );
        }
    }

    ensure_username_available(db, &request.username).await?;
    let student_id = blank_to_none(request.student_id);
    ensure_student_id_available(db, student_id.as_deref(), None).await?;

    let password_hash = password::hash_password(&request.password)?;
    let now = Utc::now();

    let user = ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(request.username),
        email: Set(request.email),
        password_hash: Set(password_hash),
        first_name: Set(request.first_name),
        last_name: Set(request.last_name),
        role: Set(UserRole::Student),
        student_id: Set(student_id),
        program: Set(blank_to_none(request.program)),
        semester: Set(blank_to_none(request.semester)),
        birth_date: Set(request.birth_date),
        phone: Set(request.phone),
        address: Set(request.address),
        profile_picture: Set(None),
        is_approved: Set(false),
        rejection_reason: Set(None),
        group_id: Set(None),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let student = user.insert(db).await?;
    tracing::info!("Registered student {} pending approval", student.username);
    Ok(student)
}

pub async fn create_teacher(
    db: &DatabaseConnection,
    request: CreateTeacherRequest,
) -> Result<Model, ApiError> {
    ensure_username_available(db, &request.username).await?;

    let password_hash = password::hash_password(&request.password)?;
    let now = Utc::now();

    let user = ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(request.username),
        email: Set(request.email),
        password_hash: Set(password_hash),
        first_name: Set(request.first_name),
        last_name: Set(request.last_name),
        role: Set(UserRole::Teacher),
        student_id: Set(None),
        program: Set(None),
        semester: Set(None),
        birth_date: Set(None),
        phone: Set(request.phone),
        address: Set(String::new()),
        profile_picture: Set(None),
        is_approved: Set(true),
        rejection_reason: Set(None),
        group_id: Set(None),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let teacher = user.insert(db).await?;
    tracing::info!("Created teacher account {}", teacher.username);
    Ok(teacher)
}

/// Creates the configured admin account unless the username is taken.
/// Returns the new account, or `None` when nothing was created.
pub async fn seed_admin(db: &DatabaseConnection, seed: &AdminSeed) -> Result<Option<Model>, ApiError> {
    if find_by_username(db, &seed.username).await?.is_some() {
        tracing::debug!("Admin {} already exists", seed.username);
        return Ok(None);
    }

    let now = Utc::now();
    let admin = ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(seed.username.clone()),
        email: Set(seed.email.clone()),
        password_hash: Set(password::hash_password(&seed.password)?),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        role: Set(UserRole::Admin),
        student_id: Set(None),
        program: Set(None),
        semester: Set(None),
        birth_date: Set(None),
        phone: Set(String::new()),
        address: Set(String::new()),
        profile_picture: Set(None),
        is_approved: Set(true),
        rejection_reason: Set(None),
        group_id: Set(None),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    tracing::info!("Seeded admin account {}", admin.username);
    Ok(Some(admin))
}

pub async fn to_dto<C: ConnectionTrait>(db: &C, user: Model) -> Result<UserDTO, ApiError> {
    let group_name = match user.group_id {
        Some(group_id) => Group::find_by_id(group_id).one(db).await?.map(|g| g.name),
        None => None,
    };
    Ok(UserDTO::from(user).with_group_name(group_name))
}

pub async fn to_dtos(db: &DatabaseConnection, users: Vec<Model>) -> Result<Vec<UserDTO>, ApiError> {
    let groups = Group::find().all(db).await?;
    Ok(users
        .into_iter()
        .map(|user| {
            let group_name = user
                .group_id
                .and_then(|id| groups.iter().find(|g| g.id == id))
                .map(|g| g.name.clone());
            UserDTO::from(user).with_group_name(group_name)
        })
        .collect())
}

/// Profile update gated by owner-or-admin. Academic fields are only applied
/// for admins.
pub async fn update_user(
    db: &DatabaseConnection,
    caller: &Caller,
    user_id: Uuid,
    request: UpdateUserRequest,
) -> Result<Model, ApiError> {
    let user = find_by_id(db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    if !permissions::is_owner_or_admin(caller, user.id, Access::Write) {
        return Err(ApiError::Forbidden(
            "You can only update your own profile".to_string(),
        ));
    }

    let mut model: ActiveModel = user.clone().into();
    if let Some(email) = request.email {
        model.email = Set(email);
    }
    if let Some(first_name) = request.first_name {
        model.first_name = Set(first_name);
    }
    if let Some(last_name) = request.last_name {
        model.last_name = Set(last_name);
    }
    if let Some(phone) = request.phone {
        model.phone = Set(phone);
    }
    if let Some(address) = request.address {
        model.address = Set(address);
    }
    if let Some(birth_date) = request.birth_date {
        model.birth_date = Set(Some(birth_date));
    }
    if let Some(profile_picture) = request.profile_picture {
        model.profile_picture = Set(blank_to_none(Some(profile_picture)));
    }

    if caller.is_admin() && user.is_student() {
        if let Some(student_id) = request.student_id {
            let student_id = blank_to_none(Some(student_id));
            ensure_student_id_available(db, student_id.as_deref(), Some(user.id)).await?;
            model.student_id = Set(student_id);
        }
        if let Some(program) = request.program {
            model.program = Set(blank_to_none(Some(program)));
        }
        if let Some(semester) = request.semester {
            model.semester = Set(blank_to_none(Some(semester)));
        }
    }

    model.updated_at = Set(Utc::now());
    Ok(model.update(db).await?)
}

/// Active users the caller may contact: staff and approved students, never
/// the caller.
pub async fn search_users(
    db: &DatabaseConnection,
    caller: &Caller,
    query: Option<&str>,
) -> Result<Vec<UserSearchDTO>, ApiError> {
    let visible = Condition::any()
        .add(
            Condition::all()
                .add(Column::Role.eq(UserRole::Student))
                .add(Column::IsApproved.eq(true)),
        )
        .add(Column::Role.ne(UserRole::Student));

    let mut select = User::find()
        .filter(Column::IsActive.eq(true))
        .filter(visible)
        .filter(Column::Id.ne(caller.id));

    if let Some(term) = query.map(str::trim).filter(|t| !t.is_empty()) {
        select = select.filter(
            Condition::any()
                .add(Column::FirstName.contains(term))
                .add(Column::LastName.contains(term))
                .add(Column::Username.contains(term))
                .add(Column::Email.contains(term)),
        );
    }

    let users = select.order_by_asc(Column::Username).all(db).await?;
    Ok(users.into_iter().map(UserSearchDTO::from).collect())
}

#[derive(Debug, Default, Deserialize)]
pub struct StudentFilter {
    pub is_approved: Option<bool>,
    pub group_id: Option<Uuid>,
    pub search: Option<String>,
}

pub async fn list_students(db: &DatabaseConnection, filter: StudentFilter) -> Result<Vec<Model>, ApiError> {
    let mut select = User::find().filter(Column::Role.eq(UserRole::Student));

    if let Some(is_approved) = filter.is_approved {
        select = select.filter(Column::IsApproved.eq(is_approved));
    }
    if let Some(group_id) = filter.group_id {
        select = select.filter(Column::GroupId.eq(group_id));
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        select = select.filter(
            Condition::any()
                .add(Column::Username.contains(term))
                .add(Column::FirstName.contains(term))
                .add(Column::LastName.contains(term))
                .add(Column::Email.contains(term))
                .add(Column::StudentId.contains(term)),
        );
    }

    Ok(select.order_by_asc(Column::Username).all(db).await?)
}

pub async fn list_pending_students(db: &DatabaseConnection) -> Result<Vec<Model>, ApiError> {
    list_students(
        db,
        StudentFilter {
            is_approved: Some(false),
            ..Default::default()
        },
    )
    .await
}

pub async fn list_teachers(db: &DatabaseConnection) -> Result<Vec<TeacherDTO>, ApiError> {
    let teachers = User::find()
        .filter(Column::Role.eq(UserRole::Teacher))
        .order_by_asc(Column::Username)
        .all(db)
        .await?;

    let mut result = Vec::with_capacity(teachers.len());
    for teacher in teachers {
        let course_count = CourseAssignment::find()
            .filter(course_assignment::Column::TeacherId.eq(teacher.id))
            .count(db)
            .await? as usize;
        result.push(TeacherDTO {
            user: UserDTO::from(teacher),
            course_count,
        });
    }
    Ok(result)
}

pub async fn assign_to_group(
    db: &DatabaseConnection,
    student_id: Uuid,
    group_id: Uuid,
) -> Result<(Model, group::Model), ApiError> {
    let student = find_with_role(db, student_id, UserRole::Student).await?;
    let group = Group::find_by_id(group_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Group"))?;

    let mut model: ActiveModel = student.into();
    model.group_id = Set(Some(group.id));
    model.updated_at = Set(Utc::now());
    let student = model.update(db).await?;

    tracing::info!("Assigned student {} to group {}", student.username, group.name);
    Ok((student, group))
}

/// Deletes a user of the given role together with everything they own.
pub async fn delete_user_with_role(
    db: &DatabaseConnection,
    user_id: Uuid,
    role: UserRole,
) -> Result<(), ApiError> {
    let user = find_with_role(db, user_id, role).await?;

    let txn = db.begin().await?;

    Grade::delete_many()
        .filter(grade::Column::StudentId.eq(user.id))
        .exec(&txn)
        .await?;
    Attendance::delete_many()
        .filter(attendance::Column::StudentId.eq(user.id))
        .exec(&txn)
        .await?;
    CourseFile::delete_many()
        .filter(course_file::Column::UploadedBy.eq(user.id))
        .exec(&txn)
        .await?;
    Message::delete_many()
        .filter(
            Condition::any()
                .add(message::Column::SenderId.eq(user.id))
                .add(message::Column::ReceiverId.eq(user.id)),
        )
        .exec(&txn)
        .await?;
    Notification::delete_many()
        .filter(notification::Column::UserId.eq(user.id))
        .exec(&txn)
        .await?;

    let assignment_ids: Vec<Uuid> = CourseAssignment::find()
        .filter(course_assignment::Column::TeacherId.eq(user.id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|a| a.id)
        .collect();
    if !assignment_ids.is_empty() {
        ScheduleSession::delete_many()
            .filter(schedule_session::Column::AssignmentId.is_in(assignment_ids.clone()))
            .exec(&txn)
            .await?;
        CourseAssignment::delete_many()
            .filter(course_assignment::Column::Id.is_in(assignment_ids))
            .exec(&txn)
            .await?;
    }

    User::delete_by_id(user.id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!("Deleted {} account {}", role, user.username);
    Ok(())
}
