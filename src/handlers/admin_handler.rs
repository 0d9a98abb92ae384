use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    api_docs::{ErrorResponse, MessageResponse, RejectionResponse, UserActionResponse},
    auth::caller::Caller,
    auth::permissions::require_admin,
    entities::course_assignment::{AssignmentDTO, AssignmentFilter, AssignmentRequest, EnrollmentResponse},
    entities::user::{
        AssignGroupRequest, CreateTeacherRequest, RejectStudentRequest, TeacherDTO, UserDTO,
        UserRole,
    },
    errors::ApiError,
    services::user_service::{self, StudentFilter},
    services::{approval_service, course_service, grade_service},
};

#[utoipa::path(
    get,
    path = "/api/admin/pending-students",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Students awaiting approval", body = Vec<UserDTO>),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    )
)]
pub async fn pending_students(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
) -> Result<Json<Vec<UserDTO>>, ApiError> {
    require_admin(&caller)?;
    let students = user_service::list_pending_students(db.as_ref()).await?;
    Ok(Json(user_service::to_dtos(db.as_ref(), students).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/approve-student/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Account approved", body = UserActionResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn approve_student(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<UserActionResponse>, ApiError> {
    require_admin(&caller)?;
    let user = approval_service::approve(db.as_ref(), id).await?;
    Ok(Json(UserActionResponse {
        message: format!("{} approved successfully", user.role.label()),
        user: user_service::to_dto(db.as_ref(), user).await?,
    }))
}

#[utoipa::path(
    post,
    path = "/api/admin/reject-student/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    request_body = RejectStudentRequest,
    responses(
        (status = 200, description = "Account rejected", body = RejectionResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn reject_student(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    payload: Option<Json<RejectStudentRequest>>,
) -> Result<Json<RejectionResponse>, ApiError> {
    require_admin(&caller)?;
    let reason = payload.and_then(|Json(body)| body.reason);
    let (user, reason) = approval_service::reject(db.as_ref(), id, reason).await?;
    Ok(Json(RejectionResponse {
        message: format!("{} rejected", user.role.label()),
        reason,
    }))
}

#[utoipa::path(
    get,
    path = "/api/admin/students",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("is_approved" = Option<bool>, Query, description = "Approval filter"),
        ("group_id" = Option<Uuid>, Query, description = "Group filter"),
        ("search" = Option<String>, Query, description = "Name, username, email or student id")
    ),
    responses(
        (status = 200, description = "Students", body = Vec<UserDTO>),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    )
)]
pub async fn list_students(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Query(filter): Query<StudentFilter>,
) -> Result<Json<Vec<UserDTO>>, ApiError> {
    require_admin(&caller)?;
    let students = user_service::list_students(db.as_ref(), filter).await?;
    Ok(Json(user_service::to_dtos(db.as_ref(), students).await?))
}

#[utoipa::path(
    delete,
    path = "/api/admin/students/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Student id")),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    )
)]
pub async fn delete_student(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_admin(&caller)?;
    user_service::delete_user_with_role(db.as_ref(), id, UserRole::Student).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/admin/assign-group",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = AssignGroupRequest,
    responses(
        (status = 200, description = "Student assigned", body = MessageResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Student or group not found", body = ErrorResponse)
    )
)]
pub async fn assign_group(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Json(payload): Json<AssignGroupRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_admin(&caller)?;
    let (student, group) =
        user_service::assign_to_group(db.as_ref(), payload.student_id, payload.group_id).await?;
    Ok(Json(MessageResponse::new(format!(
        "Student {} assigned to group {}",
        student.display_name(),
        group.name
    ))))
}

#[utoipa::path(
    get,
    path = "/api/admin/teachers",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Teachers with their assignment count", body = Vec<TeacherDTO>),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    )
)]
pub async fn list_teachers(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
) -> Result<Json<Vec<TeacherDTO>>, ApiError> {
    require_admin(&caller)?;
    Ok(Json(user_service::list_teachers(db.as_ref()).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/teachers/create",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateTeacherRequest,
    responses(
        (status = 201, description = "Teacher created", body = UserActionResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 409, description = "Username already exists", body = ErrorResponse)
    )
)]
pub async fn create_teacher(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Json(payload): Json<CreateTeacherRequest>,
) -> Result<(StatusCode, Json<UserActionResponse>), ApiError> {
    require_admin(&caller)?;
    payload.validate()?;

    let teacher = user_service::create_teacher(db.as_ref(), payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserActionResponse {
            message: "Teacher created successfully".to_string(),
            user: UserDTO::from(teacher),
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/admin/teachers/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Teacher id")),
    responses(
        (status = 204, description = "Teacher deleted"),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Teacher not found", body = ErrorResponse)
    )
)]
pub async fn delete_teacher(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_admin(&caller)?;
    user_service::delete_user_with_role(db.as_ref(), id, UserRole::Teacher).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/admin/assignments",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("group_id" = Option<Uuid>, Query, description = "Group filter"),
        ("teacher_id" = Option<Uuid>, Query, description = "Teacher filter"),
        ("course_id" = Option<Uuid>, Query, description = "Course filter")
    ),
    responses(
        (status = 200, description = "Course assignments", body = Vec<AssignmentDTO>),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    )
)]
pub async fn list_assignments(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Query(filter): Query<AssignmentFilter>,
) -> Result<Json<Vec<AssignmentDTO>>, ApiError> {
    require_admin(&caller)?;
    let assignments = course_service::list_assignments(db.as_ref(), filter).await?;
    Ok(Json(course_service::assignment_dtos(db.as_ref(), assignments).await?))
}

async fn single_assignment(db: &DatabaseConnection, id: Uuid) -> Result<AssignmentDTO, ApiError> {
    let assignment = course_service::find_assignment(db, id).await?;
    course_service::assignment_dtos(db, vec![assignment])
        .await?
        .pop()
        .ok_or_else(|| ApiError::not_found("Assignment"))
}

#[utoipa::path(
    post,
    path = "/api/admin/assignments",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = AssignmentRequest,
    responses(
        (status = 201, description = "Assignment created", body = AssignmentDTO),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Teacher, course or group not found", body = ErrorResponse),
        (status = 409, description = "Course already assigned to the group for that year", body = ErrorResponse)
    )
)]
pub async fn create_assignment(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Json(payload): Json<AssignmentRequest>,
) -> Result<(StatusCode, Json<AssignmentDTO>), ApiError> {
    require_admin(&caller)?;
    payload.validate()?;

    let assignment = course_service::create_assignment(db.as_ref(), payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(single_assignment(db.as_ref(), assignment.id).await?),
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/assignments/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Assignment id")),
    responses(
        (status = 200, description = "Assignment", body = AssignmentDTO),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse)
    )
)]
pub async fn get_assignment(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<AssignmentDTO>, ApiError> {
    require_admin(&caller)?;
    Ok(Json(single_assignment(db.as_ref(), id).await?))
}

#[utoipa::path(
    put,
    path = "/api/admin/assignments/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Assignment id")),
    request_body = AssignmentRequest,
    responses(
        (status = 200, description = "Assignment updated", body = AssignmentDTO),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse),
        (status = 409, description = "Course already assigned to the group for that year", body = ErrorResponse)
    )
)]
pub async fn update_assignment(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignmentRequest>,
) -> Result<Json<AssignmentDTO>, ApiError> {
    require_admin(&caller)?;
    payload.validate()?;

    let assignment = course_service::update_assignment(db.as_ref(), id, payload).await?;
    Ok(Json(single_assignment(db.as_ref(), assignment.id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/admin/assignments/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Assignment id")),
    responses(
        (status = 204, description = "Assignment deleted"),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse)
    )
)]
pub async fn delete_assignment(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_admin(&caller)?;
    course_service::delete_assignment(db.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/admin/assignments/{id}/enroll",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Assignment id")),
    responses(
        (status = 200, description = "Missing grade records created", body = EnrollmentResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse)
    )
)]
pub async fn enroll_assignment(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<EnrollmentResponse>, ApiError> {
    require_admin(&caller)?;
    let created = grade_service::enroll_assignment(db.as_ref(), id).await?;
    Ok(Json(EnrollmentResponse {
        assignment_id: id,
        created,
    }))
}
