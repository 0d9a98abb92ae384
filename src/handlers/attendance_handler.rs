use axum::{
    extract::{Extension, Json, Query},
    response::{IntoResponse, Response},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::{
    api_docs::ErrorResponse,
    auth::caller::Caller,
    auth::permissions::{require_approved_student, require_teacher},
    entities::attendance::{
        AttendanceDTO, AttendanceFilter, AttendanceRequest, BulkAttendanceQuery,
        BulkAttendanceReport, BulkAttendanceRequest,
    },
    errors::ApiError,
    services::attendance_service,
};

#[utoipa::path(
    get,
    path = "/api/attendance",
    tag = "attendance",
    security(("bearer_auth" = [])),
    params(
        ("course_id" = Option<Uuid>, Query, description = "Course filter"),
        ("week" = Option<i32>, Query, description = "Week number filter")
    ),
    responses(
        (status = 200, description = "Attendance of the caller's courses", body = Vec<AttendanceDTO>),
        (status = 403, description = "Teacher access required", body = ErrorResponse)
    )
)]
pub async fn list_attendance(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Query(filter): Query<AttendanceFilter>,
) -> Result<Json<Vec<AttendanceDTO>>, ApiError> {
    require_teacher(&caller)?;
    Ok(Json(attendance_service::list_attendance(db.as_ref(), &caller, filter).await?))
}

#[utoipa::path(
    post,
    path = "/api/attendance",
    tag = "attendance",
    security(("bearer_auth" = [])),
    request_body = AttendanceRequest,
    responses(
        (status = 200, description = "Attendance created or updated", body = AttendanceDTO),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Not a teacher of the course", body = ErrorResponse),
        (status = 404, description = "Student or course not found", body = ErrorResponse)
    )
)]
pub async fn upsert_attendance(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Json(payload): Json<AttendanceRequest>,
) -> Result<Json<AttendanceDTO>, ApiError> {
    require_teacher(&caller)?;
    Ok(Json(attendance_service::upsert_attendance(db.as_ref(), &caller, payload).await?))
}

/// Returns the accepted records, or the full per-record report with `?report=true`.
#[utoipa::path(
    post,
    path = "/api/attendance/bulk",
    tag = "attendance",
    security(("bearer_auth" = [])),
    params(("report" = Option<bool>, Query, description = "Return accepted and skipped records")),
    request_body = BulkAttendanceRequest,
    responses(
        (status = 200, description = "Accepted records, or a report when requested", body = Vec<AttendanceDTO>),
        (status = 403, description = "Teacher access required", body = ErrorResponse)
    )
)]
pub async fn bulk_attendance(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
    Query(query): Query<BulkAttendanceQuery>,
    Json(payload): Json<BulkAttendanceRequest>,
) -> Result<Response, ApiError> {
    require_teacher(&caller)?;
    let report: BulkAttendanceReport =
        attendance_service::bulk_upsert(db.as_ref(), &caller, payload.attendance).await?;

    if query.report {
        Ok(Json(report).into_response())
    } else {
        Ok(Json(report.accepted).into_response())
    }
}

#[utoipa::path(
    get,
    path = "/api/attendance/my-attendance",
    tag = "attendance",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The caller's attendance", body = Vec<AttendanceDTO>),
        (status = 403, description = "Approved student access required", body = ErrorResponse)
    )
)]
pub async fn my_attendance(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    caller: Caller,
) -> Result<Json<Vec<AttendanceDTO>>, ApiError> {
    require_approved_student(&caller)?;
    Ok(Json(attendance_service::student_attendance(db.as_ref(), &caller).await?))
}
