use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::auth::caller::Caller;
use crate::auth::permissions::{self, CourseBound};
use crate::entities::attendance::{
    self, AttendanceDTO, AttendanceFilter, AttendanceRequest, BulkAttendanceReport, SkipReason,
    SkippedRecord,
};
use crate::entities::course;
use crate::entities::prelude::*;
use crate::entities::user::{self, UserRole};
use crate::errors::ApiError;
use crate::services::{course_service, user_service};

/// Writes the record keyed on (student, course, week_number), creating it if needed.
async fn upsert_record<C: ConnectionTrait>(
    db: &C,
    request: AttendanceRequest,
) -> Result<attendance::Model, ApiError> {
    let date = request.date.unwrap_or_else(|| Utc::now().date_naive());

    Attendance::insert(attendance::ActiveModel {
        id: Set(Uuid::new_v4()),
        student_id: Set(request.student),
        course_id: Set(request.course),
        date: Set(date),
        week_number: Set(request.week_number),
        status: Set(request.status),
        notes: Set(request.notes.clone()),
        created_at: Set(Utc::now()),
    })
    .on_conflict(
        OnConflict::columns([
            attendance::Column::StudentId,
            attendance::Column::CourseId,
            attendance::Column::WeekNumber,
        ])
        .do_nothing()
        .to_owned(),
    )
    .exec_without_returning(db)
    .await?;

    let existing = Attendance::find()
        .filter(attendance::Column::StudentId.eq(request.student))
        .filter(attendance::Column::CourseId.eq(request.course))
        .filter(attendance::Column::WeekNumber.eq(request.week_number))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::Internal("Attendance row vanished after upsert".to_string()))?;

    let mut model: attendance::ActiveModel = existing.into();
    model.status = Set(request.status);
    model.notes = Set(request.notes);
    if let Some(date) = request.date {
        model.date = Set(date);
    }
    Ok(model.update(db).await?)
}

async fn teaches(db: &DatabaseConnection, caller: &Caller, course: &course::Model) -> Result<bool, ApiError> {
    let teachers = course_service::course_teacher_ids(db, course.id).await?;
    Ok(permissions::is_teacher_of_course(
        caller,
        &CourseBound::new(course, teachers),
    ))
}

/// Records attendance of one student for one course week.
pub async fn upsert_attendance(
    db: &DatabaseConnection,
    caller: &Caller,
    request: AttendanceRequest,
) -> Result<AttendanceDTO, ApiError> {
    request.validate()?;

    let student = user_service::find_with_role(db, request.student, UserRole::Student).await?;
    let course = course_service::find_course(db, request.course).await?;
    if !teaches(db, caller, &course).await? {
        return Err(ApiError::Forbidden(format!(
            "You are not assigned to course {}",
            course.code
        )));
    }

    let txn = db.begin().await?;
    let record = upsert_record(&txn, request).await?;
    txn.commit().await?;

    Ok(AttendanceDTO::new(record, Some(&student), Some(&course)))
}

/// Processes each record on its own. Records the caller may not write are
/// skipped and reported with the reason; the others are upserted.
pub async fn bulk_upsert(
    db: &DatabaseConnection,
    caller: &Caller,
    records: Vec<AttendanceRequest>,
) -> Result<BulkAttendanceReport, ApiError> {
    let mut report = BulkAttendanceReport::default();
    let mut teaching: HashMap<Uuid, Option<course::Model>> = HashMap::new();

    for (index, request) in records.into_iter().enumerate() {
        let skip = |reason| SkippedRecord {
            index,
            student: request.student,
            course: request.course,
            reason,
        };

        if request.validate().is_err() {
            report.skipped.push(skip(SkipReason::InvalidWeekNumber));
            continue;
        }

        let course = match teaching.get(&request.course) {
            Some(cached) => cached.clone(),
            None => {
                let course = Course::find_by_id(request.course).one(db).await?;
                let allowed = match &course {
                    Some(course) => teaches(db, caller, course).await?,
                    None => false,
                };
                let entry = course.filter(|_| allowed);
                teaching.insert(request.course, entry.clone());
                entry
            }
        };
        let Some(course) = course else {
            report.skipped.push(skip(SkipReason::NotTeacherOfCourse));
            continue;
        };

        let Some(student) = user_service::find_by_id(db, request.student)
            .await?
            .filter(|s| s.role == UserRole::Student)
        else {
            report.skipped.push(skip(SkipReason::StudentNotFound));
            continue;
        };

        let txn = db.begin().await?;
        let record = upsert_record(&txn, request).await?;
        txn.commit().await?;

        report
            .accepted
            .push(AttendanceDTO::new(record, Some(&student), Some(&course)));
    }

    tracing::info!(
        "Bulk attendance by {}: {} accepted, {} skipped",
        caller.username,
        report.accepted.len(),
        report.skipped.len()
    );
    Ok(report)
}

/// Attendance of the courses the caller teaches.
pub async fn list_attendance(
    db: &DatabaseConnection,
    caller: &Caller,
    filter: AttendanceFilter,
) -> Result<Vec<AttendanceDTO>, ApiError> {
    let mut select = Attendance::find();
    if !caller.is_admin() {
        let courses = course_service::taught_course_ids(db, caller.id).await?;
        select = select.filter(attendance::Column::CourseId.is_in(courses));
    }
    if let Some(course_id) = filter.course_id {
        select = select.filter(attendance::Column::CourseId.eq(course_id));
    }
    if let Some(week) = filter.week {
        select = select.filter(attendance::Column::WeekNumber.eq(week));
    }

    let records = select
        .order_by_asc(attendance::Column::WeekNumber)
        .order_by_asc(attendance::Column::Date)
        .all(db)
        .await?;
    attendance_dtos(db, records).await
}

pub async fn student_attendance(
    db: &DatabaseConnection,
    caller: &Caller,
) -> Result<Vec<AttendanceDTO>, ApiError> {
    let records = Attendance::find()
        .filter(attendance::Column::StudentId.eq(caller.id))
        .order_by_asc(attendance::Column::WeekNumber)
        .all(db)
        .await?;
    attendance_dtos(db, records).await
}

async fn attendance_dtos(
    db: &DatabaseConnection,
    records: Vec<attendance::Model>,
) -> Result<Vec<AttendanceDTO>, ApiError> {
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let student_ids: Vec<Uuid> = records.iter().map(|r| r.student_id).collect();
    let course_ids: Vec<Uuid> = records.iter().map(|r| r.course_id).collect();

    let students: HashMap<Uuid, user::Model> = User::find()
        .filter(user::Column::Id.is_in(student_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();
    let courses: HashMap<Uuid, course::Model> = Course::find()
        .filter(course::Column::Id.is_in(course_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    Ok(records
        .into_iter()
        .map(|r| {
            let student = students.get(&r.student_id);
            let course = courses.get(&r.course_id);
            AttendanceDTO::new(r, student, course)
        })
        .collect())
}
