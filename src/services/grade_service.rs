use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::auth::caller::Caller;
use crate::auth::permissions::{self, CourseBound};
use crate::entities::course_assignment;
use crate::entities::grade::{self, GradeDTO, GradeFilter, GradeMarks, UpsertGradeRequest};
use crate::entities::prelude::*;
use crate::entities::user::{self, UserRole};
use crate::entities::course;
use crate::errors::ApiError;
use crate::services::{course_service, user_service};

fn check_marks(marks: &GradeMarks) -> Result<(), ApiError> {
    match marks.out_of_range() {
        Some(field) => Err(ApiError::Validation(format!(
            "{} must be between {} and {}",
            field,
            grade::MIN_MARK,
            grade::MAX_MARK
        ))),
        None => Ok(()),
    }
}

fn apply_marks(model: &mut grade::ActiveModel, marks: GradeMarks) {
    if let Some(td_mark) = marks.td_mark {
        model.td_mark = Set(td_mark);
    }
    if let Some(tp_mark) = marks.tp_mark {
        model.tp_mark = Set(tp_mark);
    }
    if let Some(exam_mark) = marks.exam_mark {
        model.exam_mark = Set(exam_mark);
    }
    if let Some(comments) = marks.comments {
        model.comments = Set(comments);
    }
    model.updated_at = Set(Utc::now());
}

fn empty_grade(student_id: Uuid, course_id: Uuid) -> grade::ActiveModel {
    let now = Utc::now();
    grade::ActiveModel {
        id: Set(Uuid::new_v4()),
        student_id: Set(student_id),
        course_id: Set(course_id),
        td_mark: Set(None),
        tp_mark: Set(None),
        exam_mark: Set(None),
        comments: Set(String::new()),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

fn on_student_course() -> OnConflict {
    OnConflict::columns([grade::Column::StudentId, grade::Column::CourseId])
        .do_nothing()
        .to_owned()
}

/// Returns the grade row for the pair, creating an empty one if it is missing.
/// A concurrent creator wins the insert and this call reads its row.
async fn get_or_create<C: ConnectionTrait>(
    db: &C,
    student_id: Uuid,
    course_id: Uuid,
) -> Result<grade::Model, ApiError> {
    Grade::insert(empty_grade(student_id, course_id))
        .on_conflict(on_student_course())
        .exec_without_returning(db)
        .await?;

    Grade::find()
        .filter(grade::Column::StudentId.eq(student_id))
        .filter(grade::Column::CourseId.eq(course_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::Internal("Grade row vanished after upsert".to_string()))
}

async fn ensure_teaches(
    db: &DatabaseConnection,
    caller: &Caller,
    course: &course::Model,
) -> Result<(), ApiError> {
    let teachers = course_service::course_teacher_ids(db, course.id).await?;
    if permissions::is_teacher_of_course(caller, &CourseBound::new(course, teachers)) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "You are not assigned to course {}",
            course.code
        )))
    }
}

/// Creates or updates the single grade of (student, course).
pub async fn upsert_grade(
    db: &DatabaseConnection,
    caller: &Caller,
    request: UpsertGradeRequest,
) -> Result<GradeDTO, ApiError> {
    check_marks(&request.marks)?;

    let student = user_service::find_with_role(db, request.student, UserRole::Student).await?;
    let course = course_service::find_course(db, request.course).await?;
    ensure_teaches(db, caller, &course).await?;

    let txn = db.begin().await?;
    let existing = get_or_create(&txn, student.id, course.id).await?;
    let mut model: grade::ActiveModel = existing.into();
    apply_marks(&mut model, request.marks);
    let saved = model.update(&txn).await?;
    txn.commit().await?;

    tracing::debug!("Saved grade of {} for {}", student.username, course.code);
    Ok(GradeDTO::new(saved, Some(&student), Some(&course)))
}

/// Updates a grade by id. Grades of courses the caller does not teach are
/// reported as missing.
pub async fn update_grade(
    db: &DatabaseConnection,
    caller: &Caller,
    grade_id: Uuid,
    marks: GradeMarks,
) -> Result<GradeDTO, ApiError> {
    check_marks(&marks)?;

    let existing = Grade::find_by_id(grade_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Grade"))?;

    let teachers = course_service::course_teacher_ids(db, existing.course_id).await?;
    if !permissions::is_teacher_of_course(caller, &CourseBound::new(&existing, teachers)) {
        return Err(ApiError::not_found("Grade"));
    }

    let mut model: grade::ActiveModel = existing.into();
    apply_marks(&mut model, marks);
    let saved = model.update(db).await?;

    let student = user_service::find_by_id(db, saved.student_id).await?;
    let course = Course::find_by_id(saved.course_id).one(db).await?;
    Ok(GradeDTO::new(saved, student.as_ref(), course.as_ref()))
}

/// Grades of every course the caller teaches, optionally narrowed to one course.
pub async fn list_grades(
    db: &DatabaseConnection,
    caller: &Caller,
    filter: GradeFilter,
) -> Result<Vec<GradeDTO>, ApiError> {
    let mut select = Grade::find();
    if !caller.is_admin() {
        let courses = course_service::taught_course_ids(db, caller.id).await?;
        select = select.filter(grade::Column::CourseId.is_in(courses));
    }
    if let Some(course_id) = filter.course_id {
        select = select.filter(grade::Column::CourseId.eq(course_id));
    }

    let grades = select.order_by_asc(grade::Column::CreatedAt).all(db).await?;
    grade_dtos(db, grades).await
}

pub async fn student_grades(db: &DatabaseConnection, caller: &Caller) -> Result<Vec<GradeDTO>, ApiError> {
    let grades = Grade::find()
        .filter(grade::Column::StudentId.eq(caller.id))
        .order_by_asc(grade::Column::CreatedAt)
        .all(db)
        .await?;
    grade_dtos(db, grades).await
}

/// Makes sure every student of the assignment's group has a grade row for the
/// assignment's course. Safe to call repeatedly; returns how many rows were
/// created by this call.
pub async fn ensure_enrollment_records<C: ConnectionTrait>(
    db: &C,
    assignment: &course_assignment::Model,
) -> Result<u64, ApiError> {
    let students: Vec<Uuid> = User::find()
        .filter(user::Column::Role.eq(UserRole::Student))
        .filter(user::Column::GroupId.eq(assignment.group_id))
        .all(db)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();
    if students.is_empty() {
        return Ok(0);
    }

    let graded: HashSet<Uuid> = Grade::find()
        .filter(grade::Column::CourseId.eq(assignment.course_id))
        .filter(grade::Column::StudentId.is_in(students.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|g| g.student_id)
        .collect();

    let missing: Vec<grade::ActiveModel> = students
        .into_iter()
        .filter(|id| !graded.contains(id))
        .map(|id| empty_grade(id, assignment.course_id))
        .collect();
    if missing.is_empty() {
        return Ok(0);
    }

    let created = Grade::insert_many(missing)
        .on_conflict(on_student_course())
        .exec_without_returning(db)
        .await?;

    if created > 0 {
        tracing::info!(
            "Created {} grade records for assignment {}",
            created,
            assignment.id
        );
    }
    Ok(created)
}

/// Explicit enrollment of an assignment's group. Admin only, gated by the handler.
pub async fn enroll_assignment(db: &DatabaseConnection, assignment_id: Uuid) -> Result<u64, ApiError> {
    let assignment = course_service::find_assignment(db, assignment_id).await?;
    ensure_enrollment_records(db, &assignment).await
}

/// The assignment's course grades for the students of its group. Assignments
/// the caller does not teach are reported as missing.
pub async fn course_roster(
    db: &DatabaseConnection,
    caller: &Caller,
    assignment_id: Uuid,
) -> Result<Vec<GradeDTO>, ApiError> {
    let assignment = course_service::find_assignment(db, assignment_id).await?;
    if !permissions::is_teacher_of_course(caller, &assignment) {
        return Err(ApiError::not_found("Assignment"));
    }

    ensure_enrollment_records(db, &assignment).await?;

    let students: HashMap<Uuid, user::Model> = User::find()
        .filter(user::Column::Role.eq(UserRole::Student))
        .filter(user::Column::GroupId.eq(assignment.group_id))
        .order_by_asc(user::Column::LastName)
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();
    let course = course_service::find_course(db, assignment.course_id).await?;

    let grades = Grade::find()
        .filter(grade::Column::CourseId.eq(course.id))
        .filter(grade::Column::StudentId.is_in(students.keys().copied().collect::<Vec<_>>()))
        .all(db)
        .await?;

    let mut roster: Vec<GradeDTO> = grades
        .into_iter()
        .map(|g| {
            let student = students.get(&g.student_id);
            GradeDTO::new(g, student, Some(&course))
        })
        .collect();
    roster.sort_by(|a, b| a.student_name.cmp(&b.student_name));
    Ok(roster)
}

async fn grade_dtos(db: &DatabaseConnection, grades: Vec<grade::Model>) -> Result<Vec<GradeDTO>, ApiError> {
    if grades.is_empty() {
        return Ok(Vec::new());
    }

    let student_ids: Vec<Uuid> = grades.iter().map(|g| g.student_id).collect();
    let course_ids: Vec<Uuid> = grades.iter().map(|g| g.course_id).collect();

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

    Ok(grades
        .into_iter()
        .map(|g| {
            let student = students.get(&g.student_id);
            let course = courses.get(&g.course_id);
            GradeDTO::new(g, student, course)
        })
        .collect())
}
