use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::caller::Caller;
use crate::entities::course::{self, CreateCourseRequest, UpdateCourseRequest};
use crate::entities::course_assignment::{
    self, AssignmentDTO, AssignmentFilter, AssignmentRequest,
};
use crate::entities::group::{self, CreateGroupRequest, GroupDTO, UpdateGroupRequest};
use crate::entities::prelude::*;
use crate::entities::user::{self, UserRole};
use crate::entities::{
    attendance, course_file, grade, group_course, schedule_session, timetable,
};
use crate::errors::ApiError;
use crate::services::user_service;

// Courses

pub async fn list_courses(db: &DatabaseConnection) -> Result<Vec<course::Model>, ApiError> {
    Ok(Course::find()
        .order_by_asc(course::Column::Code)
        .all(db)
        .await?)
}

pub async fn find_course<C: ConnectionTrait>(db: &C, course_id: Uuid) -> Result<course::Model, ApiError> {
    Course::find_by_id(course_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Course"))
}

async fn ensure_course_code_available(
    db: &DatabaseConnection,
    code: &str,
    except: Option<Uuid>,
) -> Result<(), ApiError> {
    let existing = Course::find()
        .filter(course::Column::Code.eq(code))
        .one(db)
        .await?;
    match existing {
        Some(c) if Some(c.id) != except => Err(ApiError::Conflict(format!(
            "Course with code {} already exists",
            code
        ))),
        _ => Ok(()),
    }
}

pub async fn create_course(
    db: &DatabaseConnection,
    request: CreateCourseRequest,
) -> Result<course::Model, ApiError> {
    ensure_course_code_available(db, &request.code, None).await?;

    let course = course::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(request.code),
        name: Set(request.name),
        description: Set(request.description),
        credits: Set(request.credits),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    tracing::info!("Created course {}", course.code);
    Ok(course)
}

pub async fn update_course(
    db: &DatabaseConnection,
    course_id: Uuid,
    request: UpdateCourseRequest,
) -> Result<course::Model, ApiError> {
    let existing = find_course(db, course_id).await?;
    let mut model: course::ActiveModel = existing.into();

    if let Some(code) = request.code {
        ensure_course_code_available(db, &code, Some(course_id)).await?;
        model.code = Set(code);
    }
    if let Some(name) = request.name {
        model.name = Set(name);
    }
    if let Some(description) = request.description {
        model.description = Set(description);
    }
    if let Some(credits) = request.credits {
        model.credits = Set(credits);
    }

    Ok(model.update(db).await?)
}

/// Removes a course and every record that belongs to it.
pub async fn delete_course(db: &DatabaseConnection, course_id: Uuid) -> Result<(), ApiError> {
    let course = find_course(db, course_id).await?;
    let txn = db.begin().await?;

    Grade::delete_many()
        .filter(grade::Column::CourseId.eq(course.id))
        .exec(&txn)
        .await?;
    Attendance::delete_many()
        .filter(attendance::Column::CourseId.eq(course.id))
        .exec(&txn)
        .await?;
    CourseFile::delete_many()
        .filter(course_file::Column::CourseId.eq(course.id))
        .exec(&txn)
        .await?;
    GroupCourse::delete_many()
        .filter(group_course::Column::CourseId.eq(course.id))
        .exec(&txn)
        .await?;
    delete_assignments_where(&txn, course_assignment::Column::CourseId, course.id).await?;
    Course::delete_by_id(course.id).exec(&txn).await?;

    txn.commit().await?;
    tracing::info!("Deleted course {}", course.code);
    Ok(())
}

/// Links a course to a group. Linking twice is a no-op.
pub async fn assign_course_to_group(
    db: &DatabaseConnection,
    course_id: Uuid,
    group_id: Uuid,
) -> Result<(course::Model, group::Model), ApiError> {
    let course = find_course(db, course_id).await?;
    let group = find_group(db, group_id).await?;

    GroupCourse::insert(group_course::ActiveModel {
        group_id: Set(group.id),
        course_id: Set(course.id),
    })
    .on_conflict(
        OnConflict::columns([group_course::Column::GroupId, group_course::Column::CourseId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(db)
    .await?;

    Ok((course, group))
}

// Groups

pub async fn find_group<C: ConnectionTrait>(db: &C, group_id: Uuid) -> Result<group::Model, ApiError> {
    Group::find_by_id(group_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Group"))
}

pub async fn group_dto(db: &DatabaseConnection, group: group::Model) -> Result<GroupDTO, ApiError> {
    let student_count = User::find()
        .filter(user::Column::GroupId.eq(group.id))
        .filter(user::Column::Role.eq(UserRole::Student))
        .count(db)
        .await?;
    let courses = group
        .find_related(Course)
        .order_by_asc(course::Column::Code)
        .all(db)
        .await?;

    Ok(GroupDTO {
        id: group.id,
        name: group.name,
        academic_year: group.academic_year,
        student_count,
        courses,
    })
}

pub async fn list_groups(db: &DatabaseConnection) -> Result<Vec<GroupDTO>, ApiError> {
    let groups = Group::find()
        .order_by_asc(group::Column::Name)
        .all(db)
        .await?;

    let mut result = Vec::with_capacity(groups.len());
    for group in groups {
        result.push(group_dto(db, group).await?);
    }
    Ok(result)
}

async fn ensure_group_name_available(
    db: &DatabaseConnection,
    name: &str,
    except: Option<Uuid>,
) -> Result<(), ApiError> {
    let existing = Group::find()
        .filter(group::Column::Name.eq(name))
        .one(db)
        .await?;
    match existing {
        Some(g) if Some(g.id) != except => Err(ApiError::Conflict(format!(
            "Group {} already exists",
            name
        ))),
        _ => Ok(()),
    }
}

pub async fn create_group(
    db: &DatabaseConnection,
    request: CreateGroupRequest,
) -> Result<group::Model, ApiError> {
    ensure_group_name_available(db, &request.name, None).await?;

    let group = group::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(request.name),
        academic_year: Set(request.academic_year),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    tracing::info!("Created group {}", group.name);
    Ok(group)
}

pub async fn update_group(
    db: &DatabaseConnection,
    group_id: Uuid,
    request: UpdateGroupRequest,
) -> Result<group::Model, ApiError> {
    let existing = find_group(db, group_id).await?;
    let mut model: group::ActiveModel = existing.into();

    if let Some(name) = request.name {
        ensure_group_name_available(db, &name, Some(group_id)).await?;
        model.name = Set(name);
    }
    if let Some(academic_year) = request.academic_year {
        model.academic_year = Set(academic_year);
    }

    Ok(model.update(db).await?)
}

/// Deletes a group. Its students stay, without a group; its assignments,
/// sessions, timetables and course links go with it.
pub async fn delete_group(db: &DatabaseConnection, group_id: Uuid) -> Result<(), ApiError> {
    let group = find_group(db, group_id).await?;
    let txn = db.begin().await?;

    User::update_many()
        .col_expr(user::Column::GroupId, sea_orm::sea_query::Expr::value(Option::<Uuid>::None))
        .filter(user::Column::GroupId.eq(group.id))
        .exec(&txn)
        .await?;
    Timetable::delete_many()
        .filter(timetable::Column::GroupId.eq(group.id))
        .exec(&txn)
        .await?;
    GroupCourse::delete_many()
        .filter(group_course::Column::GroupId.eq(group.id))
        .exec(&txn)
        .await?;
    delete_assignments_where(&txn, course_assignment::Column::GroupId, group.id).await?;
    Group::delete_by_id(group.id).exec(&txn).await?;

    txn.commit().await?;
    tracing::info!("Deleted group {}", group.name);
    Ok(())
}

// Assignments

async fn delete_assignments_where<C: ConnectionTrait>(
    db: &C,
    column: course_assignment::Column,
    value: Uuid,
) -> Result<(), ApiError> {
    let ids: Vec<Uuid> = CourseAssignment::find()
        .filter(column.eq(value))
        .all(db)
        .await?
        .into_iter()
        .map(|a| a.id)
        .collect();

    if ids.is_empty() {
        return Ok(());
    }

    ScheduleSession::delete_many()
        .filter(schedule_session::Column::AssignmentId.is_in(ids.clone()))
        .exec(db)
        .await?;
    CourseAssignment::delete_many()
        .filter(course_assignment::Column::Id.is_in(ids))
        .exec(db)
        .await?;
    Ok(())
}

pub async fn find_assignment<C: ConnectionTrait>(
    db: &C,
    assignment_id: Uuid,
) -> Result<course_assignment::Model, ApiError> {
    CourseAssignment::find_by_id(assignment_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Assignment"))
}

/// Teachers assigned to a course across all groups and years.
pub async fn course_teacher_ids<C: ConnectionTrait>(db: &C, course_id: Uuid) -> Result<Vec<Uuid>, ApiError> {
    let mut ids: Vec<Uuid> = CourseAssignment::find()
        .filter(course_assignment::Column::CourseId.eq(course_id))
        .all(db)
        .await?
        .into_iter()
        .map(|a| a.teacher_id)
        .collect();
    ids.sort();
    ids.dedup();
    Ok(ids)
}

/// Course ids the teacher is assigned to.
pub async fn taught_course_ids<C: ConnectionTrait>(db: &C, teacher_id: Uuid) -> Result<Vec<Uuid>, ApiError> {
    let mut ids: Vec<Uuid> = CourseAssignment::find()
        .filter(course_assignment::Column::TeacherId.eq(teacher_id))
        .all(db)
        .await?
        .into_iter()
        .map(|a| a.course_id)
        .collect();
    ids.sort();
    ids.dedup();
    Ok(ids)
}

async fn validate_assignment(
    db: &DatabaseConnection,
    request: &AssignmentRequest,
    except: Option<Uuid>,
) -> Result<(), ApiError> {
    user_service::find_with_role(db, request.teacher_id, UserRole::Teacher).await?;
    find_course(db, request.course_id).await?;
    find_group(db, request.group_id).await?;

    let duplicate = CourseAssignment::find()
        .filter(course_assignment::Column::CourseId.eq(request.course_id))
        .filter(course_assignment::Column::GroupId.eq(request.group_id))
        .filter(course_assignment::Column::AcademicYear.eq(request.academic_year.as_str()))
        .one(db)
        .await?;

    match duplicate {
        Some(existing) if Some(existing.id) != except => Err(ApiError::Conflict(
            "This course is already assigned to this group for this academic year".to_string(),
        )),
        _ => Ok(()),
    }
}

pub async fn create_assignment(
    db: &DatabaseConnection,
    request: AssignmentRequest,
) -> Result<course_assignment::Model, ApiError> {
    validate_assignment(db, &request, None).await?;

    let assignment = course_assignment::ActiveModel {
        id: Set(Uuid::new_v4()),
        teacher_id: Set(request.teacher_id),
        course_id: Set(request.course_id),
        group_id: Set(request.group_id),
        academic_year: Set(request.academic_year),
    }
    .insert(db)
    .await?;

    tracing::info!(
        "Assigned teacher {} to course {} for group {} ({})",
        assignment.teacher_id,
        assignment.course_id,
        assignment.group_id,
        assignment.academic_year
    );
    Ok(assignment)
}

pub async fn update_assignment(
    db: &DatabaseConnection,
    assignment_id: Uuid,
    request: AssignmentRequest,
) -> Result<course_assignment::Model, ApiError> {
    let existing = find_assignment(db, assignment_id).await?;
    validate_assignment(db, &request, Some(existing.id)).await?;

    let mut model: course_assignment::ActiveModel = existing.into();
    model.teacher_id = Set(request.teacher_id);
    model.course_id = Set(request.course_id);
    model.group_id = Set(request.group_id);
    model.academic_year = Set(request.academic_year);
    Ok(model.update(db).await?)
}

pub async fn delete_assignment(db: &DatabaseConnection, assignment_id: Uuid) -> Result<(), ApiError> {
    let assignment = find_assignment(db, assignment_id).await?;
    let txn = db.begin().await?;
    delete_assignments_where(&txn, course_assignment::Column::Id, assignment.id).await?;
    txn.commit().await?;
    Ok(())
}

pub async fn list_assignments(
    db: &DatabaseConnection,
    filter: AssignmentFilter,
) -> Result<Vec<course_assignment::Model>, ApiError> {
    let mut select = CourseAssignment::find();
    if let Some(group_id) = filter.group_id {
        select = select.filter(course_assignment::Column::GroupId.eq(group_id));
    }
    if let Some(teacher_id) = filter.teacher_id {
        select = select.filter(course_assignment::Column::TeacherId.eq(teacher_id));
    }
    if let Some(course_id) = filter.course_id {
        select = select.filter(course_assignment::Column::CourseId.eq(course_id));
    }
    Ok(select
        .order_by_asc(course_assignment::Column::AcademicYear)
        .all(db)
        .await?)
}

/// Assignments taught by a teacher.
pub async fn teacher_courses(
    db: &DatabaseConnection,
    caller: &Caller,
) -> Result<Vec<AssignmentDTO>, ApiError> {
    let assignments = list_assignments(
        db,
        AssignmentFilter {
            teacher_id: Some(caller.id),
            ..Default::default()
        },
    )
    .await?;
    assignment_dtos(db, assignments).await
}

/// Assignments offered to a student's group; empty when the student has no group.
pub async fn student_courses(
    db: &DatabaseConnection,
    caller: &Caller,
) -> Result<Vec<AssignmentDTO>, ApiError> {
    let Some(group_id) = caller.group_id() else {
        return Ok(Vec::new());
    };
    let assignments = list_assignments(
        db,
        AssignmentFilter {
            group_id: Some(group_id),
            ..Default::default()
        },
    )
    .await?;
    assignment_dtos(db, assignments).await
}

pub async fn assignment_dtos(
    db: &DatabaseConnection,
    assignments: Vec<course_assignment::Model>,
) -> Result<Vec<AssignmentDTO>, ApiError> {
    if assignments.is_empty() {
        return Ok(Vec::new());
    }

    let teacher_ids: Vec<Uuid> = assignments.iter().map(|a| a.teacher_id).collect();
    let course_ids: Vec<Uuid> = assignments.iter().map(|a| a.course_id).collect();
    let group_ids: Vec<Uuid> = assignments.iter().map(|a| a.group_id).collect();
    let assignment_ids: Vec<Uuid> = assignments.iter().map(|a| a.id).collect();

    let teachers: HashMap<Uuid, user::Model> = User::find()
        .filter(user::Column::Id.is_in(teacher_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let courses: HashMap<Uuid, course::Model> = Course::find()
        .filter(course::Column::Id.is_in(course_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let groups: HashMap<Uuid, group::Model> = Group::find()
        .filter(group::Column::Id.is_in(group_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|g| (g.id, g))
        .collect();
    let sessions = ScheduleSession::find()
        .filter(schedule_session::Column::AssignmentId.is_in(assignment_ids))
        .order_by_asc(schedule_session::Column::StartTime)
        .all(db)
        .await?;

    Ok(assignments
        .into_iter()
        .map(|a| AssignmentDTO {
            id: a.id,
            teacher_id: a.teacher_id,
            teacher_name: teachers.get(&a.teacher_id).map(|t| t.display_name()),
            course_id: a.course_id,
            course_code: courses.get(&a.course_id).map(|c| c.code.clone()),
            course_name: courses.get(&a.course_id).map(|c| c.name.clone()),
            group_id: a.group_id,
            group_name: groups.get(&a.group_id).map(|g| g.name.clone()),
            sessions: sessions
                .iter()
                .filter(|s| s.assignment_id == a.id)
                .cloned()
                .collect(),
            academic_year: a.academic_year,
        })
        .collect())
}
