use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::caller::{Caller, Identity};
use crate::entities::prelude::*;
use crate::entities::schedule_session::{
    self, ScheduleFilter, ScheduleSessionDTO, ScheduleSessionRequest,
};
use crate::entities::{course, course_assignment, group, user};
use crate::errors::ApiError;
use crate::services::course_service;

fn check_times(request: &ScheduleSessionRequest) -> Result<(), ApiError> {
    if request.end_time <= request.start_time {
        return Err(ApiError::Validation(
            "end_time must be after start_time".to_string(),
        ));
    }
    Ok(())
}

async fn find_session(db: &DatabaseConnection, session_id: Uuid) -> Result<schedule_session::Model, ApiError> {
    ScheduleSession::find_by_id(session_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Session"))
}

pub async fn create_session(
    db: &DatabaseConnection,
    request: ScheduleSessionRequest,
) -> Result<ScheduleSessionDTO, ApiError> {
    check_times(&request)?;
    let assignment = course_service::find_assignment(db, request.assignment_id).await?;

    let session = schedule_session::ActiveModel {
        id: Set(Uuid::new_v4()),
        assignment_id: Set(assignment.id),
        day: Set(request.day),
        start_time: Set(request.start_time),
        end_time: Set(request.end_time),
        room: Set(request.room),
        session_type: Set(request.session_type),
    }
    .insert(db)
    .await?;

    session_dto(db, session).await
}

pub async fn update_session(
    db: &DatabaseConnection,
    session_id: Uuid,
    request: ScheduleSessionRequest,
) -> Result<ScheduleSessionDTO, ApiError> {
    check_times(&request)?;
    let existing = find_session(db, session_id).await?;
    let assignment = course_service::find_assignment(db, request.assignment_id).await?;

    let mut model: schedule_session::ActiveModel = existing.into();
    model.assignment_id = Set(assignment.id);
    model.day = Set(request.day);
    model.start_time = Set(request.start_time);
    model.end_time = Set(request.end_time);
    model.room = Set(request.room);
    model.session_type = Set(request.session_type);
    let session = model.update(db).await?;

    session_dto(db, session).await
}

pub async fn delete_session(db: &DatabaseConnection, session_id: Uuid) -> Result<(), ApiError> {
    let session = find_session(db, session_id).await?;
    ScheduleSession::delete_by_id(session.id).exec(db).await?;
    Ok(())
}

pub async fn get_session(db: &DatabaseConnection, session_id: Uuid) -> Result<ScheduleSessionDTO, ApiError> {
    let session = find_session(db, session_id).await?;
    session_dto(db, session).await
}

pub async fn list_sessions(
    db: &DatabaseConnection,
    filter: ScheduleFilter,
) -> Result<Vec<ScheduleSessionDTO>, ApiError> {
    let mut select = ScheduleSession::find();
    if let Some(group_id) = filter.group_id {
        let assignments: Vec<Uuid> = CourseAssignment::find()
            .filter(course_assignment::Column::GroupId.eq(group_id))
            .all(db)
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect();
        select = select.filter(schedule_session::Column::AssignmentId.is_in(assignments));
    }
    if let Some(day) = filter.day {
        select = select.filter(schedule_session::Column::Day.eq(day));
    }

    let sessions = select
        .order_by_asc(schedule_session::Column::StartTime)
        .all(db)
        .await?;
    let mut dtos = session_dtos(db, sessions).await?;
    sort_by_week(&mut dtos);
    Ok(dtos)
}

// Days are stored as names, so week order is restored here.
fn sort_by_week(dtos: &mut [ScheduleSessionDTO]) {
    dtos.sort_by_key(|dto| (dto.session.day as u8, dto.session.start_time));
}

/// Weekly sessions relevant to the caller: the assignments a teacher teaches,
/// the assignments of a student's group, everything for an admin.
pub async fn my_schedule(db: &DatabaseConnection, caller: &Caller) -> Result<Vec<ScheduleSessionDTO>, ApiError> {
    let assignments = match &caller.identity {
        Identity::Admin => return list_sessions(db, ScheduleFilter::default()).await,
        Identity::Teacher => CourseAssignment::find()
            .filter(course_assignment::Column::TeacherId.eq(caller.id))
            .all(db)
            .await?,
        Identity::Student(profile) => match profile.group_id {
            Some(group_id) => CourseAssignment::find()
                .filter(course_assignment::Column::GroupId.eq(group_id))
                .all(db)
                .await?,
            None => Vec::new(),
        },
    };
    if assignments.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = assignments.into_iter().map(|a| a.id).collect();
    let sessions = ScheduleSession::find()
        .filter(schedule_session::Column::AssignmentId.is_in(ids))
        .order_by_asc(schedule_session::Column::StartTime)
        .all(db)
        .await?;

    let mut dtos = session_dtos(db, sessions).await?;
    sort_by_week(&mut dtos);
    Ok(dtos)
}

async fn session_dto(
    db: &DatabaseConnection,
    session: schedule_session::Model,
) -> Result<ScheduleSessionDTO, ApiError> {
    let mut dtos = session_dtos(db, vec![session]).await?;
    dtos.pop().ok_or_else(|| ApiError::not_found("Session"))
}

async fn session_dtos(
    db: &DatabaseConnection,
    sessions: Vec<schedule_session::Model>,
) -> Result<Vec<ScheduleSessionDTO>, ApiError> {
    if sessions.is_empty() {
        return Ok(Vec::new());
    }

    let assignment_ids: Vec<Uuid> = sessions.iter().map(|s| s.assignment_id).collect();
    let assignments: HashMap<Uuid, course_assignment::Model> = CourseAssignment::find()
        .filter(course_assignment::Column::Id.is_in(assignment_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();

    let course_ids: Vec<Uuid> = assignments.values().map(|a| a.course_id).collect();
    let group_ids: Vec<Uuid> = assignments.values().map(|a| a.group_id).collect();
    let teacher_ids: Vec<Uuid> = assignments.values().map(|a| a.teacher_id).collect();

    let courses: HashMap<Uuid, course::Model> = Course::find()
        .filter(course::Column::Id.is_in(course_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let groups: HashMap<Uuid, String> = Group::find()
        .filter(group::Column::Id.is_in(group_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|g| (g.id, g.name))
        .collect();
    let teachers: HashMap<Uuid, String> = User::find()
        .filter(user::Column::Id.is_in(teacher_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.display_name()))
        .collect();

    Ok(sessions
        .into_iter()
        .map(|session| {
            let assignment = assignments.get(&session.assignment_id);
            let course = assignment.and_then(|a| courses.get(&a.course_id));
            ScheduleSessionDTO {
                course_code: course.map(|c| c.code.clone()),
                course_name: course.map(|c| c.name.clone()),
                group_name: assignment.and_then(|a| groups.get(&a.group_id).cloned()),
                teacher_name: assignment.and_then(|a| teachers.get(&a.teacher_id).cloned()),
                session,
            }
        })
        .collect())
}
