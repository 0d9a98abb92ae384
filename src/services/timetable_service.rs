use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::caller::{Caller, Identity};
use crate::entities::group;
use crate::entities::prelude::*;
use crate::entities::timetable::{self, CreateTimetableRequest, TimetableDTO, UpdateTimetableRequest};
use crate::errors::ApiError;
use crate::services::course_service;

/// Active timetables. Students only see their own group's; a student without
/// a group sees none.
pub async fn list_timetables(db: &DatabaseConnection, caller: &Caller) -> Result<Vec<TimetableDTO>, ApiError> {
    let mut select = Timetable::find().filter(timetable::Column::IsActive.eq(true));

    if let Identity::Student(profile) = &caller.identity {
        match profile.group_id {
            Some(group_id) => select = select.filter(timetable::Column::GroupId.eq(group_id)),
            None => return Ok(Vec::new()),
        }
    }

    let timetables = select
        .order_by_desc(timetable::Column::CreatedAt)
        .all(db)
        .await?;
    timetable_dtos(db, timetables).await
}

async fn find_timetable(db: &DatabaseConnection, timetable_id: Uuid) -> Result<timetable::Model, ApiError> {
    Timetable::find_by_id(timetable_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Timetable"))
}

pub async fn get_timetable(db: &DatabaseConnection, timetable_id: Uuid) -> Result<TimetableDTO, ApiError> {
    let timetable = find_timetable(db, timetable_id).await?;
    let mut dtos = timetable_dtos(db, vec![timetable]).await?;
    dtos.pop().ok_or_else(|| ApiError::not_found("Timetable"))
}

pub async fn create_timetable(
    db: &DatabaseConnection,
    request: CreateTimetableRequest,
) -> Result<TimetableDTO, ApiError> {
    let group = course_service::find_group(db, request.group).await?;

    let timetable = timetable::ActiveModel {
        id: Set(Uuid::new_v4()),
        group_id: Set(group.id),
        title: Set(request.title),
        image_path: Set(request.image_path),
        semester: Set(request.semester),
        academic_year: Set(request.academic_year),
        is_active: Set(request.is_active),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    tracing::info!("Published timetable {} for group {}", timetable.title, group.name);
    Ok(TimetableDTO {
        timetable,
        group_name: Some(group.name),
    })
}

pub async fn update_timetable(
    db: &DatabaseConnection,
    timetable_id: Uuid,
    request: UpdateTimetableRequest,
) -> Result<TimetableDTO, ApiError> {
    let existing = find_timetable(db, timetable_id).await?;
    let mut model: timetable::ActiveModel = existing.into();

    if let Some(group_id) = request.group {
        let group = course_service::find_group(db, group_id).await?;
        model.group_id = Set(group.id);
    }
    if let Some(title) = request.title {
        model.title = Set(title);
    }
    if let Some(image_path) = request.image_path {
        model.image_path = Set(image_path);
    }
    if let Some(semester) = request.semester {
        model.semester = Set(semester);
    }
    if let Some(academic_year) = request.academic_year {
        model.academic_year = Set(academic_year);
    }
    if let Some(is_active) = request.is_active {
        model.is_active = Set(is_active);
    }

    let timetable = model.update(db).await?;
    let mut dtos = timetable_dtos(db, vec![timetable]).await?;
    dtos.pop().ok_or_else(|| ApiError::not_found("Timetable"))
}

pub async fn delete_timetable(db: &DatabaseConnection, timetable_id: Uuid) -> Result<(), ApiError> {
    let timetable = find_timetable(db, timetable_id).await?;
    Timetable::delete_by_id(timetable.id).exec(db).await?;
    Ok(())
}

/// The newest active timetable of the student's group.
pub async fn my_timetable(db: &DatabaseConnection, caller: &Caller) -> Result<TimetableDTO, ApiError> {
    let group_id = caller
        .group_id()
        .ok_or_else(|| ApiError::NotFound("You are not assigned to any group yet".to_string()))?;

    let timetable = Timetable::find()
        .filter(timetable::Column::GroupId.eq(group_id))
        .filter(timetable::Column::IsActive.eq(true))
        .order_by_desc(timetable::Column::CreatedAt)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("No timetable available for your group".to_string()))?;

    let mut dtos = timetable_dtos(db, vec![timetable]).await?;
    dtos.pop().ok_or_else(|| ApiError::not_found("Timetable"))
}

async fn timetable_dtos(
    db: &DatabaseConnection,
    timetables: Vec<timetable::Model>,
) -> Result<Vec<TimetableDTO>, ApiError> {
    let group_ids: Vec<Uuid> = timetables.iter().map(|t| t.group_id).collect();
    let groups: HashMap<Uuid, String> = Group::find()
        .filter(group::Column::Id.is_in(group_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|g| (g.id, g.name))
        .collect();

    Ok(timetables
        .into_iter()
        .map(|timetable| TimetableDTO {
            group_name: groups.get(&timetable.group_id).cloned(),
            timetable,
        })
        .collect())
}
