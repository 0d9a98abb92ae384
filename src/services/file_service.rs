use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::caller::{Caller, Identity};
use crate::auth::permissions::{self, Access};
use crate::entities::course_file::{self, CourseFileDTO, CourseFileFilter, CreateCourseFileRequest};
use crate::entities::prelude::*;
use crate::entities::{course, course_assignment, group_course, user};
use crate::errors::ApiError;
use crate::services::course_service;

/// Courses whose files the caller may read. `None` means every course.
async fn visible_courses(db: &DatabaseConnection, caller: &Caller) -> Result<Option<Vec<Uuid>>, ApiError> {
    match &caller.identity {
        Identity::Admin => Ok(None),
        Identity::Teacher => Ok(Some(course_service::taught_course_ids(db, caller.id).await?)),
        Identity::Student(profile) => {
            let Some(group_id) = profile.group_id else {
                return Ok(Some(Vec::new()));
            };

            let mut ids: Vec<Uuid> = GroupCourse::find()
                .filter(group_course::Column::GroupId.eq(group_id))
                .all(db)
                .await?
                .into_iter()
                .map(|link| link.course_id)
                .collect();
            ids.extend(
                CourseAssignment::find()
                    .filter(course_assignment::Column::GroupId.eq(group_id))
                    .all(db)
                    .await?
                    .into_iter()
                    .map(|a| a.course_id),
            );
            ids.sort();
            ids.dedup();
            Ok(Some(ids))
        }
    }
}

/// Registers a file for a course. Any signed-in account may upload; the
/// uploader is always the caller, whatever the request body says.
pub async fn create_file(
    db: &DatabaseConnection,
    caller: &Caller,
    request: CreateCourseFileRequest,
) -> Result<CourseFileDTO, ApiError> {
    let course = course_service::find_course(db, request.course).await?;

    let file = course_file::ActiveModel {
        id: Set(Uuid::new_v4()),
        course_id: Set(course.id),
        uploaded_by: Set(caller.id),
        title: Set(request.title),
        description: Set(request.description),
        file_path: Set(request.file_path),
        file_type: Set(request.file_type),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    tracing::info!("{} added file {} to {}", caller.username, file.title, course.code);
    Ok(CourseFileDTO {
        file,
        course_code: Some(course.code),
        uploaded_by_name: Some(caller.display_name.clone()),
    })
}

pub async fn list_files(
    db: &DatabaseConnection,
    caller: &Caller,
    filter: CourseFileFilter,
) -> Result<Vec<CourseFileDTO>, ApiError> {
    let mut select = CourseFile::find();
    if let Some(courses) = visible_courses(db, caller).await? {
        select = select.filter(course_file::Column::CourseId.is_in(courses));
    }
    if let Some(course_id) = filter.course_id {
        select = select.filter(course_file::Column::CourseId.eq(course_id));
    }

    let files = select
        .order_by_desc(course_file::Column::CreatedAt)
        .all(db)
        .await?;
    file_dtos(db, files).await
}

async fn find_file(db: &DatabaseConnection, file_id: Uuid) -> Result<course_file::Model, ApiError> {
    CourseFile::find_by_id(file_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("File"))
}

pub async fn get_file(
    db: &DatabaseConnection,
    caller: &Caller,
    file_id: Uuid,
) -> Result<CourseFileDTO, ApiError> {
    let file = find_file(db, file_id).await?;
    // Out-of-scope files look exactly like missing ones.
    if let Some(courses) = visible_courses(db, caller).await? {
        if !courses.contains(&file.course_id) {
            return Err(ApiError::not_found("File"));
        }
    }

    let mut dtos = file_dtos(db, vec![file]).await?;
    dtos.pop().ok_or_else(|| ApiError::not_found("File"))
}

/// Only the uploader or an admin may delete a file.
pub async fn delete_file(db: &DatabaseConnection, caller: &Caller, file_id: Uuid) -> Result<(), ApiError> {
    let file = find_file(db, file_id).await?;
    if !permissions::is_owner_or_admin(caller, file.uploaded_by, Access::Write) {
        return Err(ApiError::Forbidden(
            "You don't have permission to delete this file".to_string(),
        ));
    }

    CourseFile::delete_by_id(file.id).exec(db).await?;
    tracing::info!("{} deleted file {}", caller.username, file.title);
    Ok(())
}

async fn file_dtos(
    db: &DatabaseConnection,
    files: Vec<course_file::Model>,
) -> Result<Vec<CourseFileDTO>, ApiError> {
    if files.is_empty() {
        return Ok(Vec::new());
    }

    let course_ids: Vec<Uuid> = files.iter().map(|f| f.course_id).collect();
    let uploader_ids: Vec<Uuid> = files.iter().map(|f| f.uploaded_by).collect();

    let courses: HashMap<Uuid, String> = Course::find()
        .filter(course::Column::Id.is_in(course_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.code))
        .collect();
    let uploaders: HashMap<Uuid, String> = User::find()
        .filter(user::Column::Id.is_in(uploader_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.display_name()))
        .collect();

    Ok(files
        .into_iter()
        .map(|file| CourseFileDTO {
            course_code: courses.get(&file.course_id).cloned(),
            uploaded_by_name: uploaders.get(&file.uploaded_by).cloned(),
            file,
        })
        .collect())
}
