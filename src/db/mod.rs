use sea_orm::sea_query::*;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityName, EntityTrait,
    IdenStatic, Schema,
};
use std::time::Duration;
use log::LevelFilter;

use crate::entities::prelude::*;
use crate::entities::{attendance, course_assignment, grade, user};

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    // Set up connection options
    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.max_connections(10)
        .min_connections(3)
        .connect_timeout(Duration::from_secs(15))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Info);

    // Connect to the database
    Database::connect(opt).await
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let stmt = schema
        .create_table_from_entity(entity)
        .if_not_exists()
        .to_owned();

    db.execute(builder.build(&stmt)).await?;
    Ok(())
}

async fn create_index<E, C>(
    db: &DatabaseConnection,
    name: &str,
    entity: E,
    columns: &[C],
    unique: bool,
) -> Result<(), DbErr>
where
    E: EntityName,
    C: IdenStatic,
{
    let builder = db.get_database_backend();
    let mut stmt = IndexCreateStatement::new();
    stmt.name(name).table(entity.table_ref()).if_not_exists();
    for column in columns {
        stmt.col(*column);
    }
    if unique {
        stmt.unique();
    }

    db.execute(builder.build(&stmt)).await?;
    Ok(())
}

pub async fn ensure_schema_exists(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Generate schema builder
    let schema = Schema::new(db.get_database_backend());

    // Referenced tables first so foreign keys resolve
    create_table(db, &schema, Group).await?;
    create_table(db, &schema, User).await?;
    create_table(db, &schema, Course).await?;
    create_table(db, &schema, GroupCourse).await?;
    create_table(db, &schema, CourseAssignment).await?;
    create_table(db, &schema, ScheduleSession).await?;
    create_table(db, &schema, Grade).await?;
    create_table(db, &schema, Attendance).await?;
    create_table(db, &schema, CourseFile).await?;
    create_table(db, &schema, Timetable).await?;
    create_table(db, &schema, Message).await?;
    create_table(db, &schema, Notification).await?;

    // Uniqueness that upserts rely on
    create_index(
        db,
        "idx_grades_student_course",
        Grade,
        &[grade::Column::StudentId, grade::Column::CourseId],
        true,
    )
    .await?;
    create_index(
        db,
        "idx_attendance_student_course_week",
        Attendance,
        &[
            attendance::Column::StudentId,
            attendance::Column::CourseId,
            attendance::Column::WeekNumber,
        ],
        true,
    )
    .await?;
    create_index(
        db,
        "idx_assignments_course_group_year",
        CourseAssignment,
        &[
            course_assignment::Column::CourseId,
            course_assignment::Column::GroupId,
            course_assignment::Column::AcademicYear,
        ],
        true,
    )
    .await?;
    create_index(db, "idx_users_group", User, &[user::Column::GroupId], false).await?;

    Ok(())
}
