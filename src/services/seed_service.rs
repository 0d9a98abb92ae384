use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::auth::password;
use crate::entities::attendance::AttendanceStatus;
use crate::entities::notification::NotificationType;
use crate::entities::prelude::*;
use crate::entities::user::UserRole;
use crate::entities::{
    attendance, course, course_assignment, grade, group, group_course, notification, user,
};
use crate::errors::ApiError;

const ACADEMIC_YEAR: &str = "2025-2026";
const TEACHER_COUNT: usize = 5;
const STUDENT_COUNT: usize = 20;
const COURSES_PER_GROUP: usize = 4;
const ATTENDANCE_WEEKS: i32 = 5;

const COURSES: [(&str, &str, i32); 7] = [
    ("CS101", "Intro to Programming", 4),
    ("CS102", "Data Structures", 4),
    ("MATH101", "Calculus I", 3),
    ("PHY101", "Physics I", 3),
    ("ENG101", "English Communication", 2),
    ("DB201", "Database Systems", 3),
    ("WEB201", "Web Development", 3),
];

const GROUPS: [&str; 3] = ["Group A", "Group B", "Group C"];

/// Counts of the rows written by [`seed_demo_data`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub courses: usize,
    pub groups: usize,
    pub teachers: usize,
    pub students: usize,
    pub grades: usize,
    pub attendance: usize,
    pub notifications: usize,
}

/// Fills an empty database with a demo campus: courses, groups with their
/// curricula and teachers, approved students, marks, five weeks of attendance
/// and a welcome notification per account.
///
/// Data is laid out deterministically. Nothing is written when the demo
/// courses already exist, so running it on every start is harmless.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<Option<SeedSummary>, ApiError> {
    let existing = Course::find()
        .filter(course::Column::Code.eq(COURSES[0].0))
        .one(db)
        .await?;
    if existing.is_some() {
        tracing::debug!("Demo data already present");
        return Ok(None);
    }

    // One hash per role keeps startup fast; every demo account of a role shares it.
    let teacher_hash = password::hash_password("teacher123")?;
    let student_hash = password::hash_password("student123")?;

    let txn = db.begin().await?;
    let mut summary = SeedSummary::default();
    let now = Utc::now();

    let mut courses = Vec::with_capacity(COURSES.len());
    for (code, name, credits) in COURSES {
        let course = course::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            description: Set(String::new()),
            credits: Set(credits),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;
        courses.push(course);
    }
    summary.courses = courses.len();

    let mut teachers = Vec::with_capacity(TEACHER_COUNT);
    for i in 1..=TEACHER_COUNT {
        let teacher = insert_user(&txn, DemoUser {
            username: format!("teacher{}", i),
            last_name: i.to_string(),
            role: UserRole::Teacher,
            password_hash: teacher_hash.clone(),
            student_id: None,
            group_id: None,
        })
        .await?;
        teachers.push(teacher);
    }
    summary.teachers = teachers.len();

    // Each group takes a window of consecutive courses, and each of its
    // courses is taught by the next teacher in turn.
    let mut curricula: Vec<(group::Model, Vec<course::Model>)> = Vec::with_capacity(GROUPS.len());
    let mut next_teacher = 0;
    for (g, name) in GROUPS.iter().enumerate() {
        let group = group::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            academic_year: Set(ACADEMIC_YEAR.to_string()),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut group_courses = Vec::with_capacity(COURSES_PER_GROUP);
        for offset in 0..COURSES_PER_GROUP {
            let course = &courses[(g * 2 + offset) % courses.len()];
            group_course::ActiveModel {
                group_id: Set(group.id),
                course_id: Set(course.id),
            }
            .insert(&txn)
            .await?;

            course_assignment::ActiveModel {
                id: Set(Uuid::new_v4()),
                teacher_id: Set(teachers[next_teacher % teachers.len()].id),
                course_id: Set(course.id),
                group_id: Set(group.id),
                academic_year: Set(ACADEMIC_YEAR.to_string()),
            }
            .insert(&txn)
            .await?;
            next_teacher += 1;

            group_courses.push(course.clone());
        }
        curricula.push((group, group_courses));
    }
    summary.groups = curricula.len();

    let today = now.date_naive();
    let mut students = Vec::with_capacity(STUDENT_COUNT);
    for i in 1..=STUDENT_COUNT {
        let (group, group_courses) = &curricula[(i - 1) % curricula.len()];
        let student = insert_user(&txn, DemoUser {
            username: format!("student{}", i),
            last_name: i.to_string(),
            role: UserRole::Student,
            password_hash: student_hash.clone(),
            student_id: Some(format!("202500{}", i)),
            group_id: Some(group.id),
        })
        .await?;

        for (c, course) in group_courses.iter().enumerate() {
            let spread = ((i + c) % 9) as f64;
            grade::ActiveModel {
                id: Set(Uuid::new_v4()),
                student_id: Set(student.id),
                course_id: Set(course.id),
                td_mark: Set(Some(11.0 + spread)),
                tp_mark: Set(Some(10.5 + spread)),
                exam_mark: Set(Some(8.0 + spread * 1.5)),
                comments: Set(if spread >= 4.0 {
                    "Great progress!".to_string()
                } else {
                    "Needs improvement.".to_string()
                }),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await?;
            summary.grades += 1;

            for week in 1..=ATTENDANCE_WEEKS {
                let status = match (i + c + week as usize) % 10 {
                    0 => AttendanceStatus::Absent,
                    1 => AttendanceStatus::Late,
                    _ => AttendanceStatus::Present,
                };
                attendance::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    student_id: Set(student.id),
                    course_id: Set(course.id),
                    date: Set(today - Duration::weeks(i64::from(ATTENDANCE_WEEKS - week))),
                    week_number: Set(week),
                    status: Set(status),
                    notes: Set(String::new()),
                    created_at: Set(now),
                }
                .insert(&txn)
                .await?;
                summary.attendance += 1;
            }
        }
        students.push(student);
    }
    summary.students = students.len();

    for account in teachers.iter().chain(students.iter()) {
        notification::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(account.id),
            title: Set("Welcome to Campus Connect".to_string()),
            message: Set("Welcome to the new academic year!".to_string()),
            notification_type: Set(NotificationType::Info),
            is_read: Set(false),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;
        summary.notifications += 1;
    }

    txn.commit().await?;
    tracing::info!(
        "Seeded demo data: {} courses, {} groups, {} teachers, {} students",
        summary.courses,
        summary.groups,
        summary.teachers,
        summary.students
    );
    Ok(Some(summary))
}

struct DemoUser {
    username: String,
    last_name: String,
    role: UserRole,
    password_hash: String,
    student_id: Option<String>,
    group_id: Option<Uuid>,
}

async fn insert_user(txn: &DatabaseTransaction, demo: DemoUser) -> Result<user::Model, ApiError> {
    let now = Utc::now();
    let is_student = demo.role == UserRole::Student;
    let first_name = if is_student { "Student" } else { "Teacher" };

    let account = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{}@campus.com", demo.username)),
        username: Set(demo.username),
        password_hash: Set(demo.password_hash),
        first_name: Set(first_name.to_string()),
        last_name: Set(demo.last_name),
        role: Set(demo.role),
        student_id: Set(demo.student_id),
        program: Set(is_student.then(|| "Computer Science".to_string())),
        semester: Set(is_student.then(|| "1".to_string())),
        birth_date: Set(None),
        phone: Set(String::new()),
        address: Set(String::new()),
        profile_picture: Set(None),
        is_approved: Set(true),
        rejection_reason: Set(None),
        group_id: Set(demo.group_id),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    Ok(account.insert(txn).await?)
}
