//! Role and object-level permission checks.
//!
//! Role predicates gate an operation as a whole; object predicates gate
//! update/delete on a specific instance. Handlers apply both.

use axum::http::Method;
use uuid::Uuid;

use crate::auth::caller::{Caller, Identity};
use crate::entities::course_assignment;
use crate::errors::ApiError;

pub fn require_admin(caller: &Caller) -> Result<(), ApiError> {
    match caller.identity {
        Identity::Admin => Ok(()),
        _ => Err(ApiError::Forbidden("Admin access required".to_string())),
    }
}

pub fn require_teacher(caller: &Caller) -> Result<(), ApiError> {
    match caller.identity {
        Identity::Teacher => Ok(()),
        _ => Err(ApiError::Forbidden("Teacher access required".to_string())),
    }
}

pub fn require_student(caller: &Caller) -> Result<(), ApiError> {
    match caller.identity {
        Identity::Student(_) => Ok(()),
        _ => Err(ApiError::Forbidden("Student access required".to_string())),
    }
}

pub fn require_approved_student(caller: &Caller) -> Result<(), ApiError> {
    match &caller.identity {
        Identity::Student(profile) if profile.is_approved => Ok(()),
        Identity::Student(_) => Err(ApiError::Forbidden("Account pending approval".to_string())),
        _ => Err(ApiError::Forbidden("Student access required".to_string())),
    }
}

/// Kind of access an operation needs on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl Access {
    /// GET, HEAD and OPTIONS are reads; every other method writes.
    pub fn from_method(method: &Method) -> Self {
        if method == Method::GET || method == Method::HEAD || method == Method::OPTIONS {
            Access::Read
        } else {
            Access::Write
        }
    }
}

/// Reads are open to any authenticated caller; writes need the owner or an admin.
pub fn is_owner_or_admin(caller: &Caller, owner_id: Uuid, access: Access) -> bool {
    match access {
        Access::Read => true,
        Access::Write => caller.id == owner_id || caller.is_admin(),
    }
}

/// How a resource is tied to the teachers allowed to manage it.
pub trait TeachingScope {
    /// Teachers of the course the resource belongs to, when it has a course.
    fn course_teachers(&self) -> Option<&[Uuid]> {
        None
    }

    /// Teacher the resource is directly attached to.
    fn teacher(&self) -> Option<Uuid> {
        None
    }
}

/// Admins always pass. Otherwise the course relation decides when present,
/// then the direct teacher relation; a resource with neither is denied.
pub fn is_teacher_of_course<T: TeachingScope + ?Sized>(caller: &Caller, target: &T) -> bool {
    if caller.is_admin() {
        return true;
    }

    if let Some(teachers) = target.course_teachers() {
        return teachers.contains(&caller.id);
    }

    if let Some(teacher) = target.teacher() {
        return teacher == caller.id;
    }

    false
}

impl TeachingScope for course_assignment::Model {
    fn teacher(&self) -> Option<Uuid> {
        Some(self.teacher_id)
    }
}

/// A course-owned record together with the teachers assigned to its course.
#[derive(Debug, Clone)]
pub struct CourseBound<'a, T> {
    pub record: &'a T,
    pub course_teachers: Vec<Uuid>,
}

impl<'a, T> CourseBound<'a, T> {
    pub fn new(record: &'a T, course_teachers: Vec<Uuid>) -> Self {
        Self {
            record,
            course_teachers,
        }
    }
}

impl<T> TeachingScope for CourseBound<'_, T> {
    fn course_teachers(&self) -> Option<&[Uuid]> {
        Some(&self.course_teachers)
    }
}
