//! School store contract
//!
//! The lifecycle engine reaches classes and students only through this trait.
//! Every call is blocking; callers await completion before moving on.

use super::errors::StoreResult;
use super::model::{
    ClassId, ClassRecord, ClassSummary, DeleteOutcome, MoveOutcome, StudentId, StudentRecord,
    TeacherId,
};

/// Store operations consumed by the promotion engine.
pub trait SchoolStore: Send + Sync {
    /// List every class with its current roster size.
    fn list_classes(&self) -> StoreResult<Vec<ClassSummary>>;

    /// List the students currently assigned to a class.
    fn list_students_by_class(&self, class_id: ClassId) -> StoreResult<Vec<StudentRecord>>;

    /// Create a class.
    ///
    /// Must fail with `StoreError::DuplicateClassName` when a class with
    /// the exact same name already exists.
    fn create_class(&self, name: &str, teacher_id: Option<TeacherId>) -> StoreResult<ClassRecord>;

    /// Move students from one class to another.
    ///
    /// A student is moved only if its current class is still `from`.
    /// One outcome is returned per requested id, in request order.
    fn move_students(
        &self,
        student_ids: &[StudentId],
        from: ClassId,
        to: ClassId,
    ) -> StoreResult<Vec<(StudentId, MoveOutcome)>>;

    /// Permanently delete a student, provided it is still in `expected_class`.
    fn delete_student(
        &self,
        student_id: StudentId,
        expected_class: ClassId,
    ) -> StoreResult<DeleteOutcome>;
}
