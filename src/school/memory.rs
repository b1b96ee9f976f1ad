//! In-memory school store
//!
//! Backs the tests and serves as the working set of [`JsonFileStore`].
//! Class names are unique; student listings are ordered by id so rosters are
//! stable across calls.
//!
//! [`JsonFileStore`]: super::file::JsonFileStore

use std::collections::BTreeMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use super::errors::{StoreError, StoreResult};
use super::model::{
    ClassId, ClassRecord, ClassSummary, DeleteOutcome, MoveOutcome, StudentId, StudentRecord,
    TeacherId,
};
use super::store::SchoolStore;

/// Serializable form of the whole school.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolDocument {
    #[serde(default)]
    pub classes: Vec<ClassRecord>,
    #[serde(default)]
    pub students: Vec<StudentRecord>,
}

#[derive(Debug, Default)]
struct SchoolState {
    classes: BTreeMap<ClassId, ClassRecord>,
    students: BTreeMap<StudentId, StudentRecord>,
}

impl SchoolState {
    fn name_taken(&self, name: &str) -> bool {
        self.classes.values().any(|c| c.name == name)
    }
}

/// In-memory store guarded by a single `RwLock`.
#[derive(Debug, Default)]
pub struct InMemorySchoolStore {
    state: RwLock<SchoolState>,
}

impl InMemorySchoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a document, enforcing name uniqueness.
    pub fn from_document(doc: SchoolDocument) -> StoreResult<Self> {
        let store = Self::new();
        for class in doc.classes {
            store.insert_class(class)?;
        }
        for student in doc.students {
            store.insert_student(student)?;
        }
        Ok(store)
    }

    /// Export the current contents.
    pub fn to_document(&self) -> StoreResult<SchoolDocument> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(SchoolDocument {
            classes: state.classes.values().cloned().collect(),
            students: state.students.values().cloned().collect(),
        })
    }

    /// Replace the whole contents with `doc`, enforcing name uniqueness.
    /// On error the current contents are kept.
    pub fn replace_contents(&self, doc: SchoolDocument) -> StoreResult<()> {
        let fresh = Self::from_document(doc)?
            .state
            .into_inner()
            .map_err(|_| StoreError::LockPoisoned)?;
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        *state = fresh;
        Ok(())
    }

    /// Insert an existing class record.
    pub fn insert_class(&self, class: ClassRecord) -> StoreResult<ClassId> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        if state.name_taken(&class.name) {
            return Err(StoreError::DuplicateClassName(class.name));
        }
        let id = class.id;
        state.classes.insert(id, class);
        Ok(id)
    }

    /// Insert a student record. Its class, if any, must exist.
    pub fn insert_student(&self, student: StudentRecord) -> StoreResult<StudentId> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        if let Some(class_id) = student.class_id {
            if !state.classes.contains_key(&class_id) {
                return Err(StoreError::ClassNotFound(class_id));
            }
        }
        let id = student.id;
        state.students.insert(id, student);
        Ok(id)
    }

    /// Create a class by name and return its id.
    pub fn add_class(&self, name: &str) -> StoreResult<ClassId> {
        self.insert_class(ClassRecord::new(name))
    }

    /// Enroll `count` new students into a class.
    pub fn enroll(&self, class_id: ClassId, count: usize) -> StoreResult<Vec<StudentId>> {
        (0..count)
            .map(|_| self.insert_student(StudentRecord::new(Some(class_id))))
            .collect()
    }

    /// Unconditionally change a student's class (manual re-assignment).
    pub fn reassign_student(&self, student_id: StudentId, class_id: Option<ClassId>) -> StoreResult<()> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        if let Some(target) = class_id {
            if !state.classes.contains_key(&target) {
                return Err(StoreError::ClassNotFound(target));
            }
        }
        match state.students.get_mut(&student_id) {
            Some(student) => {
                student.class_id = class_id;
                Ok(())
            }
            None => Err(StoreError::StudentNotFound(student_id)),
        }
    }

    /// Remove a student without any guard (external deletion).
    pub fn remove_student(&self, student_id: StudentId) -> StoreResult<bool> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.students.remove(&student_id).is_some())
    }

    pub fn student(&self, student_id: StudentId) -> StoreResult<Option<StudentRecord>> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.students.get(&student_id).cloned())
    }

    pub fn class_by_name(&self, name: &str) -> StoreResult<Option<ClassRecord>> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.classes.values().find(|c| c.name == name).cloned())
    }

    pub fn class_count(&self) -> StoreResult<usize> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.classes.len())
    }

    pub fn student_count(&self) -> StoreResult<usize> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.students.len())
    }
}

impl SchoolStore for InMemorySchoolStore {
    fn list_classes(&self) -> StoreResult<Vec<ClassSummary>> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut summaries: Vec<ClassSummary> = state
            .classes
            .values()
            .map(|class| ClassSummary {
                id: class.id,
                name: class.name.clone(),
                teacher_id: class.teacher_id,
                student_count: state
                    .students
                    .values()
                    .filter(|s| s.class_id == Some(class.id))
                    .count(),
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(summaries)
    }

    fn list_students_by_class(&self, class_id: ClassId) -> StoreResult<Vec<StudentRecord>> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        if !state.classes.contains_key(&class_id) {
            return Err(StoreError::ClassNotFound(class_id));
        }
        Ok(state
            .students
            .values()
            .filter(|s| s.class_id == Some(class_id))
            .cloned()
            .collect())
    }

    fn create_class(&self, name: &str, teacher_id: Option<TeacherId>) -> StoreResult<ClassRecord> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        if state.name_taken(name) {
            return Err(StoreError::DuplicateClassName(name.to_string()));
        }
        let class = ClassRecord {
            id: ClassId::new(),
            name: name.to_string(),
            teacher_id,
        };
        state.classes.insert(class.id, class.clone());
        Ok(class)
    }

    fn move_students(
        &self,
        student_ids: &[StudentId],
        from: ClassId,
        to: ClassId,
    ) -> StoreResult<Vec<(StudentId, MoveOutcome)>> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        if !state.classes.contains_key(&to) {
            return Err(StoreError::ClassNotFound(to));
        }

        let outcomes = student_ids
            .iter()
            .map(|id| {
                let outcome = match state.students.get_mut(id) {
                    None => MoveOutcome::NotFound,
                    Some(student) if student.class_id == Some(from) => {
                        student.class_id = Some(to);
                        MoveOutcome::Moved
                    }
                    Some(student) => MoveOutcome::NotInSource {
                        current: student.class_id,
                    },
                };
                (*id, outcome)
            })
            .collect();
        Ok(outcomes)
    }

    fn delete_student(
        &self,
        student_id: StudentId,
        expected_class: ClassId,
    ) -> StoreResult<DeleteOutcome> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        let current = match state.students.get(&student_id) {
            None => return Ok(DeleteOutcome::NotFound),
            Some(student) => student.class_id,
        };
        if current != Some(expected_class) {
            return Ok(DeleteOutcome::NotInClass { current });
        }
        state.students.remove(&student_id);
        Ok(DeleteOutcome::Deleted)
    }
}
