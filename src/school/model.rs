//! School records touched by the lifecycle engine
//!
//! Only the fields the engine reads or writes are modelled here. A student's
//! class membership is the only state a promotion cycle mutates; the student
//! record itself is destroyed only by graduation.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque class identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(pub Uuid);

/// Opaque student identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub Uuid);

/// Opaque teacher reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeacherId(pub Uuid);

impl ClassId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl StudentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl TeacherId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClassId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for StudentId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for TeacherId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TeacherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub id: ClassId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<TeacherId>,
}

impl ClassRecord {
    /// Create a class with a fresh id and no teacher.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ClassId::new(),
            name: name.into(),
            teacher_id: None,
        }
    }

    pub fn with_teacher(mut self, teacher_id: TeacherId) -> Self {
        self.teacher_id = Some(teacher_id);
        self
    }
}

/// A class as listed by the store, with its current roster size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub id: ClassId,
    pub name: String,
    pub teacher_id: Option<TeacherId>,
    pub student_count: usize,
}

/// A stored student. `class_id == None` means unassigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: StudentId,
    #[serde(default)]
    pub class_id: Option<ClassId>,
}

impl StudentRecord {
    pub fn new(class_id: Option<ClassId>) -> Self {
        Self {
            id: StudentId::new(),
            class_id,
        }
    }
}

/// Per-student outcome of a guarded move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MoveOutcome {
    /// Student was in the source class and now belongs to the destination.
    Moved,
    /// Student was no longer in the source class; nothing changed.
    NotInSource { current: Option<ClassId> },
    /// Student does not exist.
    NotFound,
}

/// Outcome of a guarded student deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    /// Student exists but is no longer in the expected class; not deleted.
    NotInClass { current: Option<ClassId> },
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_transparently() {
        let id = ClassId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.0));

        let back: ClassId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_class_record_defaults_to_no_teacher() {
        let class = ClassRecord::new("Class 3");
        assert_eq!(class.name, "Class 3");
        assert!(class.teacher_id.is_none());

        let teacher = TeacherId::new();
        let class = class.with_teacher(teacher);
        assert_eq!(class.teacher_id, Some(teacher));
    }

    #[test]
    fn test_student_without_class_parses() {
        let id = StudentId::new();
        let json = format!(r#"{{"id":"{}"}}"#, id);
        let student: StudentRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(student.id, id);
        assert!(student.class_id.is_none());
    }

    #[test]
    fn test_move_outcome_json_shape() {
        let json = serde_json::to_value(MoveOutcome::NotInSource { current: None }).unwrap();
        assert_eq!(json["outcome"], "not_in_source");
    }
}
