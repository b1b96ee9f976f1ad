//! Roster Snapshot
//!
//! The only consistency point of a promotion cycle. Captured once, before any
//! write, and never mutated afterwards. Planning, execution and graduation all
//! work from this capture; none of them re-read live rosters. That is what
//! keeps a student promoted into "Class 8" from being promoted again into
//! "Class 9" in the same cycle, and keeps this cycle's arrivals in the
//! terminal pool out of this cycle's graduation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::school::{ClassId, StoreResult, StudentId, TeacherId};

use super::ordinal::ClassOrdinal;
use super::registry::ClassRegistry;

/// One class as it stood at capture time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotClass {
    pub id: ClassId,
    pub name: String,
    pub teacher_id: Option<TeacherId>,
    /// Derived from `name`
    pub ordinal: Option<u32>,
    /// Roster at capture time, in id order
    pub student_ids: Vec<StudentId>,
}

impl SnapshotClass {
    pub fn new(id: ClassId, name: impl Into<String>, mut student_ids: Vec<StudentId>) -> Self {
        let name = name.into();
        student_ids.sort();
        student_ids.dedup();
        Self {
            id,
            ordinal: ClassOrdinal::ordinal_of(&name),
            name,
            teacher_id: None,
            student_ids,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.student_ids.is_empty()
    }
}

/// Immutable capture of every class roster at cycle start.
#[derive(Debug, Clone, Serialize)]
pub struct RosterSnapshot {
    captured_at: DateTime<Utc>,
    classes: Vec<SnapshotClass>,
}

impl RosterSnapshot {
    /// Record every class and its current roster, verbatim.
    pub fn capture(registry: &ClassRegistry<'_>) -> StoreResult<Self> {
        let summaries = registry.list()?;
        let mut classes = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let roster = registry.roster_of(summary.id)?;
            let mut class = SnapshotClass::new(summary.id, summary.name, roster);
            class.teacher_id = summary.teacher_id;
            classes.push(class);
        }
        Ok(Self::from_classes(classes))
    }

    /// Build a snapshot from already captured classes.
    pub fn from_classes(classes: Vec<SnapshotClass>) -> Self {
        Self {
            captured_at: Utc::now(),
            classes,
        }
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn classes(&self) -> &[SnapshotClass] {
        &self.classes
    }

    pub fn class(&self, class_id: ClassId) -> Option<&SnapshotClass> {
        self.classes.iter().find(|c| c.id == class_id)
    }

    pub fn class_by_name(&self, name: &str) -> Option<&SnapshotClass> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// Captured roster of a class.
    pub fn roster_of(&self, class_id: ClassId) -> Option<&[StudentId]> {
        self.class(class_id).map(|c| c.student_ids.as_slice())
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn student_count(&self) -> usize {
        self.classes.iter().map(|c| c.student_ids.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::school::{InMemorySchoolStore, SchoolStore};

    #[test]
    fn test_capture_records_all_rosters() {
        let store = InMemorySchoolStore::new();
        let c1 = store.add_class("Class 1").unwrap();
        let pool = store.add_class("Last Year Students").unwrap();
        let empty = store.add_class("Class 2").unwrap();
        store.enroll(c1, 3).unwrap();
        store.enroll(pool, 2).unwrap();

        let snapshot = RosterSnapshot::capture(&ClassRegistry::new(&store)).unwrap();

        assert_eq!(snapshot.class_count(), 3);
        assert_eq!(snapshot.student_count(), 5);
        assert_eq!(snapshot.class(c1).unwrap().ordinal, Some(1));
        assert_eq!(snapshot.class(pool).unwrap().ordinal, None);
        assert!(snapshot.class(empty).unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_does_not_follow_later_writes() {
        let store = InMemorySchoolStore::new();
        let c1 = store.add_class("Class 1").unwrap();
        let c2 = store.add_class("Class 2").unwrap();
        let ids = store.enroll(c1, 2).unwrap();

        let snapshot = RosterSnapshot::capture(&ClassRegistry::new(&store)).unwrap();
        store.move_students(&ids, c1, c2).unwrap();

        assert_eq!(snapshot.roster_of(c1).unwrap().len(), 2);
        assert!(snapshot.roster_of(c2).unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_class_sorts_and_dedups() {
        let a = StudentId::new();
        let b = StudentId::new();
        let class = SnapshotClass::new(ClassId::new(), "Class 3", vec![b, a, b]);

        assert_eq!(class.student_ids.len(), 2);
        assert!(class.student_ids[0] < class.student_ids[1]);
        assert_eq!(class.ordinal, Some(3));
    }
}
