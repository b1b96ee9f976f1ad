//! Promotion Executor
//!
//! Realizes the move entries of a plan:
//! 1. resolve (or create) the destination class
//! 2. move each captured student, only if still in the source class
//! 3. record per-student moved / already-moved / failed
//!
//! Failure policy:
//! - destination cannot be resolved: the entry's cohort is reported as
//!   failed and nothing is moved; the source roster is untouched
//! - one student fails: recorded, the rest of the entry proceeds
//!
//! Re-running an entry only affects students still in the source class, so
//! a second run after partial success is safe.

use std::collections::HashMap;

use serde::Serialize;

use crate::observability::Logger;
use crate::school::{ClassId, MoveOutcome, SchoolStore, StoreError, StoreResult, StudentId};

use super::errors::FailureRecord;
use super::plan::MoveEntry;
use super::registry::{ClassRegistry, ResolvedClass};

/// A class created while resolving destinations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedClass {
    pub id: ClassId,
    pub name: String,
}

/// Result of executing one move entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryOutcome {
    pub source_class_id: ClassId,
    pub source_class_name: String,
    pub destination_class_name: String,
    /// `None` when the destination could not be resolved
    pub destination_class_id: Option<ClassId>,
    pub moved: Vec<StudentId>,
    /// Already in the destination class; silently skipped
    pub already_moved: Vec<StudentId>,
    pub failures: Vec<FailureRecord>,
}

impl EntryOutcome {
    fn new(entry: &MoveEntry) -> Self {
        Self {
            source_class_id: entry.source_class_id,
            source_class_name: entry.source_class_name.clone(),
            destination_class_name: entry.destination_class_name.clone(),
            destination_class_id: None,
            moved: Vec::new(),
            already_moved: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// Result of executing all move entries of a cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    pub entries: Vec<EntryOutcome>,
    pub classes_created: Vec<CreatedClass>,
}

impl ExecutionReport {
    pub fn moved_count(&self) -> usize {
        self.entries.iter().map(|e| e.moved.len()).sum()
    }

    pub fn already_moved_count(&self) -> usize {
        self.entries.iter().map(|e| e.already_moved.len()).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FailureRecord> {
        self.entries.iter().flat_map(|e| e.failures.iter())
    }
}

pub struct PromotionExecutor<'a> {
    store: &'a dyn SchoolStore,
    registry: ClassRegistry<'a>,
}

impl<'a> PromotionExecutor<'a> {
    pub fn new(store: &'a dyn SchoolStore) -> Self {
        Self {
            store,
            registry: ClassRegistry::new(store),
        }
    }

    /// Execute every entry. Entries are disjoint by source class.
    pub fn execute(&self, moves: &[MoveEntry]) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        for entry in moves {
            let (outcome, created) = self.execute_entry(entry);
            if let Some(created) = created {
                report.classes_created.push(created);
            }
            report.entries.push(outcome);
        }
        report
    }

    fn execute_entry(&self, entry: &MoveEntry) -> (EntryOutcome, Option<CreatedClass>) {
        let mut outcome = EntryOutcome::new(entry);

        let destination = match self.registry.find_or_create(&entry.destination_class_name) {
            Ok(resolved) => resolved,
            Err(e) => {
                Logger::warn(
                    "CLASS_RESOLUTION_FAILED",
                    &[
                        ("destination", entry.destination_class_name.as_str()),
                        ("error", e.to_string().as_str()),
                        ("source", entry.source_class_name.as_str()),
                    ],
                );
                outcome.failures = entry
                    .student_ids
                    .iter()
                    .map(|id| {
                        FailureRecord::class_resolution(
                            entry.source_class_id,
                            *id,
                            &entry.destination_class_name,
                            e.to_string(),
                        )
                    })
                    .collect();
                return (outcome, None);
            }
        };

        let created = destination.created.then(|| CreatedClass {
            id: destination.id,
            name: destination.name.clone(),
        });
        outcome.destination_class_id = Some(destination.id);

        for (student_id, result) in self.apply_moves(entry, &destination) {
            match result {
                Ok(MoveOutcome::Moved) => outcome.moved.push(student_id),
                Ok(MoveOutcome::NotInSource { current }) if current == Some(destination.id) => {
                    outcome.already_moved.push(student_id)
                }
                Ok(MoveOutcome::NotInSource { current }) => {
                    let reason = match current {
                        Some(class_id) => format!(
                            "student is no longer in '{}' (now in {})",
                            entry.source_class_name, class_id
                        ),
                        None => format!(
                            "student is no longer in '{}' (now unassigned)",
                            entry.source_class_name
                        ),
                    };
                    outcome
                        .failures
                        .push(FailureRecord::student_move(entry.source_class_id, student_id, reason));
                }
                Ok(MoveOutcome::NotFound) => outcome.failures.push(FailureRecord::student_move(
                    entry.source_class_id,
                    student_id,
                    "student no longer exists",
                )),
                Err(e) => outcome.failures.push(FailureRecord::student_move(
                    entry.source_class_id,
                    student_id,
                    e.to_string(),
                )),
            }
        }

        if !outcome.failures.is_empty() {
            Logger::warn(
                "STUDENT_MOVES_FAILED",
                &[
                    ("failed", outcome.failures.len().to_string().as_str()),
                    ("source", entry.source_class_name.as_str()),
                ],
            );
        }

        (outcome, created)
    }

    /// Move the cohort in one batch; if the batch call fails as a whole,
    /// retry one student at a time so a single bad id cannot sink the rest.
    fn apply_moves(
        &self,
        entry: &MoveEntry,
        destination: &ResolvedClass,
    ) -> Vec<(StudentId, StoreResult<MoveOutcome>)> {
        if entry.student_ids.is_empty() {
            return Vec::new();
        }

        match self
            .store
            .move_students(&entry.student_ids, entry.source_class_id, destination.id)
        {
            Ok(outcomes) => {
                let mut by_id: HashMap<StudentId, MoveOutcome> = outcomes.into_iter().collect();
                entry
                    .student_ids
                    .iter()
                    .map(|id| {
                        let result = by_id.remove(id).ok_or_else(|| {
                            StoreError::Unavailable(
                                "store reported no outcome for student".to_string(),
                            )
                        });
                        (*id, result)
                    })
                    .collect()
            }
            Err(_) => entry
                .student_ids
                .iter()
                .map(|id| (*id, self.move_one(*id, entry.source_class_id, destination.id)))
                .collect(),
        }
    }

    fn move_one(&self, student_id: StudentId, from: ClassId, to: ClassId) -> StoreResult<MoveOutcome> {
        let outcomes = self.store.move_students(&[student_id], from, to)?;
        outcomes
            .into_iter()
            .find(|(id, _)| *id == student_id)
            .map(|(_, outcome)| outcome)
            .ok_or_else(|| {
                StoreError::Unavailable(
                    "store reported no outcome for student".to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::errors::FailureKind;
    use crate::school::InMemorySchoolStore;

    fn entry(source: ClassId, name: &str, ordinal: u32, dest: &str, ids: Vec<StudentId>) -> MoveEntry {
        MoveEntry {
            source_class_id: source,
            source_class_name: name.to_string(),
            source_ordinal: ordinal,
            destination_class_name: dest.to_string(),
            student_ids: ids,
        }
    }

    #[test]
    fn test_execute_creates_destination_and_moves() {
        let store = InMemorySchoolStore::new();
        let c10 = store.add_class("Class 10").unwrap();
        let ids = store.enroll(c10, 3).unwrap();

        let executor = PromotionExecutor::new(&store);
        let report = executor.execute(&[entry(c10, "Class 10", 10, "Last Year Students", ids.clone())]);

        assert_eq!(report.moved_count(), 3);
        assert_eq!(report.classes_created.len(), 1);
        let pool = store.class_by_name("Last Year Students").unwrap().unwrap();
        assert_eq!(report.classes_created[0].id, pool.id);
        for id in ids {
            assert_eq!(store.student(id).unwrap().unwrap().class_id, Some(pool.id));
        }
    }

    #[test]
    fn test_existing_destination_is_reused() {
        let store = InMemorySchoolStore::new();
        let c1 = store.add_class("Class 1").unwrap();
        let c2 = store.add_class("Class 2").unwrap();
        let ids = store.enroll(c1, 2).unwrap();

        let report = PromotionExecutor::new(&store).execute(&[entry(c1, "Class 1", 1, "Class 2", ids)]);

        assert!(report.classes_created.is_empty());
        assert_eq!(report.entries[0].destination_class_id, Some(c2));
        assert_eq!(store.class_count().unwrap(), 2);
    }

    #[test]
    fn test_stale_member_is_reported_not_moved() {
        let store = InMemorySchoolStore::new();
        let c3 = store.add_class("Class 3").unwrap();
        let other = store.add_class("Remedial").unwrap();
        let ids = store.enroll(c3, 2).unwrap();
        store.reassign_student(ids[0], Some(other)).unwrap();

        let report = PromotionExecutor::new(&store).execute(&[entry(c3, "Class 3", 3, "Class 4", ids.clone())]);

        let outcome = &report.entries[0];
        assert_eq!(outcome.moved, vec![ids[1]]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].kind, FailureKind::StudentMoveFailure);
        assert_eq!(outcome.failures[0].student_id, Some(ids[0]));
        assert_eq!(store.student(ids[0]).unwrap().unwrap().class_id, Some(other));
    }

    #[test]
    fn test_rerun_skips_already_moved() {
        let store = InMemorySchoolStore::new();
        let c3 = store.add_class("Class 3").unwrap();
        let ids = store.enroll(c3, 2).unwrap();
        let plan = [entry(c3, "Class 3", 3, "Class 4", ids)];

        let executor = PromotionExecutor::new(&store);
        let first = executor.execute(&plan);
        let second = executor.execute(&plan);

        assert_eq!(first.moved_count(), 2);
        assert_eq!(second.moved_count(), 0);
        assert_eq!(second.already_moved_count(), 2);
        assert_eq!(second.failures().count(), 0);
        assert!(second.classes_created.is_empty());
    }

    #[test]
    fn test_deleted_student_does_not_abort_entry() {
        let store = InMemorySchoolStore::new();
        let c5 = store.add_class("Class 5").unwrap();
        let ids = store.enroll(c5, 3).unwrap();
        store.remove_student(ids[1]).unwrap();

        let report = PromotionExecutor::new(&store).execute(&[entry(c5, "Class 5", 5, "Class 6", ids)]);

        assert_eq!(report.moved_count(), 2);
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_unresolvable_destination_leaves_cohort() {
        let store = InMemorySchoolStore::new();
        let c7 = store.add_class("Class 7").unwrap();
        store.add_class("Grade 8").unwrap();
        let ids = store.enroll(c7, 2).unwrap();

        let report = PromotionExecutor::new(&store).execute(&[entry(c7, "Class 7", 7, "Class 8", ids.clone())]);

        let outcome = &report.entries[0];
        assert!(outcome.destination_class_id.is_none());
        assert!(outcome.moved.is_empty());
        assert_eq!(outcome.failures.len(), 2);
        assert!(outcome
            .failures
            .iter()
            .all(|f| f.kind == FailureKind::ClassResolutionFailure));
        for id in ids {
            assert_eq!(store.student(id).unwrap().unwrap().class_id, Some(c7));
        }
    }
}
