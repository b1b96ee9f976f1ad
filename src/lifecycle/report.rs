//! Cycle reports
//!
//! What an administrator sees after a cycle (`CycleReport`) or before
//! confirming one (`CyclePreview`).

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::school::ClassId;

use super::errors::FailureRecord;
use super::executor::{CreatedClass, EntryOutcome};
use super::plan::{PromotionPlan, SkippedClass};
use super::snapshot::RosterSnapshot;

/// Move counts for one source class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassMoveSummary {
    pub source_class_id: ClassId,
    pub source_class_name: String,
    pub destination_class_name: String,
    pub destination_class_id: Option<ClassId>,
    pub moved: usize,
    pub already_moved: usize,
    pub failed: usize,
}

impl From<&EntryOutcome> for ClassMoveSummary {
    fn from(outcome: &EntryOutcome) -> Self {
        Self {
            source_class_id: outcome.source_class_id,
            source_class_name: outcome.source_class_name.clone(),
            destination_class_name: outcome.destination_class_name.clone(),
            destination_class_id: outcome.destination_class_id,
            moved: outcome.moved.len(),
            already_moved: outcome.already_moved.len(),
            failed: outcome.failures.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GraduationStatus {
    /// Sweep ran over the pre-cycle terminal roster
    Completed,
    /// Candidates exist but deletion was not confirmed; nobody was deleted
    PendingConfirmation,
    /// Terminal pool was empty (or absent) at snapshot time
    NothingToGraduate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraduationSummary {
    pub status: GraduationStatus,
    pub terminal_class_id: Option<ClassId>,
    /// Pre-cycle terminal roster size
    pub candidates: usize,
    pub graduated: usize,
    pub already_removed: usize,
    pub failed: usize,
}

impl GraduationSummary {
    pub fn nothing_to_graduate() -> Self {
        Self {
            status: GraduationStatus::NothingToGraduate,
            terminal_class_id: None,
            candidates: 0,
            graduated: 0,
            already_removed: 0,
            failed: 0,
        }
    }

    pub fn pending(terminal_class_id: ClassId, candidates: usize) -> Self {
        Self {
            status: GraduationStatus::PendingConfirmation,
            terminal_class_id: Some(terminal_class_id),
            candidates,
            graduated: 0,
            already_removed: 0,
            failed: 0,
        }
    }
}

/// Summary of one completed cycle.
///
/// A cycle that reaches this report has completed, possibly with recorded
/// failures. Re-triggering converges any failures that were transient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    /// Cycle whose plan this run re-executed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rerun_of: Option<Uuid>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub max_ordinal: u32,
    pub per_class: Vec<ClassMoveSummary>,
    pub classes_created: Vec<CreatedClass>,
    pub graduation: GraduationSummary,
    pub students_graduated: usize,
    pub skipped: Vec<SkippedClass>,
    pub failures: Vec<FailureRecord>,
}

impl CycleReport {
    pub fn total_moved(&self) -> usize {
        self.per_class.iter().map(|c| c.moved).sum()
    }

    /// Moved count for the class that was named `source` at snapshot time.
    pub fn moved_from(&self, source: &str) -> Option<usize> {
        self.per_class
            .iter()
            .find(|c| c.source_class_name == source)
            .map(|c| c.moved)
    }

    /// No failures were recorded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Destination of one class in a preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedMove {
    pub source_class_name: String,
    pub destination_class_name: String,
    pub students: usize,
}

/// Read-only view of what a cycle would do right now.
///
/// `graduation_candidates` is the count the caller displays before asking
/// for confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CyclePreview {
    pub captured_at: DateTime<Utc>,
    pub max_ordinal: u32,
    pub terminal_class_name: String,
    pub moves: Vec<PlannedMove>,
    pub classes_to_create: Vec<String>,
    pub students_to_move: usize,
    pub graduation_candidates: usize,
    pub skipped: Vec<SkippedClass>,
}

impl CyclePreview {
    pub fn new(snapshot: &RosterSnapshot, plan: &PromotionPlan) -> Self {
        Self {
            captured_at: snapshot.captured_at(),
            max_ordinal: plan.max_ordinal(),
            terminal_class_name: plan.terminal_class_name().to_string(),
            moves: plan
                .moves()
                .iter()
                .map(|m| PlannedMove {
                    source_class_name: m.source_class_name.clone(),
                    destination_class_name: m.destination_class_name.clone(),
                    students: m.student_ids.len(),
                })
                .collect(),
            classes_to_create: plan.classes_to_create(snapshot),
            students_to_move: plan.students_to_move(),
            graduation_candidates: plan.graduation_count(),
            skipped: plan.skipped().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::ordinal::ClassOrdinal;
    use crate::lifecycle::snapshot::SnapshotClass;
    use crate::school::StudentId;

    fn ids(n: usize) -> Vec<StudentId> {
        (0..n).map(|_| StudentId::new()).collect()
    }

    #[test]
    fn test_preview_counts() {
        let snapshot = RosterSnapshot::from_classes(vec![
            SnapshotClass::new(ClassId::new(), "Class 9", ids(4)),
            SnapshotClass::new(ClassId::new(), "Class 10", ids(3)),
            SnapshotClass::new(ClassId::new(), "Last Year Students", ids(5)),
        ]);
        let plan = PromotionPlan::build(&snapshot, 10, &ClassOrdinal::default()).unwrap();
        let preview = CyclePreview::new(&snapshot, &plan);

        assert_eq!(preview.students_to_move, 7);
        assert_eq!(preview.graduation_candidates, 5);
        assert_eq!(preview.moves[0].source_class_name, "Class 10");
        assert_eq!(preview.moves[0].destination_class_name, "Last Year Students");
        assert_eq!(preview.classes_to_create, Vec::<String>::new());
    }

    #[test]
    fn test_graduation_status_serializes_snake_case() {
        let summary = GraduationSummary::pending(ClassId::new(), 5);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["status"], "pending_confirmation");
        assert_eq!(json["candidates"], 5);
    }

    #[test]
    fn test_report_totals() {
        let now = Utc::now();
        let report = CycleReport {
            cycle_id: Uuid::new_v4(),
            rerun_of: None,
            started_at: now,
            finished_at: now,
            max_ordinal: 10,
            per_class: vec![
                ClassMoveSummary {
                    source_class_id: ClassId::new(),
                    source_class_name: "Class 2".into(),
                    destination_class_name: "Class 3".into(),
                    destination_class_id: Some(ClassId::new()),
                    moved: 4,
                    already_moved: 0,
                    failed: 0,
                },
                ClassMoveSummary {
                    source_class_id: ClassId::new(),
                    source_class_name: "Class 1".into(),
                    destination_class_name: "Class 2".into(),
                    destination_class_id: Some(ClassId::new()),
                    moved: 6,
                    already_moved: 1,
                    failed: 0,
                },
            ],
            classes_created: vec![],
            graduation: GraduationSummary::nothing_to_graduate(),
            students_graduated: 0,
            skipped: vec![],
            failures: vec![],
        };

        assert_eq!(report.total_moved(), 10);
        assert_eq!(report.moved_from("Class 1"), Some(6));
        assert_eq!(report.moved_from("Class 7"), None);
        assert!(report.is_clean());
    }
}
