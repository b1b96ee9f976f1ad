//! Graduation Sweeper
//!
//! Permanently deletes the students that were in the terminal pool when the
//! cycle's snapshot was taken. Deletion is the one irreversible step of a
//! cycle; the orchestrator only calls the sweeper after explicit confirmation.
//!
//! The sweeper never looks at the terminal pool as it stands after the
//! executor ran. Students promoted into the pool during this cycle are not in
//! the sweep entry and survive until the next cycle.

use serde::Serialize;
use uuid::Uuid;

use crate::observability::{AuditAction, AuditLog, AuditOutcome, AuditRecord, Logger};
use crate::school::{DeleteOutcome, SchoolStore, StudentId};

use super::errors::FailureRecord;
use super::plan::SweepEntry;

/// Result of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub graduated: Vec<StudentId>,
    /// Already gone before the sweep reached them
    pub already_removed: Vec<StudentId>,
    pub failures: Vec<FailureRecord>,
}

impl SweepReport {
    pub fn graduated_count(&self) -> usize {
        self.graduated.len()
    }
}

pub struct GraduationSweeper<'a> {
    store: &'a dyn SchoolStore,
    audit: &'a dyn AuditLog,
    cycle_id: Uuid,
}

impl<'a> GraduationSweeper<'a> {
    pub fn new(store: &'a dyn SchoolStore, audit: &'a dyn AuditLog, cycle_id: Uuid) -> Self {
        Self {
            store,
            audit,
            cycle_id,
        }
    }

    /// Delete every student of the entry's pre-cycle roster.
    pub fn sweep(&self, entry: &SweepEntry) -> SweepReport {
        let mut report = SweepReport::default();

        for &student_id in &entry.student_ids {
            let failure = match self.store.delete_student(student_id, entry.terminal_class_id) {
                Ok(DeleteOutcome::Deleted) => {
                    report.graduated.push(student_id);
                    None
                }
                // deleted by an earlier run of the same plan; nothing to audit
                Ok(DeleteOutcome::NotFound) => {
                    report.already_removed.push(student_id);
                    continue;
                }
                Ok(DeleteOutcome::NotInClass { current }) => Some(match current {
                    Some(class_id) => format!(
                        "student left '{}' for {} after the snapshot",
                        entry.terminal_class_name, class_id
                    ),
                    None => format!(
                        "student left '{}' after the snapshot",
                        entry.terminal_class_name
                    ),
                }),
                Err(e) => Some(e.to_string()),
            };

            match failure {
                None => self.audit(student_id, entry, None),
                Some(reason) => {
                    self.audit(student_id, entry, Some(&reason));
                    report.failures.push(FailureRecord::graduation(
                        entry.terminal_class_id,
                        student_id,
                        reason,
                    ));
                }
            }
        }

        if !report.failures.is_empty() {
            Logger::warn(
                "GRADUATION_FAILURES",
                &[
                    ("class", entry.terminal_class_name.as_str()),
                    ("failed", report.failures.len().to_string().as_str()),
                ],
            );
        }

        report
    }

    fn audit(&self, student_id: StudentId, entry: &SweepEntry, failure: Option<&str>) {
        let outcome = if failure.is_some() {
            AuditOutcome::Failed
        } else {
            AuditOutcome::Success
        };
        let mut record = AuditRecord::new(AuditAction::StudentGraduated, outcome)
            .with_cycle(self.cycle_id)
            .with_class(entry.terminal_class_id.0)
            .with_student(student_id.0);
        if let Some(reason) = failure {
            record = record.with_error(reason);
        }

        // Audit failure never changes the sweep outcome.
        if let Err(e) = self.audit.append(&record) {
            Logger::error(
                "AUDIT_APPEND_FAILED",
                &[
                    ("error", e.to_string().as_str()),
                    ("student", student_id.to_string().as_str()),
                ],
            );
        }
    }
}
