//! Promotion Cycle Observability
//!
//! - Side-effect free with respect to the cycle
//! - Deterministic ordering (events are recorded in emission order)
//! - Never gates a cycle: a failed log write changes nothing
//!
//! Every cycle emits a start event and exactly one terminal event
//! (`Completed`, `Aborted`). A rejected trigger emits `Rejected` only.

use std::sync::Mutex;

use uuid::Uuid;

use crate::observability::{Logger, Severity};
use crate::school::ClassId;

/// Promotion cycle events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleEvent {
    /// promotion.cycle.started
    Started {
        cycle_id: Uuid,
        max_ordinal: u32,
        confirm_graduation: bool,
        /// Set when the cycle re-runs an earlier cycle's plan.
        rerun_of: Option<Uuid>,
    },

    /// promotion.cycle.snapshot_captured
    SnapshotCaptured {
        cycle_id: Uuid,
        classes: usize,
        students: usize,
    },

    /// promotion.cycle.plan_built
    PlanBuilt {
        cycle_id: Uuid,
        moves: usize,
        students_to_move: usize,
        graduation_candidates: usize,
        skipped: usize,
    },

    /// promotion.cycle.class_created
    ClassCreated {
        cycle_id: Uuid,
        class_id: ClassId,
        name: String,
    },

    /// promotion.cycle.entry_executed
    EntryExecuted {
        cycle_id: Uuid,
        source_class: String,
        destination_class: String,
        moved: usize,
        failed: usize,
    },

    /// promotion.cycle.graduation_deferred
    /// Candidates exist but the caller did not confirm deletion.
    GraduationDeferred { cycle_id: Uuid, candidates: usize },

    /// promotion.cycle.graduation_completed
    GraduationCompleted {
        cycle_id: Uuid,
        graduated: usize,
        failed: usize,
    },

    /// promotion.cycle.aborted
    /// Snapshot or planning failed; nothing was written.
    Aborted {
        cycle_id: Uuid,
        stage: &'static str,
        reason: String,
    },

    /// promotion.cycle.rejected
    /// Trigger refused before a cycle started.
    Rejected { reason: String },

    /// promotion.cycle.completed
    Completed {
        cycle_id: Uuid,
        moved: usize,
        graduated: usize,
        failures: usize,
    },
}

impl CycleEvent {
    /// Get the event name for logging/metrics.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "promotion.cycle.started",
            Self::SnapshotCaptured { .. } => "promotion.cycle.snapshot_captured",
            Self::PlanBuilt { .. } => "promotion.cycle.plan_built",
            Self::ClassCreated { .. } => "promotion.cycle.class_created",
            Self::EntryExecuted { .. } => "promotion.cycle.entry_executed",
            Self::GraduationDeferred { .. } => "promotion.cycle.graduation_deferred",
            Self::GraduationCompleted { .. } => "promotion.cycle.graduation_completed",
            Self::Aborted { .. } => "promotion.cycle.aborted",
            Self::Rejected { .. } => "promotion.cycle.rejected",
            Self::Completed { .. } => "promotion.cycle.completed",
        }
    }

    fn severity(&self) -> Severity {
        match self {
            Self::Aborted { .. } | Self::Rejected { .. } => Severity::Warn,
            Self::EntryExecuted { failed, .. } | Self::GraduationCompleted { failed, .. }
                if *failed > 0 =>
            {
                Severity::Warn
            }
            _ => Severity::Info,
        }
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Started {
                cycle_id,
                max_ordinal,
                confirm_graduation,
                rerun_of,
            } => {
                let mut fields = vec![
                    ("cycle_id", cycle_id.to_string()),
                    ("max_ordinal", max_ordinal.to_string()),
                    ("confirm_graduation", confirm_graduation.to_string()),
                ];
                if let Some(original) = rerun_of {
                    fields.push(("rerun_of", original.to_string()));
                }
                fields
            }
            Self::SnapshotCaptured {
                cycle_id,
                classes,
                students,
            } => vec![
                ("cycle_id", cycle_id.to_string()),
                ("classes", classes.to_string()),
                ("students", students.to_string()),
            ],
            Self::PlanBuilt {
                cycle_id,
                moves,
                students_to_move,
                graduation_candidates,
                skipped,
            } => vec![
                ("cycle_id", cycle_id.to_string()),
                ("moves", moves.to_string()),
                ("students_to_move", students_to_move.to_string()),
                ("graduation_candidates", graduation_candidates.to_string()),
                ("skipped", skipped.to_string()),
            ],
            Self::ClassCreated {
                cycle_id,
                class_id,
                name,
            } => vec![
                ("cycle_id", cycle_id.to_string()),
                ("class_id", class_id.to_string()),
                ("name", name.clone()),
            ],
            Self::EntryExecuted {
                cycle_id,
                source_class,
                destination_class,
                moved,
                failed,
            } => vec![
                ("cycle_id", cycle_id.to_string()),
                ("source", source_class.clone()),
                ("destination", destination_class.clone()),
                ("moved", moved.to_string()),
                ("failed", failed.to_string()),
            ],
            Self::GraduationDeferred {
                cycle_id,
                candidates,
            } => vec![
                ("cycle_id", cycle_id.to_string()),
                ("candidates", candidates.to_string()),
            ],
            Self::GraduationCompleted {
                cycle_id,
                graduated,
                failed,
            } => vec![
                ("cycle_id", cycle_id.to_string()),
                ("graduated", graduated.to_string()),
                ("failed", failed.to_string()),
            ],
            Self::Aborted {
                cycle_id,
                stage,
                reason,
            } => vec![
                ("cycle_id", cycle_id.to_string()),
                ("stage", stage.to_string()),
                ("reason", reason.clone()),
            ],
            Self::Rejected { reason } => vec![("reason", reason.clone())],
            Self::Completed {
                cycle_id,
                moved,
                graduated,
                failures,
            } => vec![
                ("cycle_id", cycle_id.to_string()),
                ("moved", moved.to_string()),
                ("graduated", graduated.to_string()),
                ("failures", failures.to_string()),
            ],
        }
    }
}

/// Collector for cycle events.
///
/// Each emitted event is logged and kept until the next cycle starts, so
/// callers can inspect what the last cycle did.
#[derive(Debug, Default)]
pub struct CycleObserver {
    events: Mutex<Vec<CycleEvent>>,
}

impl CycleObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit an event.
    pub fn emit(&self, event: CycleEvent) {
        let fields = event.fields();
        let borrowed: Vec<(&str, &str)> = fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        Logger::log(event.severity(), event.event_name(), &borrowed);

        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    pub fn events(&self) -> Vec<CycleEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}
