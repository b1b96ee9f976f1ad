//! Academic promotion lifecycle
//!
//! Once per academic year every student moves up one grade, the highest
//! grade moves into the terminal pool, and whoever was already in the pool
//! graduates (is deleted).
//!
//! A cycle is snapshot → plan → execute → sweep → report:
//! - `RosterSnapshot` fixes which students move, once, before any write
//! - `PromotionPlan` maps every non-empty class to its destination
//! - `PromotionExecutor` creates missing classes and moves students with
//!   compare-and-set semantics
//! - `GraduationSweeper` deletes the pre-cycle terminal roster, only after
//!   explicit confirmation
//! - `PromotionCycleOrchestrator` drives the stages, allows one cycle at a
//!   time and reports per-class counts and failures
//!
//! `PromotionCycleOrchestrator::rerun_last` re-executes the last plan. Moves
//! only touch students still in their source class and deletions skip
//! students already gone, so a re-run retries failures and nothing else.
//! A `PlanFile` keeps that plan on disk between processes.

mod errors;
mod executor;
mod observability;
mod ordinal;
mod orchestrator;
mod plan;
mod registry;
mod report;
mod request;
mod retained;
mod snapshot;
mod state;
mod sweeper;

pub use errors::{CycleError, CycleResult, FailureKind, FailureRecord, PlanError};
pub use executor::{CreatedClass, EntryOutcome, ExecutionReport, PromotionExecutor};
pub use observability::{CycleEvent, CycleObserver};
pub use ordinal::{ClassOrdinal, DEFAULT_TERMINAL_CLASS_NAME};
pub use orchestrator::PromotionCycleOrchestrator;
pub use plan::{MoveEntry, PromotionPlan, SkipReason, SkippedClass, SweepEntry};
pub use registry::{ClassRegistry, ResolvedClass};
pub use report::{
    ClassMoveSummary, CyclePreview, CycleReport, GraduationStatus, GraduationSummary, PlannedMove,
};
pub use request::PromotionCycleRequest;
pub use retained::{PlanFile, RetainedPlan};
pub use snapshot::{RosterSnapshot, SnapshotClass};
pub use state::CycleState;
pub use sweeper::{GraduationSweeper, SweepReport};
