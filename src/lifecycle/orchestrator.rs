//! Promotion Cycle Orchestrator
//!
//! Entry point of the engine. One cycle:
//! 1. capture the roster snapshot
//! 2. build the plan from it
//! 3. execute the moves
//! 4. sweep the pre-cycle terminal roster (only if confirmed)
//! 5. report
//!
//! Snapshot or planning failure aborts the cycle before any write. Once
//! execution starts the cycle always completes and reports its failures;
//! successful moves are never rolled back.
//!
//! At most one cycle runs per orchestrator. A second trigger while one is in
//! flight is rejected immediately rather than queued.
//!
//! The plan of the last cycle is kept in memory so the same cycle can be
//! re-run to retry its failures. With a `PlanFile` attached it is also
//! written to disk, and a re-run in a fresh process starts from that file.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::observability::{
    AuditAction, AuditLog, AuditOutcome, AuditRecord, Logger, MemoryAuditLog, MetricsRegistry,
};
use crate::school::SchoolStore;

use super::errors::{CycleError, CycleResult};
use super::executor::{ExecutionReport, PromotionExecutor};
use super::observability::{CycleEvent, CycleObserver};
use super::ordinal::ClassOrdinal;
use super::plan::PromotionPlan;
use super::registry::ClassRegistry;
use super::report::{ClassMoveSummary, CyclePreview, CycleReport, GraduationStatus, GraduationSummary};
use super::request::PromotionCycleRequest;
use super::retained::{PlanFile, RetainedPlan};
use super::snapshot::RosterSnapshot;
use super::state::CycleState;
use super::sweeper::GraduationSweeper;

/// Clears the in-flight flag when the cycle ends, however it ends.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct PromotionCycleOrchestrator {
    store: Arc<dyn SchoolStore>,
    ordinal: ClassOrdinal,
    in_flight: AtomicBool,
    last_cycle: Mutex<Option<RetainedPlan>>,
    plan_file: Option<PlanFile>,
    observer: CycleObserver,
    metrics: Arc<MetricsRegistry>,
    audit: Arc<dyn AuditLog>,
}

impl PromotionCycleOrchestrator {
    /// Orchestrator with the default terminal pool name, fresh metrics and
    /// an in-memory audit log.
    pub fn new(store: Arc<dyn SchoolStore>) -> Self {
        Self {
            store,
            ordinal: ClassOrdinal::default(),
            in_flight: AtomicBool::new(false),
            last_cycle: Mutex::new(None),
            plan_file: None,
            observer: CycleObserver::new(),
            metrics: Arc::new(MetricsRegistry::new()),
            audit: Arc::new(MemoryAuditLog::new()),
        }
    }

    pub fn with_ordinal(mut self, ordinal: ClassOrdinal) -> Self {
        self.ordinal = ordinal;
        self
    }

    pub fn with_audit_log(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    /// Persist the last plan to `plan_file` and fall back to it on re-run.
    pub fn with_plan_file(mut self, plan_file: PlanFile) -> Self {
        self.plan_file = Some(plan_file);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn ordinal(&self) -> &ClassOrdinal {
        &self.ordinal
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn is_cycle_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Events of the most recent cycle, plus any rejections since.
    pub fn last_cycle_events(&self) -> Vec<CycleEvent> {
        self.observer.events()
    }

    /// Run a cycle. Graduation only happens with `confirm_graduation`.
    pub fn trigger(&self, max_ordinal: u32, confirm_graduation: bool) -> CycleResult<CycleReport> {
        self.run(&PromotionCycleRequest::new(max_ordinal).with_confirmation(confirm_graduation))
    }

    /// Snapshot and plan without writing anything.
    ///
    /// Does not take the single-flight guard; a preview taken while a cycle
    /// runs reflects whatever the store holds at that moment.
    pub fn preview(&self, max_ordinal: u32) -> CycleResult<CyclePreview> {
        if let Some(reason) = PromotionCycleRequest::new(max_ordinal).validate_format() {
            return Err(CycleError::InvalidRequest(reason.to_string()));
        }
        let snapshot = RosterSnapshot::capture(&ClassRegistry::new(self.store.as_ref()))
            .map_err(CycleError::SnapshotFailure)?;
        let plan = PromotionPlan::build(&snapshot, max_ordinal, &self.ordinal)?;
        Ok(CyclePreview::new(&snapshot, &plan))
    }

    pub fn run(&self, request: &PromotionCycleRequest) -> CycleResult<CycleReport> {
        if let Some(reason) = request.validate_format() {
            return Err(self.reject(request, CycleError::InvalidRequest(reason.to_string())));
        }

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            return Err(self.reject(request, CycleError::ConcurrentCycleRejected));
        };

        let cycle_id = Uuid::new_v4();
        let started_at = Utc::now();
        self.begin(cycle_id, request, None);

        // Snapshotting
        let state = CycleState::new().begin_snapshot(cycle_id)?;
        let snapshot = match RosterSnapshot::capture(&ClassRegistry::new(self.store.as_ref())) {
            Ok(snapshot) => snapshot,
            Err(e) => return Err(self.abort(state, request, CycleError::SnapshotFailure(e))),
        };
        self.observer.emit(CycleEvent::SnapshotCaptured {
            cycle_id,
            classes: snapshot.class_count(),
            students: snapshot.student_count(),
        });

        // Planning
        let state = state.begin_planning()?;
        let plan = match PromotionPlan::build(&snapshot, request.max_ordinal, &self.ordinal) {
            Ok(plan) => plan,
            Err(e) => return Err(self.abort(state, request, e.into())),
        };
        self.emit_plan(cycle_id, &plan);
        self.retain(RetainedPlan {
            cycle_id,
            plan: plan.clone(),
        });

        self.apply(state, cycle_id, started_at, request, &plan, None)
    }

    /// Re-run the most recent cycle against its original snapshot.
    ///
    /// Students the first run already moved are skipped and students already
    /// deleted stay deleted, so an immediate re-run changes nothing. After a
    /// partial failure it retries exactly the failed moves and deletions. It
    /// is also how a pending graduation is confirmed without promoting anyone
    /// a second time.
    pub fn rerun_last(
        &self,
        confirm_graduation: bool,
        operator: Option<String>,
    ) -> CycleResult<CycleReport> {
        let retained = self.last_cycle.lock().ok().and_then(|last| last.clone());
        let retained = match retained {
            Some(retained) => Ok(Some(retained)),
            None => self.load_retained(),
        };

        let mut request = PromotionCycleRequest::new(
            retained
                .as_ref()
                .ok()
                .and_then(Option::as_ref)
                .map_or(0, |r| r.plan.max_ordinal()),
        )
        .with_confirmation(confirm_graduation);
        if let Some(operator) = operator {
            request = request.with_operator(operator);
        }

        let retained = match retained {
            Ok(retained) => retained,
            Err(e) => return Err(self.reject(&request, e)),
        };
        let Some(retained) = retained else {
            return Err(self.reject(
                &request,
                CycleError::InvalidRequest("no previous cycle to re-run".to_string()),
            ));
        };

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            return Err(self.reject(&request, CycleError::ConcurrentCycleRejected));
        };

        let cycle_id = Uuid::new_v4();
        let started_at = Utc::now();
        self.begin(cycle_id, &request, Some(retained.cycle_id));

        // The retained plan stands in for a fresh snapshot and plan.
        let state = CycleState::new().begin_snapshot(cycle_id)?.begin_planning()?;
        self.emit_plan(cycle_id, &retained.plan);

        self.apply(
            state,
            cycle_id,
            started_at,
            &request,
            &retained.plan,
            Some(retained.cycle_id),
        )
    }

    fn retain(&self, retained: RetainedPlan) {
        if let Some(file) = &self.plan_file {
            if let Err(e) = file.save(&retained) {
                Logger::warn(
                    "PLAN_PERSIST_FAILED",
                    &[
                        ("path", file.path().display().to_string().as_str()),
                        ("error", e.to_string().as_str()),
                    ],
                );
            }
        }
        if let Ok(mut last) = self.last_cycle.lock() {
            *last = Some(retained);
        }
    }

    /// Plan from the attached file, cached in memory once read.
    fn load_retained(&self) -> CycleResult<Option<RetainedPlan>> {
        let Some(file) = &self.plan_file else {
            return Ok(None);
        };
        let loaded = file.load().map_err(|e| {
            CycleError::InvalidRequest(format!(
                "retained plan {} unreadable: {}",
                file.path().display(),
                e
            ))
        })?;
        if let (Some(retained), Ok(mut last)) = (&loaded, self.last_cycle.lock()) {
            *last = Some(retained.clone());
        }
        Ok(loaded)
    }

    fn begin(&self, cycle_id: Uuid, request: &PromotionCycleRequest, rerun_of: Option<Uuid>) {
        self.observer.clear();
        self.observer.emit(CycleEvent::Started {
            cycle_id,
            max_ordinal: request.max_ordinal,
            confirm_graduation: request.confirm_graduation,
            rerun_of,
        });

        let mut detail = format!(
            "max_ordinal={} confirm_graduation={}",
            request.max_ordinal, request.confirm_graduation
        );
        if let Some(original) = rerun_of {
            detail.push_str(&format!(" rerun_of={}", original));
        }
        self.audit_record(
            self.base_record(AuditAction::CycleStarted, AuditOutcome::Success, cycle_id, request)
                .with_detail(detail),
        );
    }

    /// Planning → Executing → Sweeping → Reporting → Idle
    fn apply(
        &self,
        state: CycleState,
        cycle_id: Uuid,
        started_at: DateTime<Utc>,
        request: &PromotionCycleRequest,
        plan: &PromotionPlan,
        rerun_of: Option<Uuid>,
    ) -> CycleResult<CycleReport> {
        let store = self.store.as_ref();

        // Executing
        let state = state.begin_execution()?;
        let execution = PromotionExecutor::new(store).execute(plan.moves());
        self.emit_execution(cycle_id, &execution);

        // Sweeping
        let state = state.begin_sweep()?;
        let (graduation, graduation_failures) = match plan.sweep() {
            None => (GraduationSummary::nothing_to_graduate(), Vec::new()),
            Some(entry) if !request.confirm_graduation => {
                self.observer.emit(CycleEvent::GraduationDeferred {
                    cycle_id,
                    candidates: entry.student_ids.len(),
                });
                self.audit_record(
                    self.base_record(
                        AuditAction::GraduationPending,
                        AuditOutcome::Pending,
                        cycle_id,
                        request,
                    )
                    .with_class(entry.terminal_class_id.0)
                    .with_detail(format!("candidates={}", entry.student_ids.len())),
                );
                (
                    GraduationSummary::pending(entry.terminal_class_id, entry.student_ids.len()),
                    Vec::new(),
                )
            }
            Some(entry) => {
                let sweep = GraduationSweeper::new(store, self.audit.as_ref(), cycle_id).sweep(entry);
                self.observer.emit(CycleEvent::GraduationCompleted {
                    cycle_id,
                    graduated: sweep.graduated_count(),
                    failed: sweep.failures.len(),
                });
                let summary = GraduationSummary {
                    status: GraduationStatus::Completed,
                    terminal_class_id: Some(entry.terminal_class_id),
                    candidates: entry.student_ids.len(),
                    graduated: sweep.graduated_count(),
                    already_removed: sweep.already_removed.len(),
                    failed: sweep.failures.len(),
                };
                (summary, sweep.failures)
            }
        };

        // Reporting
        let state = state.begin_reporting()?;
        let move_failures: Vec<_> = execution.failures().cloned().collect();
        let report = CycleReport {
            cycle_id,
            rerun_of,
            started_at,
            finished_at: Utc::now(),
            max_ordinal: plan.max_ordinal(),
            per_class: execution.entries.iter().map(ClassMoveSummary::from).collect(),
            classes_created: execution.classes_created.clone(),
            students_graduated: graduation.graduated,
            graduation,
            skipped: plan.skipped().to_vec(),
            failures: move_failures
                .iter()
                .cloned()
                .chain(graduation_failures.iter().cloned())
                .collect(),
        };

        self.metrics.increment_cycles_completed();
        self.metrics.add_students_moved(report.total_moved() as u64);
        self.metrics.add_classes_created(report.classes_created.len() as u64);
        self.metrics.add_students_graduated(report.students_graduated as u64);
        self.metrics.add_move_failures(move_failures.len() as u64);
        self.metrics.add_graduation_failures(graduation_failures.len() as u64);

        self.observer.emit(CycleEvent::Completed {
            cycle_id,
            moved: report.total_moved(),
            graduated: report.students_graduated,
            failures: report.failures.len(),
        });
        let outcome = if report.is_clean() {
            AuditOutcome::Success
        } else {
            AuditOutcome::Failed
        };
        self.audit_record(
            self.base_record(AuditAction::CycleCompleted, outcome, cycle_id, request)
                .with_detail(format!(
                    "moved={} classes_created={} graduated={} failures={}",
                    report.total_moved(),
                    report.classes_created.len(),
                    report.students_graduated,
                    report.failures.len()
                )),
        );

        state.finish()?;
        Ok(report)
    }

    fn emit_plan(&self, cycle_id: Uuid, plan: &PromotionPlan) {
        self.observer.emit(CycleEvent::PlanBuilt {
            cycle_id,
            moves: plan.moves().len(),
            students_to_move: plan.students_to_move(),
            graduation_candidates: plan.graduation_count(),
            skipped: plan.skipped().len(),
        });
    }

    fn emit_execution(&self, cycle_id: Uuid, execution: &ExecutionReport) {
        for created in &execution.classes_created {
            self.observer.emit(CycleEvent::ClassCreated {
                cycle_id,
                class_id: created.id,
                name: created.name.clone(),
            });
        }
        for entry in &execution.entries {
            self.observer.emit(CycleEvent::EntryExecuted {
                cycle_id,
                source_class: entry.source_class_name.clone(),
                destination_class: entry.destination_class_name.clone(),
                moved: entry.moved.len(),
                failed: entry.failures.len(),
            });
        }
    }

    /// Return to Idle from a stage that has not written anything.
    fn abort(&self, state: CycleState, request: &PromotionCycleRequest, error: CycleError) -> CycleError {
        let stage = state.state_name();
        let cycle_id = state.cycle_id().unwrap_or_default();
        if let Err(e) = state.abort() {
            return e;
        }

        self.metrics.increment_cycles_aborted();
        self.observer.emit(CycleEvent::Aborted {
            cycle_id,
            stage,
            reason: error.to_string(),
        });
        self.audit_record(
            self.base_record(AuditAction::CycleAborted, AuditOutcome::Failed, cycle_id, request)
                .with_detail(format!("stage={}", stage))
                .with_error(error.to_string()),
        );
        error
    }

    fn reject(&self, request: &PromotionCycleRequest, error: CycleError) -> CycleError {
        self.metrics.increment_cycles_rejected();
        self.observer.emit(CycleEvent::Rejected {
            reason: error.to_string(),
        });
        let mut record = AuditRecord::new(AuditAction::CycleRejected, AuditOutcome::Rejected)
            .with_detail(format!("max_ordinal={}", request.max_ordinal))
            .with_error(error.to_string());
        if let Some(operator) = &request.operator {
            record = record.with_operator(operator.clone());
        }
        self.audit_record(record);
        error
    }

    fn base_record(
        &self,
        action: AuditAction,
        outcome: AuditOutcome,
        cycle_id: Uuid,
        request: &PromotionCycleRequest,
    ) -> AuditRecord {
        let record = AuditRecord::new(action, outcome).with_cycle(cycle_id);
        match &request.operator {
            Some(operator) => record.with_operator(operator.clone()),
            None => record,
        }
    }

    fn audit_record(&self, record: AuditRecord) {
        if let Err(e) = self.audit.append(&record) {
            Logger::error(
                "AUDIT_APPEND_FAILED",
                &[
                    ("action", record.action.as_str()),
                    ("error", e.to_string().as_str()),
                ],
            );
        }
    }
}
