//! Promotion cycle errors
//!
//! Two tiers:
//! - `CycleError` stops a cycle before any write happens (snapshot failure,
//!   planning failure, a concurrent cycle, a malformed request).
//! - `FailureRecord` is a per-class or per-student failure recorded in the
//!   cycle report. These never stop the cycle.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::school::{ClassId, StoreError, StudentId};

/// Result type for cycle operations
pub type CycleResult<T> = Result<T, CycleError>;

/// Planning rejected the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// Two classes parse to the same ordinal
    #[error("classes '{first}' and '{second}' share ordinal {ordinal}")]
    DuplicateOrdinal {
        ordinal: u32,
        first: String,
        second: String,
    },

    /// More than one class carries the terminal pool name
    #[error("more than one class is named '{0}'")]
    DuplicateTerminalClass(String),
}

/// Errors that prevent a cycle from running. None of them leave writes behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    /// Classes or rosters could not be enumerated
    #[error("snapshot failed: {0}")]
    SnapshotFailure(#[source] StoreError),

    #[error("planning failed: {0}")]
    PlanningFailure(#[from] PlanError),

    /// Another cycle is in flight
    #[error("a promotion cycle is already in progress")]
    ConcurrentCycleRejected,

    #[error("invalid promotion request: {0}")]
    InvalidRequest(String),

    #[error("forbidden cycle transition: {from} -> {to}")]
    ForbiddenTransition {
        from: &'static str,
        to: &'static str,
    },
}

impl CycleError {
    /// Stable error code for logs and API responses.
    pub fn code(&self) -> &'static str {
        match self {
            CycleError::SnapshotFailure(_) => "SNAPSHOT_FAILURE",
            CycleError::PlanningFailure(_) => "PLANNING_FAILURE",
            CycleError::ConcurrentCycleRejected => "CONCURRENT_CYCLE_REJECTED",
            CycleError::InvalidRequest(_) => "INVALID_REQUEST",
            CycleError::ForbiddenTransition { .. } => "FORBIDDEN_TRANSITION",
        }
    }

    /// Whether re-triggering the cycle later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CycleError::SnapshotFailure(_) | CycleError::ConcurrentCycleRejected
        )
    }

    pub(crate) fn forbidden_transition(from: &'static str, to: &'static str) -> Self {
        CycleError::ForbiddenTransition { from, to }
    }
}

/// Kind of a recorded, non-fatal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// Destination class could not be found or created; cohort left unmoved
    ClassResolutionFailure,
    /// One student could not be moved
    StudentMoveFailure,
    /// One student could not be deleted
    GraduationFailure,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ClassResolutionFailure => "CLASS_RESOLUTION_FAILURE",
            FailureKind::StudentMoveFailure => "STUDENT_MOVE_FAILURE",
            FailureKind::GraduationFailure => "GRADUATION_FAILURE",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A failure recorded in a cycle report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub kind: FailureKind,
    /// Class the failure relates to (source class for moves, terminal pool
    /// for graduation).
    pub class_id: ClassId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<StudentId>,
    /// For class resolution failures, the destination that could not be resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_class_name: Option<String>,
    pub reason: String,
}

impl FailureRecord {
    pub fn class_resolution(
        source_class_id: ClassId,
        student_id: StudentId,
        destination_class_name: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            kind: FailureKind::ClassResolutionFailure,
            class_id: source_class_id,
            student_id: Some(student_id),
            destination_class_name: Some(destination_class_name.to_string()),
            reason: reason.into(),
        }
    }

    pub fn student_move(
        source_class_id: ClassId,
        student_id: StudentId,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            kind: FailureKind::StudentMoveFailure,
            class_id: source_class_id,
            student_id: Some(student_id),
            destination_class_name: None,
            reason: reason.into(),
        }
    }

    pub fn graduation(
        terminal_class_id: ClassId,
        student_id: StudentId,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            kind: FailureKind::GraduationFailure,
            class_id: terminal_class_id,
            student_id: Some(student_id),
            destination_class_name: None,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_error_codes() {
        assert_eq!(
            CycleError::ConcurrentCycleRejected.code(),
            "CONCURRENT_CYCLE_REJECTED"
        );
        assert_eq!(
            CycleError::SnapshotFailure(StoreError::Unavailable("db".into())).code(),
            "SNAPSHOT_FAILURE"
        );
    }

    #[test]
    fn test_plan_error_converts() {
        let err: CycleError = PlanError::DuplicateTerminalClass("Last Year Students".into()).into();
        assert_eq!(err.code(), "PLANNING_FAILURE");
        assert!(err.to_string().contains("Last Year Students"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_snapshot_failure_is_retryable() {
        let err = CycleError::SnapshotFailure(StoreError::Unavailable("timeout".into()));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_failure_record_serializes_kind() {
        let record = FailureRecord::student_move(ClassId::new(), StudentId::new(), "stale membership");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "STUDENT_MOVE_FAILURE");
        assert!(json.get("destination_class_name").is_none());
    }
}
