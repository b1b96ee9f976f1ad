//! Lifecycle metrics
//!
//! - Counters only, monotonic, reset on process start
//! - Atomic increments with Relaxed ordering; exact values are not
//!   required to be observed in lockstep with each other

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for promotion cycles.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    cycles_completed: AtomicU64,
    cycles_rejected: AtomicU64,
    cycles_aborted: AtomicU64,
    students_moved: AtomicU64,
    students_graduated: AtomicU64,
    classes_created: AtomicU64,
    move_failures: AtomicU64,
    graduation_failures: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_cycles_completed(&self) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cycles_rejected(&self) {
        self.cycles_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cycles_aborted(&self) {
        self.cycles_aborted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_students_moved(&self, count: u64) {
        self.students_moved.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_students_graduated(&self, count: u64) {
        self.students_graduated.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_classes_created(&self, count: u64) {
        self.classes_created.fetch_add(count, Ordering::Relaxed);
    }

    /// Class resolution and student move failures.
    pub fn add_move_failures(&self, count: u64) {
        self.move_failures.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_graduation_failures(&self, count: u64) {
        self.graduation_failures.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
            cycles_rejected: self.cycles_rejected.load(Ordering::Relaxed),
            cycles_aborted: self.cycles_aborted.load(Ordering::Relaxed),
            students_moved: self.students_moved.load(Ordering::Relaxed),
            students_graduated: self.students_graduated.load(Ordering::Relaxed),
            classes_created: self.classes_created.load(Ordering::Relaxed),
            move_failures: self.move_failures.load(Ordering::Relaxed),
            graduation_failures: self.graduation_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub cycles_completed: u64,
    pub cycles_rejected: u64,
    pub cycles_aborted: u64,
    pub students_moved: u64,
    pub students_graduated: u64,
    pub classes_created: u64,
    pub move_failures: u64,
    pub graduation_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_is_zero() {
        assert_eq!(MetricsRegistry::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_counters_accumulate() {
        let metrics = MetricsRegistry::new();
        metrics.increment_cycles_completed();
        metrics.increment_cycles_completed();
        metrics.add_students_moved(40);
        metrics.add_students_moved(2);
        metrics.increment_cycles_rejected();

        let snap = metrics.snapshot();
        assert_eq!(snap.cycles_completed, 2);
        assert_eq!(snap.students_moved, 42);
        assert_eq!(snap.cycles_rejected, 1);
        assert_eq!(snap.students_graduated, 0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let metrics = MetricsRegistry::new();
        metrics.add_classes_created(1);
        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["classes_created"], 1);
    }
}
