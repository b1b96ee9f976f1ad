//! File Store Cycle Tests
//!
//! Cycles against the JSON data file with a file audit log:
//! - every move and deletion is on disk when the cycle returns
//! - classes created mid-cycle persist
//! - each graduated student has its own audit line
//! - a write that cannot reach the disk changes nothing, and a re-run
//!   applies it once the disk is writable again
//! - the data file can only be open once at a time

use std::fs;
use std::path::Path;
use std::sync::Arc;

use gradeflow::lifecycle::{PromotionCycleOrchestrator, PromotionCycleRequest};
use gradeflow::observability::FileAuditLog;
use gradeflow::school::{
    ClassRecord, JsonFileStore, SchoolStore, StoreError, StudentId, StudentRecord,
};
use serde_json::Value;
use tempfile::tempdir;

fn enroll(store: &JsonFileStore, class: &str, count: usize) -> Vec<StudentId> {
    let class_id = match store.records().class_by_name(class).unwrap() {
        Some(existing) => existing.id,
        None => store.insert_class(ClassRecord::new(class)).unwrap(),
    };
    (0..count)
        .map(|_| {
            store
                .insert_student(StudentRecord::new(Some(class_id)))
                .unwrap()
        })
        .collect()
}

fn audit_lines(path: &Path) -> Vec<Value> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

// =============================================================================
// Persistence
// =============================================================================

/// The reopened file reflects the whole cycle.
#[test]
fn test_cycle_is_persisted() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("school.json");

    let (first_graders, veterans) = {
        let store = JsonFileStore::create(&data).unwrap();
        let first_graders = enroll(&store, "Class 1", 3);
        enroll(&store, "Class 2", 2);
        let veterans = enroll(&store, "Last Year Students", 2);
        (first_graders, veterans)
    };

    let orchestrator = PromotionCycleOrchestrator::new(Arc::new(JsonFileStore::open(&data).unwrap()));
    let report = orchestrator.trigger(2, true).unwrap();
    assert_eq!(report.total_moved(), 5);
    assert_eq!(report.students_graduated, 2);
    drop(orchestrator);

    let reopened = JsonFileStore::open(&data).unwrap();
    let class_2 = reopened.records().class_by_name("Class 2").unwrap().unwrap();
    for id in first_graders {
        let student = reopened.records().student(id).unwrap().unwrap();
        assert_eq!(student.class_id, Some(class_2.id));
    }
    for id in veterans {
        assert!(reopened.records().student(id).unwrap().is_none());
    }
    assert_eq!(reopened.records().student_count().unwrap(), 5);
}

/// A destination class created by the cycle is in the file afterwards.
#[test]
fn test_created_class_is_persisted() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("school.json");
    let store = JsonFileStore::create(&data).unwrap();
    let movers = enroll(&store, "Class 6", 4);

    let orchestrator = PromotionCycleOrchestrator::new(Arc::new(store));
    let report = orchestrator.trigger(10, false).unwrap();
    assert_eq!(report.classes_created.len(), 1);
    assert_eq!(report.classes_created[0].name, "Class 7");
    drop(orchestrator);

    let reopened = JsonFileStore::open(&data).unwrap();
    let classes: Vec<_> = reopened
        .list_classes()
        .unwrap()
        .into_iter()
        .map(|c| (c.name, c.student_count))
        .collect();
    assert!(classes.contains(&("Class 6".to_string(), 0)));
    assert!(classes.contains(&("Class 7".to_string(), 4)));
    let class_7 = reopened.records().class_by_name("Class 7").unwrap().unwrap();
    for id in movers {
        assert_eq!(
            reopened.records().student(id).unwrap().unwrap().class_id,
            Some(class_7.id)
        );
    }
}

/// Failed writes leave memory and disk as they were; the re-run finishes.
#[test]
fn test_unwritable_disk_then_rerun() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("school.json");
    let store = Arc::new(JsonFileStore::create(&data).unwrap());
    let movers = enroll(&store, "Class 1", 3);
    let veterans = enroll(&store, "Last Year Students", 2);
    let class_1 = store.records().class_by_name("Class 1").unwrap().unwrap();

    // a directory where the temp file goes makes every rewrite fail
    let blocker = dir.path().join("school.json.tmp");
    fs::create_dir(&blocker).unwrap();

    let orchestrator = PromotionCycleOrchestrator::new(store.clone());
    let report = orchestrator.trigger(10, true).unwrap();
    assert_eq!(report.total_moved(), 0);
    assert_eq!(report.students_graduated, 0);
    assert!(!report.is_clean());
    for id in &movers {
        assert_eq!(
            store.records().student(*id).unwrap().unwrap().class_id,
            Some(class_1.id)
        );
    }
    for id in &veterans {
        assert!(store.records().student(*id).unwrap().is_some());
    }
    assert!(store.records().class_by_name("Class 2").unwrap().is_none());

    fs::remove_dir(&blocker).unwrap();
    let rerun = orchestrator.rerun_last(true, None).unwrap();
    assert!(rerun.is_clean());
    assert_eq!(rerun.total_moved(), 3);
    assert_eq!(rerun.students_graduated, 2);
    drop(orchestrator);
    drop(store);

    let reopened = JsonFileStore::open(&data).unwrap();
    let class_2 = reopened.records().class_by_name("Class 2").unwrap().unwrap();
    for id in movers {
        assert_eq!(
            reopened.records().student(id).unwrap().unwrap().class_id,
            Some(class_2.id)
        );
    }
    assert_eq!(reopened.records().student_count().unwrap(), 3);
}

/// A second handle on the same data file is refused until the first closes.
#[test]
fn test_data_file_is_exclusive() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("school.json");
    let store = Arc::new(JsonFileStore::create(&data).unwrap());
    enroll(&store, "Class 1", 1);
    let orchestrator = PromotionCycleOrchestrator::new(store.clone());

    assert!(matches!(
        JsonFileStore::open(&data),
        Err(StoreError::Locked(_))
    ));

    drop(orchestrator);
    drop(store);
    let second = JsonFileStore::open(&data).unwrap();
    assert_eq!(second.records().student_count().unwrap(), 1);
}

// =============================================================================
// Audit Trail
// =============================================================================

/// One line per graduated student, bracketed by the cycle records.
#[test]
fn test_audit_file_records_graduation() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("school.json");
    let audit_path = dir.path().join("audit.log");
    let store = JsonFileStore::create(&data).unwrap();
    let veterans = enroll(&store, "Last Year Students", 3);

    let orchestrator = PromotionCycleOrchestrator::new(Arc::new(store))
        .with_audit_log(Arc::new(FileAuditLog::open(&audit_path).unwrap()));
    let report = orchestrator
        .run(
            &PromotionCycleRequest::new(10)
                .with_confirmation(true)
                .with_operator("registrar"),
        )
        .unwrap();

    let lines = audit_lines(&audit_path);
    assert_eq!(lines.first().unwrap()["action"], "CYCLE_STARTED");
    assert_eq!(lines.last().unwrap()["action"], "CYCLE_COMPLETED");
    assert_eq!(lines.last().unwrap()["operator"], "registrar");

    let graduated: Vec<_> = lines
        .iter()
        .filter(|l| l["action"] == "STUDENT_GRADUATED")
        .collect();
    assert_eq!(graduated.len(), 3);
    for line in &graduated {
        assert_eq!(line["outcome"], "SUCCESS");
        assert_eq!(line["cycle_id"], report.cycle_id.to_string());
    }
    for id in veterans {
        assert!(graduated
            .iter()
            .any(|l| l["student_id"] == id.to_string()));
    }
}

/// Appends across orchestrators; the first cycle's lines are kept.
#[test]
fn test_audit_file_is_append_only() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("school.json");
    let audit_path = dir.path().join("audit.log");
    let store = Arc::new(JsonFileStore::create(&data).unwrap());
    enroll(&store, "Class 1", 1);

    for _ in 0..2 {
        let orchestrator = PromotionCycleOrchestrator::new(store.clone())
            .with_audit_log(Arc::new(FileAuditLog::open(&audit_path).unwrap()));
        orchestrator.trigger(10, false).unwrap();
    }

    let started = audit_lines(&audit_path)
        .into_iter()
        .filter(|l| l["action"] == "CYCLE_STARTED")
        .count();
    assert_eq!(started, 2);
}
