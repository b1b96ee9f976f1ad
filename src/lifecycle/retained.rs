//! Retained plan file
//!
//! The plan of the last cycle that got past planning, written next to the
//! data file so a later process can re-run that cycle. The file is replaced
//! atomically on every save; a missing file means there is nothing to re-run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::school::write_atomically;

use super::plan::PromotionPlan;

/// A cycle id together with the plan it executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetainedPlan {
    pub cycle_id: Uuid,
    pub plan: PromotionPlan,
}

#[derive(Debug, Clone)]
pub struct PlanFile {
    path: PathBuf,
}

impl PlanFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no plan has been saved yet.
    pub fn load(&self) -> io::Result<Option<RetainedPlan>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn save(&self, retained: &RetainedPlan) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(retained)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        write_atomically(&self.path, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::ordinal::{ClassOrdinal, DEFAULT_TERMINAL_CLASS_NAME};
    use crate::lifecycle::snapshot::{RosterSnapshot, SnapshotClass};
    use crate::school::{ClassId, StudentId};
    use tempfile::tempdir;

    fn class(name: &str, students: usize) -> SnapshotClass {
        SnapshotClass::new(
            ClassId::new(),
            name,
            (0..students).map(|_| StudentId::new()).collect(),
        )
    }

    #[test]
    fn test_saved_plan_loads_back() {
        let dir = tempdir().unwrap();
        let file = PlanFile::new(dir.path().join("school.json.last-plan.json"));
        let snapshot = RosterSnapshot::from_classes(vec![
            class("Class 3", 2),
            class("Class 12", 1),
            class("Staff Room", 1),
            class(DEFAULT_TERMINAL_CLASS_NAME, 3),
        ]);
        let plan = PromotionPlan::build(&snapshot, 10, &ClassOrdinal::default()).unwrap();
        let retained = RetainedPlan {
            cycle_id: Uuid::new_v4(),
            plan,
        };

        file.save(&retained).unwrap();
        let loaded = file.load().unwrap().unwrap();

        assert_eq!(loaded, retained);
        assert_eq!(loaded.plan.skipped().len(), 2);
        assert_eq!(loaded.plan.graduation_count(), 3);
        assert!(!dir.path().join("school.json.last-plan.json.tmp").exists());
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let file = PlanFile::new(dir.path().join("absent.json"));
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_garbage_is_invalid_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plan.json");
        fs::write(&path, "{\"cycle_id\": 7}").unwrap();

        let err = PlanFile::new(&path).load().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
