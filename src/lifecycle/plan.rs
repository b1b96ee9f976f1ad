//! Promotion Plan
//!
//! Pure mapping from a roster snapshot to the moves a cycle intends to make.
//! Building a plan creates nothing and writes nothing, so it can be inspected
//! (and previewed to an administrator) independently of execution.
//!
//! For every class with a non-empty captured roster:
//! - ordinal below the maximum: move to the successor class
//! - ordinal equal to the maximum: move to the terminal pool
//! - the terminal pool itself: graduation candidates (sweep entry)
//! - anything else is skipped and reported

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::school::{ClassId, StudentId};

use super::errors::PlanError;
use super::ordinal::ClassOrdinal;
use super::snapshot::RosterSnapshot;

/// Students of one source class and where they go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveEntry {
    pub source_class_id: ClassId,
    pub source_class_name: String,
    pub source_ordinal: u32,
    pub destination_class_name: String,
    pub student_ids: Vec<StudentId>,
}

/// Pre-cycle roster of the terminal pool. Consumed by the sweeper only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub terminal_class_id: ClassId,
    pub terminal_class_name: String,
    pub student_ids: Vec<StudentId>,
}

/// Why a class with students is neither moved nor swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Ordinal is beyond the configured last grade
    AboveMaxOrdinal { ordinal: u32 },
    /// Name has no ordinal and is not the terminal pool
    Unsequenced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedClass {
    pub class_id: ClassId,
    pub class_name: String,
    pub student_count: usize,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Intended moves and sweep of one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionPlan {
    max_ordinal: u32,
    terminal_class_name: String,
    moves: Vec<MoveEntry>,
    sweep: Option<SweepEntry>,
    skipped: Vec<SkippedClass>,
}

impl PromotionPlan {
    /// Compute the plan for `snapshot`.
    ///
    /// Fails if two classes share an ordinal or the terminal pool name is
    /// used more than once; both would make destinations ambiguous.
    pub fn build(
        snapshot: &RosterSnapshot,
        max_ordinal: u32,
        ordinal: &ClassOrdinal,
    ) -> Result<Self, PlanError> {
        Self::check_unique(snapshot, ordinal)?;

        let mut moves = Vec::new();
        let mut sweep = None;
        let mut skipped = Vec::new();

        for class in snapshot.classes().iter().filter(|c| !c.is_empty()) {
            if ordinal.is_terminal(&class.name) {
                sweep = Some(SweepEntry {
                    terminal_class_id: class.id,
                    terminal_class_name: class.name.clone(),
                    student_ids: class.student_ids.clone(),
                });
                continue;
            }

            let Some(k) = class.ordinal else {
                skipped.push(SkippedClass {
                    class_id: class.id,
                    class_name: class.name.clone(),
                    student_count: class.student_ids.len(),
                    reason: SkipReason::Unsequenced,
                });
                continue;
            };

            match ordinal.successor_name(&class.name, max_ordinal) {
                Some(destination) => moves.push(MoveEntry {
                    source_class_id: class.id,
                    source_class_name: class.name.clone(),
                    source_ordinal: k,
                    destination_class_name: destination,
                    student_ids: class.student_ids.clone(),
                }),
                None => skipped.push(SkippedClass {
                    class_id: class.id,
                    class_name: class.name.clone(),
                    student_count: class.student_ids.len(),
                    reason: SkipReason::AboveMaxOrdinal { ordinal: k },
                }),
            }
        }

        moves.sort_by(|a, b| b.source_ordinal.cmp(&a.source_ordinal));

        Ok(Self {
            max_ordinal,
            terminal_class_name: ordinal.terminal_class_name().to_string(),
            moves,
            sweep,
            skipped,
        })
    }

    fn check_unique(snapshot: &RosterSnapshot, ordinal: &ClassOrdinal) -> Result<(), PlanError> {
        let mut by_ordinal: BTreeMap<u32, &str> = BTreeMap::new();
        let mut terminal_seen = false;

        for class in snapshot.classes() {
            if ordinal.is_terminal(&class.name) {
                if terminal_seen {
                    return Err(PlanError::DuplicateTerminalClass(class.name.clone()));
                }
                terminal_seen = true;
                continue;
            }
            if let Some(k) = class.ordinal {
                if let Some(first) = by_ordinal.insert(k, &class.name) {
                    return Err(PlanError::DuplicateOrdinal {
                        ordinal: k,
                        first: first.to_string(),
                        second: class.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn max_ordinal(&self) -> u32 {
        self.max_ordinal
    }

    pub fn terminal_class_name(&self) -> &str {
        &self.terminal_class_name
    }

    /// Move entries, highest source ordinal first.
    pub fn moves(&self) -> &[MoveEntry] {
        &self.moves
    }

    pub fn sweep(&self) -> Option<&SweepEntry> {
        self.sweep.as_ref()
    }

    pub fn skipped(&self) -> &[SkippedClass] {
        &self.skipped
    }

    pub fn students_to_move(&self) -> usize {
        self.moves.iter().map(|m| m.student_ids.len()).sum()
    }

    /// Students that would be graduated (deleted) if confirmed.
    pub fn graduation_count(&self) -> usize {
        self.sweep.as_ref().map_or(0, |s| s.student_ids.len())
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty() && self.sweep.is_none()
    }

    /// Destination names that do not exist in `snapshot` and would be created.
    pub fn classes_to_create(&self, snapshot: &RosterSnapshot) -> Vec<String> {
        self.moves
            .iter()
            .map(|m| m.destination_class_name.as_str())
            .filter(|name| snapshot.class_by_name(name).is_none())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}
