//! Promotion Cycle State Machine
//!
//! `Idle → Snapshotting → Planning → Executing → Sweeping → Reporting → Idle`
//!
//! - States are explicit and enumerable
//! - Transitions consume the current state and return the next one
//! - Anything not listed below is a forbidden transition
//! - Only `Snapshotting` and `Planning` may abort back to `Idle`; nothing
//!   has been written at that point. Once `Executing` is entered the cycle
//!   runs to `Reporting`.
//!
//! Nothing is persisted between cycles.

use uuid::Uuid;

use super::errors::{CycleError, CycleResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CycleState {
    /// No cycle in progress
    #[default]
    Idle,

    /// Capturing rosters; no writes yet
    Snapshotting { cycle_id: Uuid },

    /// Computing moves from the snapshot; no writes yet
    Planning { cycle_id: Uuid },

    /// Resolving destinations and moving students
    Executing { cycle_id: Uuid },

    /// Deleting the pre-cycle terminal roster (or recording it as pending)
    Sweeping { cycle_id: Uuid },

    /// Assembling the cycle report
    Reporting { cycle_id: Uuid },
}

impl CycleState {
    pub fn new() -> Self {
        Self::Idle
    }

    pub fn state_name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Snapshotting { .. } => "Snapshotting",
            Self::Planning { .. } => "Planning",
            Self::Executing { .. } => "Executing",
            Self::Sweeping { .. } => "Sweeping",
            Self::Reporting { .. } => "Reporting",
        }
    }

    pub fn is_running(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Whether the cycle may have written to the store.
    pub fn has_written(&self) -> bool {
        matches!(
            self,
            Self::Executing { .. } | Self::Sweeping { .. } | Self::Reporting { .. }
        )
    }

    pub fn cycle_id(&self) -> Option<Uuid> {
        match self {
            Self::Idle => None,
            Self::Snapshotting { cycle_id }
            | Self::Planning { cycle_id }
            | Self::Executing { cycle_id }
            | Self::Sweeping { cycle_id }
            | Self::Reporting { cycle_id } => Some(*cycle_id),
        }
    }

    /// Idle → Snapshotting
    pub fn begin_snapshot(self, cycle_id: Uuid) -> CycleResult<Self> {
        match self {
            Self::Idle => Ok(Self::Snapshotting { cycle_id }),
            other => Err(CycleError::forbidden_transition(
                other.state_name(),
                "Snapshotting",
            )),
        }
    }

    /// Snapshotting → Planning
    pub fn begin_planning(self) -> CycleResult<Self> {
        match self {
            Self::Snapshotting { cycle_id } => Ok(Self::Planning { cycle_id }),
            other => Err(CycleError::forbidden_transition(other.state_name(), "Planning")),
        }
    }

    /// Planning → Executing
    pub fn begin_execution(self) -> CycleResult<Self> {
        match self {
            Self::Planning { cycle_id } => Ok(Self::Executing { cycle_id }),
            other => Err(CycleError::forbidden_transition(other.state_name(), "Executing")),
        }
    }

    /// Executing → Sweeping
    pub fn begin_sweep(self) -> CycleResult<Self> {
        match self {
            Self::Executing { cycle_id } => Ok(Self::Sweeping { cycle_id }),
            other => Err(CycleError::forbidden_transition(other.state_name(), "Sweeping")),
        }
    }

    /// Sweeping → Reporting
    pub fn begin_reporting(self) -> CycleResult<Self> {
        match self {
            Self::Sweeping { cycle_id } => Ok(Self::Reporting { cycle_id }),
            other => Err(CycleError::forbidden_transition(other.state_name(), "Reporting")),
        }
    }

    /// Reporting → Idle
    pub fn finish(self) -> CycleResult<Self> {
        match self {
            Self::Reporting { .. } => Ok(Self::Idle),
            other => Err(CycleError::forbidden_transition(other.state_name(), "Idle")),
        }
    }

    /// Snapshotting | Planning → Idle, with no writes performed.
    pub fn abort(self) -> CycleResult<Self> {
        if !self.is_running() || self.has_written() {
            return Err(CycleError::forbidden_transition(self.state_name(), "Idle"));
        }
        Ok(Self::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_lifecycle() {
        let id = Uuid::new_v4();
        let state = CycleState::new();
        assert!(!state.is_running());

        let state = state.begin_snapshot(id).unwrap();
        assert_eq!(state.state_name(), "Snapshotting");
        assert_eq!(state.cycle_id(), Some(id));
        assert!(!state.has_written());

        let state = state.begin_planning().unwrap();
        let state = state.begin_execution().unwrap();
        assert!(state.has_written());
        let state = state.begin_sweep().unwrap();
        let state = state.begin_reporting().unwrap();
        assert_eq!(state.state_name(), "Reporting");

        let state = state.finish().unwrap();
        assert_eq!(state, CycleState::Idle);
    }

    #[test]
    fn test_abort_before_writes() {
        let id = Uuid::new_v4();
        let snapshotting = CycleState::new().begin_snapshot(id).unwrap();
        assert_eq!(snapshotting.abort().unwrap(), CycleState::Idle);

        let planning = CycleState::new()
            .begin_snapshot(id)
            .unwrap()
            .begin_planning()
            .unwrap();
        assert_eq!(planning.abort().unwrap(), CycleState::Idle);
    }

    #[test]
    fn test_abort_after_writes_forbidden() {
        let executing = CycleState::Executing {
            cycle_id: Uuid::new_v4(),
        };
        assert_eq!(
            executing.abort(),
            Err(CycleError::ForbiddenTransition {
                from: "Executing",
                to: "Idle"
            })
        );
        let sweeping = CycleState::Sweeping {
            cycle_id: Uuid::new_v4(),
        };
        assert!(sweeping.abort().is_err());
        assert!(CycleState::Idle.abort().is_err());
    }

    #[test]
    fn test_skipping_stages_forbidden() {
        let id = Uuid::new_v4();
        assert!(CycleState::new().begin_planning().is_err());
        assert!(CycleState::new().begin_execution().is_err());
        assert!(CycleState::Snapshotting { cycle_id: id }.begin_sweep().is_err());
        assert!(CycleState::Planning { cycle_id: id }.begin_reporting().is_err());
        assert!(CycleState::Executing { cycle_id: id }.finish().is_err());
    }

    #[test]
    fn test_cannot_start_while_running() {
        let id = Uuid::new_v4();
        let running = CycleState::Sweeping { cycle_id: id };
        let result = running.begin_snapshot(Uuid::new_v4());
        assert!(matches!(
            result,
            Err(CycleError::ForbiddenTransition { from: "Sweeping", .. })
        ));
    }
}
