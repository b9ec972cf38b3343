//! Homing and return-to-home sequencing.
//!
//! ## Homing (G30)
//!
//! The canonical machine does not search for switches. It walks the
//! configured axis order, asks the executor to home one axis at a time and
//! advances when the executor reports the axis complete.
//!
//! 1. `start()` builds the sequence from the homing order, skipping disabled axes
//! 2. `on_axis_complete()` moves to the next axis, or finishes
//! 3. `on_axis_failed()` ends the cycle as failed
//!
//! ## Return to home (G28)
//!
//! Plain traverses to the stored reference position. [`ReturnHome`] only
//! remembers the machine state to restore once the moves have drained.

use canon_common::consts::AXES;
use canon_common::machine::state::MachineState;
use canon_common::prelude::Axis;
use heapless::Vec as HVec;

// ─── Homing Phases ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HomingPhase {
    #[default]
    Idle,
    /// Waiting for the executor to home `axis`.
    Searching { axis: Axis },
    Complete,
    Failed { axis: Axis },
}

/// What the caller does next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomingStep {
    /// Request homing of this axis.
    HomeAxis(Axis),
    /// All axes homed.
    Complete,
    Failed(Axis),
    /// Event did not match the running cycle.
    Ignored,
}

/// Multi-axis homing sequencer.
#[derive(Debug, Clone, Default)]
pub struct HomingCycle {
    phase: HomingPhase,
    sequence: HVec<Axis, AXES>,
    next: usize,
}

impl HomingCycle {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub const fn phase(&self) -> HomingPhase {
        self.phase
    }

    #[inline]
    pub const fn is_active(&self) -> bool {
        matches!(self.phase, HomingPhase::Searching { .. })
    }

    /// Axes of the running or last cycle, in order.
    pub fn sequence(&self) -> &[Axis] {
        &self.sequence
    }

    /// Start a cycle over `order`, keeping axes for which `enabled` holds.
    /// Repeated axes are homed once.
    pub fn start(&mut self, order: &[Axis], enabled: impl Fn(Axis) -> bool) -> HomingStep {
        self.sequence.clear();
        self.next = 0;
        for &axis in order {
            if enabled(axis) && !self.sequence.contains(&axis) {
                // Capacity is the number of distinct axes.
                let _ = self.sequence.push(axis);
            }
        }
        self.advance()
    }

    pub fn on_axis_complete(&mut self, axis: Axis) -> HomingStep {
        match self.phase {
            HomingPhase::Searching { axis: current } if current == axis => self.advance(),
            _ => HomingStep::Ignored,
        }
    }

    pub fn on_axis_failed(&mut self, axis: Axis) -> HomingStep {
        match self.phase {
            HomingPhase::Searching { axis: current } if current == axis => {
                self.phase = HomingPhase::Failed { axis };
                HomingStep::Failed(axis)
            }
            _ => HomingStep::Ignored,
        }
    }

    /// Drop a running cycle.
    pub fn cancel(&mut self) {
        self.phase = HomingPhase::Idle;
        self.next = 0;
    }

    fn advance(&mut self) -> HomingStep {
        match self.sequence.get(self.next).copied() {
            Some(axis) => {
                self.next += 1;
                self.phase = HomingPhase::Searching { axis };
                HomingStep::HomeAxis(axis)
            }
            None => {
                self.phase = HomingPhase::Complete;
                HomingStep::Complete
            }
        }
    }
}

// ─── Return to Home ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnHome {
    #[default]
    Idle,
    /// Moves queued; restore `resume` once they drain.
    Moving { resume: MachineState },
}

impl ReturnHome {
    #[inline]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Moving { .. })
    }

    /// Finish the cycle, returning the state to restore.
    pub fn finish(&mut self) -> Option<MachineState> {
        match std::mem::take(self) {
            Self::Moving { resume } => Some(resume),
            Self::Idle => None,
        }
    }
}
