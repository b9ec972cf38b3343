//! Feedhold sub-state transitions.
//!
//! Off → Sync → Plan → Decel → Hold, advanced by executor events rather
//! than polled. Abort returns to Off from any sub-state.

use canon_common::machine::state::FeedholdState;

/// Events that drive the feedhold sub-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedholdEvent {
    /// Feedhold key. With nothing queued the machine is already at rest.
    Request { motion_queued: bool },
    /// Streaming segment reached a decision point.
    SegmentBoundary,
    /// Planner replanned the queue for the stop.
    HoldPlanned,
    /// Executor at rest.
    MotionStopped,
    /// Cycle start while held.
    Release,
    Abort,
}

/// Result of a feedhold transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedholdTransition {
    Ok(FeedholdState),
    /// Event does not apply to the current sub-state.
    Ignored,
    Rejected(&'static str),
}

#[derive(Debug, Clone, Default)]
pub struct FeedholdStateMachine {
    state: FeedholdState,
}

impl FeedholdStateMachine {
    pub const fn new() -> Self {
        Self {
            state: FeedholdState::Off,
        }
    }

    #[inline]
    pub const fn state(&self) -> FeedholdState {
        self.state
    }

    /// Held and resumable.
    #[inline]
    pub const fn is_held(&self) -> bool {
        matches!(self.state, FeedholdState::Hold)
    }

    pub fn handle_event(&mut self, event: FeedholdEvent) -> FeedholdTransition {
        use FeedholdEvent::*;
        use FeedholdState::*;

        let next = match (self.state, event) {
            (_, Abort) => Off,

            (Off, Request { motion_queued: true }) => Sync,
            (Off, Request { motion_queued: false }) => Hold,
            (_, Request { .. }) => return FeedholdTransition::Ignored,

            (Sync, SegmentBoundary) => Plan,
            (Plan, HoldPlanned) => Decel,
            // Motion can end before the planner gets to replan.
            (Sync | Plan | Decel, MotionStopped) => Hold,

            (Hold, Release) => Off,
            (_, Release) => return FeedholdTransition::Rejected("Release: not held"),

            _ => return FeedholdTransition::Ignored,
        };

        self.state = next;
        FeedholdTransition::Ok(next)
    }
}
