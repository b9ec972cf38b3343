//! Top-level machine state transitions.
//!
//! Reset → Run ↔ Stop, Run → Hold → EndHold → Run/Stop, Homing, and Abort
//! from anywhere back to Reset.

use canon_common::machine::state::MachineState;

/// Result of a MachineState transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition succeeded, new state.
    Ok(MachineState),
    /// Event is a no-op in this state.
    Ignored,
    /// Transition rejected, reason.
    Rejected(&'static str),
}

/// Events that drive the machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineEvent {
    /// Cycle start key or first queued block.
    CycleStart,
    /// M0/M1 reached.
    ProgramStop,
    /// M2/M30 reached.
    ProgramEnd,
    /// Feedhold key.
    Feedhold,
    /// Unconditional stop.
    Abort,
    /// Executor drained the queue.
    QueueEmpty,
    /// Feedhold released; whether blocks remain queued.
    HoldReleased { blocks_queued: bool },
    /// Homing or return-to-home cycle started.
    HomingStart,
    /// Cycle finished; state to return to.
    HomingComplete { resume: MachineState },
}

/// MachineState manager holding the current state.
#[derive(Debug, Clone)]
pub struct MachineStateMachine {
    state: MachineState,
}

impl Default for MachineStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl MachineStateMachine {
    /// Create a new machine state machine in Reset.
    pub const fn new() -> Self {
        Self {
            state: MachineState::Reset,
        }
    }

    #[inline]
    pub const fn state(&self) -> MachineState {
        self.state
    }

    /// Attempt a transition given an event.
    pub fn handle_event(&mut self, event: MachineEvent) -> TransitionResult {
        use MachineEvent::*;
        use MachineState::*;

        let next = match (self.state, event) {
            // Abort is accepted everywhere.
            (_, Abort) => Reset,

            (Reset | Stop, CycleStart) => Run,
            (Run | EndHold, CycleStart) => return TransitionResult::Ignored,
            (Hold, CycleStart) => EndHold,

            (Run, ProgramStop) => Stop,
            (Reset | Stop, ProgramStop) => return TransitionResult::Ignored,

            (Run | Stop, ProgramEnd) => Reset,
            (Reset, ProgramEnd) => return TransitionResult::Ignored,

            // Feedhold only acts on a running program.
            (Run, Feedhold) => Hold,
            (_, Feedhold) => return TransitionResult::Ignored,

            (Run, QueueEmpty) => Stop,
            (Reset | Stop, QueueEmpty) => return TransitionResult::Ignored,

            (EndHold, HoldReleased { blocks_queued: true }) => Run,
            (EndHold, HoldReleased { blocks_queued: false }) => Stop,

            (Reset | Stop | Run, HomingStart) => Homing,
            (Homing, HomingComplete { resume }) if resume != Homing => resume,

            _ => {
                return TransitionResult::Rejected(invalid_transition_reason(self.state, event));
            }
        };

        self.state = next;
        TransitionResult::Ok(next)
    }

    /// Machine accepts new queued work.
    #[inline]
    pub const fn accepts_work(&self) -> bool {
        matches!(
            self.state,
            MachineState::Reset | MachineState::Run | MachineState::Stop
        )
    }

    /// Executing or about to execute.
    #[inline]
    pub const fn is_cycle_active(&self) -> bool {
        matches!(
            self.state,
            MachineState::Run | MachineState::Hold | MachineState::EndHold | MachineState::Homing
        )
    }
}

fn invalid_transition_reason(state: MachineState, event: MachineEvent) -> &'static str {
    use MachineEvent::*;
    use MachineState::*;
    match (state, event) {
        (Homing, _) => "Homing: only HomingComplete, Feedhold or Abort allowed",
        (_, HomingComplete { .. }) => "HomingComplete outside a homing cycle",
        (_, HomingStart) => "HomingStart not allowed while holding",
        (_, HoldReleased { .. }) => "HoldReleased outside EndHold",
        (Hold, _) => "Hold: only CycleStart, Feedhold or Abort allowed",
        (EndHold, _) => "EndHold: waiting for HoldReleased",
        (Reset, _) => "Reset: invalid event for current state",
        (Run, _) => "Run: invalid event for current state",
        (Stop, _) => "Stop: invalid event for current state",
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
