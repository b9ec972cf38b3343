//! Cycle control: cycle start, program stop/end, feedhold and abort.
//!
//! Program stop and end are requested immediately and executed by
//! `exec_stop` / `exec_end` once the executor has drained the queue. Until
//! then the machine reports busy.

use canon_common::prelude::*;
use tracing::{debug, info, warn};

use super::{CanonicalMachine, Drain, SettingsChange};
use crate::link::ExecutorRequest;
use crate::model::Change;
use crate::state::{FeedholdEvent, FeedholdTransition, MachineEvent, ReturnHome, TransitionResult};

impl CanonicalMachine {
    /// Cycle start key.
    ///
    /// Starts from Reset/Stop, resumes from a feedhold, and is a no-op while
    /// running. A cycle start during a feedhold that has not come to rest
    /// yet is latched and applied once it has.
    pub fn cycle_start(&mut self) -> Result<(), CanonError> {
        let state = self.machine.state();
        if state == MachineState::Hold && !self.feedhold.is_held() {
            debug!("Cycle start latched until the feedhold comes to rest");
            self.resume_latched = true;
            return Ok(());
        }
        match self.transition(MachineEvent::CycleStart) {
            TransitionResult::Ok(MachineState::EndHold) => {
                self.feedhold_event(FeedholdEvent::Release);
                self.link.send(ExecutorRequest::Resume {
                    target: self.active.target,
                });
                Ok(())
            }
            TransitionResult::Ok(_) | TransitionResult::Ignored => Ok(()),
            TransitionResult::Rejected(_) => Err(CanonError::IllegalStateTransition {
                state,
                operation: "cycle_start",
            }),
        }
    }

    /// M0
    pub fn program_stop(&mut self) -> Result<(), CanonError> {
        self.apply_change(Change::Stop(ProgramStop::Stop)).map(drop)
    }

    /// M1, honoured only when optional stops are enabled.
    pub fn optional_program_stop(&mut self) -> Result<(), CanonError> {
        self.apply_change(Change::Stop(ProgramStop::OptionalStop)).map(drop)
    }

    /// M2 / M30
    pub fn program_end(&mut self) -> Result<(), CanonError> {
        self.apply_change(Change::Stop(ProgramStop::End)).map(drop)
    }

    pub(super) fn request_drain(&mut self, drain: Drain) {
        let request = match drain {
            Drain::Stop => ExecutorRequest::ProgramStop,
            Drain::End => ExecutorRequest::ProgramEnd,
        };
        self.link.send(request);
        self.drain = Some(drain);
        self.check_queue_drained();
    }

    /// Deferred half of a program stop: the queue has drained.
    pub fn exec_stop(&mut self) {
        self.drain = None;
        self.transition(MachineEvent::ProgramStop);
        info!("Program stopped at line {}", self.linenum);
    }

    /// Deferred half of a program end: apply the end-of-program resets.
    pub fn exec_end(&mut self) {
        self.drain = None;
        let before = self.active.clone();
        self.active.apply_program_end(&self.defaults);
        self.settings_changes
            .extend(SettingsChange::diff(&before, &self.active));
        self.transition(MachineEvent::ProgramEnd);
        info!("Program end at line {}", self.linenum);
    }

    /// Runs on every tick: acts on an empty queue.
    pub(super) fn check_queue_drained(&mut self) {
        if self.queued_blocks > 0 {
            return;
        }
        match self.machine.state() {
            MachineState::Hold => {
                if self.feedhold.state().is_stopping() {
                    self.feedhold_event(FeedholdEvent::MotionStopped);
                }
            }
            MachineState::Homing => {
                if self.return_to_home_callback() && self.machine.state() == MachineState::Run {
                    self.check_queue_drained();
                }
            }
            MachineState::Run | MachineState::Reset | MachineState::Stop => match self.drain {
                Some(Drain::Stop) => self.exec_stop(),
                Some(Drain::End) => self.exec_end(),
                None => {
                    if self.machine.state() == MachineState::Run {
                        self.transition(MachineEvent::QueueEmpty);
                    }
                }
            },
            MachineState::EndHold => {}
        }
    }

    // ─── Feedhold ───────────────────────────────────────────────────

    /// Feedhold key. Ignored in every machine state but Run.
    pub fn feedhold(&mut self) -> Result<(), CanonError> {
        let state = self.machine.state();
        match self.transition(MachineEvent::Feedhold) {
            TransitionResult::Ok(_) => {
                let motion_queued = self.queued_blocks > 0;
                self.feedhold_event(FeedholdEvent::Request { motion_queued });
                Ok(())
            }
            TransitionResult::Ignored => Ok(()),
            TransitionResult::Rejected(_) => Err(CanonError::IllegalStateTransition {
                state,
                operation: "feedhold",
            }),
        }
    }

    pub(super) fn feedhold_event(&mut self, event: FeedholdEvent) {
        let from = self.feedhold.state();
        match self.feedhold.handle_event(event) {
            FeedholdTransition::Ok(to) => {
                debug!("Feedhold {from:?} -> {to:?} ({event:?})");
                match to {
                    FeedholdState::Sync => {
                        self.link.send(ExecutorRequest::FeedholdSync);
                    }
                    FeedholdState::Plan => {
                        self.link.send(ExecutorRequest::FeedholdPlan);
                    }
                    FeedholdState::Hold => self.on_hold_reached(),
                    FeedholdState::Decel | FeedholdState::Off => {}
                }
            }
            FeedholdTransition::Ignored => debug!("Feedhold {from:?} ignores {event:?}"),
            FeedholdTransition::Rejected(reason) => debug!("Feedhold {event:?} rejected: {reason}"),
        }
    }

    fn on_hold_reached(&mut self) {
        info!("Feedhold: motion held at line {}", self.linenum);
    }

    /// Applies a cycle start latched during deceleration. Runs from `tick`
    /// once the executor events have been handled.
    pub(super) fn apply_latched_resume(&mut self) {
        if !self.resume_latched || !self.feedhold.is_held() {
            return;
        }
        self.resume_latched = false;
        if let Err(e) = self.cycle_start() {
            warn!("Latched cycle start dropped: {e}");
        }
    }

    // ─── Abort ──────────────────────────────────────────────────────

    /// Unconditional stop from any state. Discards queued motion, resyncs
    /// the model to the last runtime position and returns to Reset.
    /// Repeating it changes nothing.
    pub fn abort(&mut self) {
        warn!("Abort in machine state {}", self.machine.state().name());
        self.link.send(ExecutorRequest::Flush);
        self.queued_blocks = 0;
        self.drain = None;
        self.resume_latched = false;
        self.pending_arc = Default::default();
        self.feedhold.handle_event(FeedholdEvent::Abort);
        if self.homing_state == HomingState::InCycle {
            self.homing_state = HomingState::NotHomed;
            self.settings_changes.push(SettingsChange::Homed(0));
        }
        self.homing_cycle.cancel();
        self.return_home = ReturnHome::Idle;
        self.transition(MachineEvent::Abort);

        let before = self.active.clone();
        self.active.position = self.runtime_position;
        self.active.target = self.runtime_position;
        self.active.absolute_override = false;
        self.active.spindle_mode = SpindleMode::Off;
        self.active.next_action = NextAction::None;
        self.settings_changes
            .extend(SettingsChange::diff(&before, &self.active));
    }
}
