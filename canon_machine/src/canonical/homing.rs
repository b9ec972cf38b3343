//! Homing cycle (G30) and return to home (G28).

use canon_common::prelude::*;
use tracing::{debug, info, warn};

use super::{CanonicalMachine, SettingsChange};
use crate::link::{ExecutorRequest, MotionKind};
use crate::state::{HomingStep, MachineEvent, ReturnHome};

impl CanonicalMachine {
    /// G30: home every enabled axis in the configured order.
    pub fn homing_cycle(&mut self) -> Result<(), CanonError> {
        let mut block = self.begin_block();
        block.set_non_modal(NonModal::HomingCycle);
        self.apply_block(&block, false).map(drop)
    }

    /// G28: traverse to the stored reference position, optionally through
    /// the flagged intermediate point. Needs a homed machine.
    pub fn return_to_home(&mut self, values: &AxisVector, flags: AxisFlags) -> Result<(), CanonError> {
        let mut block = self.axis_block(values, flags);
        block.set_non_modal(NonModal::ReturnToHome);
        self.apply_block(&block, false).map(drop)
    }

    pub(super) fn start_homing_cycle(&mut self) {
        self.transition(MachineEvent::HomingStart);
        self.homing_state = HomingState::InCycle;
        info!("Homing cycle started");

        let axes = &self.axes;
        let step = self.homing_cycle.start(&self.settings.homing_order, |axis| {
            let config = &axes[axis.index()];
            config.homing_enabled && config.mode != AxisMode::Disabled
        });
        self.apply_homing_step(step);
    }

    /// Executor finished homing `axis`, or failed to.
    pub fn homing_callback(&mut self, axis: Axis, homed: bool) {
        let step = if homed {
            self.homing_cycle.on_axis_complete(axis)
        } else {
            self.homing_cycle.on_axis_failed(axis)
        };
        if homed && step != HomingStep::Ignored {
            let home = self.axes[axis.index()].home_position;
            self.active.position[axis] = home;
            self.active.target[axis] = home;
            self.runtime_position[axis] = home;
            debug!("Axis {} homed at {home}", axis.letter());
        }
        self.apply_homing_step(step);
    }

    fn apply_homing_step(&mut self, step: HomingStep) {
        match step {
            HomingStep::HomeAxis(axis) => {
                let config = &self.axes[axis.index()];
                let request = ExecutorRequest::HomeAxis {
                    axis,
                    search_velocity: config.search_velocity,
                    latch_velocity: config.latch_velocity,
                };
                debug!("Homing axis {}", axis.letter());
                self.link.send(request);
            }
            HomingStep::Complete => {
                self.homing_state = HomingState::Homed;
                self.settings_changes.push(SettingsChange::Homed(1));
                self.transition(MachineEvent::HomingComplete {
                    resume: MachineState::Reset,
                });
                let axes: String = self
                    .homing_cycle
                    .sequence()
                    .iter()
                    .map(|a| a.letter())
                    .collect();
                info!("Homing cycle complete: {axes}");
            }
            HomingStep::Failed(axis) => {
                warn!("Homing failed on axis {}", axis.letter());
                self.homing_state = HomingState::NotHomed;
                self.settings_changes.push(SettingsChange::Homed(0));
                self.link.send(ExecutorRequest::Flush);
                self.queued_blocks = 0;
                self.transition(MachineEvent::HomingComplete {
                    resume: MachineState::Reset,
                });
            }
            HomingStep::Ignored => debug!("Homing event ignored"),
        }
    }

    pub(super) fn start_return_home(&mut self, intermediate: Option<AxisVector>, reference: AxisVector) {
        let resume = self.machine.state();
        self.transition(MachineEvent::HomingStart);
        self.return_home = ReturnHome::Moving { resume };
        info!("Return to home from {}", resume.name());
        if let Some(via) = intermediate {
            let request = self.motion_request(MotionKind::Traverse, via);
            self.queue(ExecutorRequest::Motion(request));
        }
        let request = self.motion_request(MotionKind::Traverse, reference);
        self.queue(ExecutorRequest::Motion(request));
    }

    /// Finish a return to home once its moves have drained. Returns whether
    /// a return to home completed.
    pub fn return_to_home_callback(&mut self) -> bool {
        if self.queued_blocks > 0 {
            return false;
        }
        match self.return_home.finish() {
            Some(resume) => {
                self.transition(MachineEvent::HomingComplete { resume });
                info!("Return to home complete");
                true
            }
            None => false,
        }
    }
}
