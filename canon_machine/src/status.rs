//! Status snapshot for the status reporter.
//!
//! Positions are in display units: the active units for linear axes,
//! degrees for rotary axes.

use canon_common::prelude::*;
use serde::Serialize;

use crate::canonical::CanonicalMachine;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub linecount: u32,
    pub linenum: u32,
    pub machine_state: MachineState,
    pub feedhold_state: FeedholdState,
    pub homing_state: HomingState,
    /// Axis being homed during a homing cycle.
    pub homing_axis: Option<Axis>,
    pub motion_mode: MotionMode,
    pub plane: Plane,
    pub units_mode: UnitsMode,
    pub distance_mode: DistanceMode,
    pub coord_system: CoordSystem,
    pub path_control: PathControl,
    pub program_flow: ProgramFlow,
    /// Display units per minute.
    pub feed_rate: f64,
    pub spindle_mode: SpindleMode,
    pub spindle_speed: f64,
    pub tool: u8,
    pub work_position: [f64; 6],
    pub machine_position: [f64; 6],
    /// Last executor report [mm, machine].
    pub runtime_position: [f64; 6],
    pub busy: bool,
}

impl StatusSnapshot {
    pub fn capture(cm: &CanonicalMachine) -> Self {
        let gm = cm.active();
        Self {
            linecount: cm.linecount(),
            linenum: cm.linenum(),
            machine_state: cm.machine_state(),
            feedhold_state: cm.feedhold_state(),
            homing_state: cm.homing_state(),
            homing_axis: cm.homing_axis(),
            motion_mode: gm.motion_mode,
            plane: gm.plane,
            units_mode: gm.units_mode,
            distance_mode: gm.distance_mode,
            coord_system: gm.coord_system,
            path_control: gm.path_control,
            program_flow: gm.program_flow,
            feed_rate: crate::transform::from_millimeters(gm.feed_rate, gm.units_mode),
            spindle_mode: gm.spindle_mode,
            spindle_speed: gm.spindle_speed,
            tool: gm.tool,
            work_position: cm.model_work_position_vector().0,
            machine_position: cm.machine_position_display().0,
            runtime_position: cm.runtime_position_vector().0,
            busy: cm.is_busy(),
        }
    }

    /// Machine state as the status string.
    pub fn state_name(&self) -> &'static str {
        self.machine_state.name()
    }
}
