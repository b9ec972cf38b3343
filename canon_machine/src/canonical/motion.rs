//! Motion, dwell, spindle and tool operations.
//!
//! Axis values are in the current units, distance mode and work frame,
//! exactly as a program would write them.

use canon_common::prelude::*;

use super::{BlockOutcome, CanonicalMachine};
use crate::model::Change;

/// Arc words set ahead of the next `arc_feed`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArcWords {
    /// IJK, current units.
    pub offset: Option<[f64; 3]>,
    /// R, current units.
    pub radius: Option<f64>,
}

impl CanonicalMachine {
    fn motion(
        &mut self,
        mode: MotionMode,
        values: &AxisVector,
        flags: AxisFlags,
    ) -> Result<BlockOutcome, CanonError> {
        let mut block = self.axis_block(values, flags);
        block.set_motion_mode(mode);
        self.apply_block(&block, false)
    }

    /// G0
    pub fn straight_traverse(&mut self, values: &AxisVector, flags: AxisFlags) -> Result<(), CanonError> {
        self.motion(MotionMode::StraightTraverse, values, flags).map(drop)
    }

    /// G1
    pub fn straight_feed(&mut self, values: &AxisVector, flags: AxisFlags) -> Result<(), CanonError> {
        self.motion(MotionMode::StraightFeed, values, flags).map(drop)
    }

    /// G38.2
    pub fn straight_probe(&mut self, values: &AxisVector, flags: AxisFlags) -> Result<(), CanonError> {
        self.motion(MotionMode::StraightProbe, values, flags).map(drop)
    }

    /// IJK for the next arc.
    pub fn set_arc_offset(&mut self, i: f64, j: f64, k: f64) {
        self.pending_arc.offset = Some([i, j, k]);
    }

    /// R for the next arc.
    pub fn set_arc_radius(&mut self, radius: f64) {
        self.pending_arc.radius = Some(radius);
    }

    /// G2 / G3 using the pending arc words. The words are consumed whether
    /// or not the arc is accepted.
    pub fn arc_feed(
        &mut self,
        values: &AxisVector,
        flags: AxisFlags,
        direction: Direction,
    ) -> Result<(), CanonError> {
        let arc = std::mem::take(&mut self.pending_arc);
        let mut block = self.axis_block(values, flags);
        block.set_motion_mode(match direction {
            Direction::Cw => MotionMode::CwArc,
            Direction::Ccw => MotionMode::CcwArc,
        });
        if let Some(offset) = arc.offset {
            for (index, value) in offset.into_iter().enumerate() {
                block.set_arc_offset(index, value);
            }
        }
        if let Some(radius) = arc.radius {
            block.set_arc_radius(radius);
        }
        self.apply_block(&block, false).map(drop)
    }

    /// G4 P`seconds`
    pub fn dwell(&mut self, seconds: f64) -> Result<(), CanonError> {
        let mut block = self.begin_block();
        block
            .set_non_modal(NonModal::Dwell)
            .set_dwell_time(seconds);
        self.apply_block(&block, false).map(drop)
    }

    /// S
    pub fn set_spindle_speed(&mut self, speed: f64) -> Result<(), CanonError> {
        self.apply_change(Change::SpindleSpeed(speed)).map(drop)
    }

    /// M3 / M4 / M5
    pub fn spindle_control(&mut self, mode: SpindleMode) -> Result<(), CanonError> {
        self.apply_change(Change::SpindleMode(mode)).map(drop)
    }

    /// M3
    pub fn start_spindle_clockwise(&mut self) -> Result<(), CanonError> {
        self.spindle_control(SpindleMode::Cw)
    }

    /// M4
    pub fn start_spindle_counterclockwise(&mut self) -> Result<(), CanonError> {
        self.spindle_control(SpindleMode::Ccw)
    }

    /// M5
    pub fn stop_spindle_turning(&mut self) -> Result<(), CanonError> {
        self.spindle_control(SpindleMode::Off)
    }

    /// T
    pub fn select_tool(&mut self, tool: u8) -> Result<(), CanonError> {
        self.apply_change(Change::SelectTool(tool)).map(drop)
    }

    /// M6 with the selected tool.
    pub fn change_tool(&mut self) -> Result<(), CanonError> {
        self.apply_change(Change::ChangeTool).map(drop)
    }
}
