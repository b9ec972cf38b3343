//! Direct modal setters.
//!
//! Each is a one-command block through the regular merge, so it gets the
//! same validation, atomic commit and settings-change reporting as a parsed
//! block. They do not advance `linecount`.

use canon_common::prelude::*;

use super::{BlockOutcome, CanonicalMachine};
use crate::model::{Block, Change};

impl CanonicalMachine {
    pub(super) fn apply_change(&mut self, change: Change) -> Result<BlockOutcome, CanonError> {
        let mut block = self.begin_block();
        block.push(change);
        self.apply_block(&block, false)
    }

    /// Block with the flagged axis words of `values`.
    pub(super) fn axis_block(&self, values: &AxisVector, flags: AxisFlags) -> Block {
        let mut block = self.begin_block();
        for (axis, value) in values.iter() {
            if flags.has(axis) {
                block.set_axis(axis, value);
            }
        }
        block
    }

    /// G17 / G18 / G19
    pub fn select_plane(&mut self, plane: Plane) -> Result<(), CanonError> {
        self.apply_change(Change::Plane(plane)).map(drop)
    }

    /// G20 / G21
    pub fn set_units_mode(&mut self, units: UnitsMode) -> Result<(), CanonError> {
        self.apply_change(Change::UnitsMode(units)).map(drop)
    }

    /// G90 / G91
    pub fn set_distance_mode(&mut self, mode: DistanceMode) -> Result<(), CanonError> {
        self.apply_change(Change::DistanceMode(mode)).map(drop)
    }

    /// G54..G59, or the machine frame.
    pub fn set_coord_system(&mut self, coord_system: CoordSystem) -> Result<(), CanonError> {
        self.apply_change(Change::CoordSystem(coord_system)).map(drop)
    }

    /// G61 / G61.1 / G64
    pub fn set_path_control(&mut self, mode: PathControl) -> Result<(), CanonError> {
        self.apply_change(Change::PathControl(mode)).map(drop)
    }

    /// F, in the current units (or 1/min in inverse-time mode).
    pub fn set_feed_rate(&mut self, feed_rate: f64) -> Result<(), CanonError> {
        self.apply_change(Change::FeedRate(feed_rate)).map(drop)
    }

    /// G93 (true) / G94 (false)
    pub fn set_inverse_feed_rate_mode(&mut self, enabled: bool) -> Result<(), CanonError> {
        self.apply_change(Change::InverseFeedRateMode(enabled)).map(drop)
    }

    /// G53 for the next block. Cleared when that block commits.
    pub fn set_absolute_override(&mut self, enabled: bool) {
        self.active.absolute_override = enabled;
    }

    /// G10 L2: write the offsets of a work coordinate system. Values are in
    /// the current units; unflagged axes keep their stored offset.
    pub fn set_coord_offsets(
        &mut self,
        coord_system: CoordSystem,
        values: &AxisVector,
        flags: AxisFlags,
    ) -> Result<(), CanonError> {
        let mut block = self.axis_block(values, flags);
        block.set_non_modal(NonModal::SetCoordOffset(coord_system));
        self.apply_block(&block, false).map(drop)
    }

    /// G92 / G92.1 / G92.2 / G92.3. Axis values are only read by G92.
    pub fn set_origin_offsets(
        &mut self,
        mode: OriginOffsetMode,
        values: &AxisVector,
        flags: AxisFlags,
    ) -> Result<(), CanonError> {
        let mut block = if mode == OriginOffsetMode::Set {
            self.axis_block(values, flags)
        } else {
            self.begin_block()
        };
        block.set_non_modal(NonModal::OriginOffset(mode));
        self.apply_block(&block, false).map(drop)
    }

    /// Set the machine position of the flagged axes [mm, machine]. Only
    /// while nothing is running.
    pub fn set_machine_coords(&mut self, values: &AxisVector, flags: AxisFlags) -> Result<(), CanonError> {
        if self.is_busy() {
            return Err(CanonError::IllegalStateTransition {
                state: self.machine.state(),
                operation: "set_machine_coords",
            });
        }
        for (axis, value) in values.iter() {
            if !flags.has(axis) {
                continue;
            }
            if !value.is_finite() {
                return Err(CanonError::InvalidValue {
                    field: "machine_coords",
                    value,
                });
            }
        }
        for (axis, value) in values.iter() {
            if flags.has(axis) {
                self.active.position[axis] = value;
                self.active.target[axis] = value;
                self.runtime_position[axis] = value;
            }
        }
        Ok(())
    }
}
