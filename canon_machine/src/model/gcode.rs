//! Active G-code model.
//!
//! The one instance the executor may read. All values are normalized:
//! millimeters, machine frame, degrees for rotary axes.

use canon_common::prelude::*;
use serde::Serialize;

use crate::transform::Frame;

/// Canonical modal state of the machine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GCodeState {
    /// What the last committed block executed.
    pub next_action: NextAction,
    pub motion_mode: MotionMode,
    pub program_flow: ProgramFlow,

    /// Commanded endpoint of the current block [mm, machine].
    pub target: AxisVector,
    /// Last confirmed model position [mm, machine].
    pub position: AxisVector,
    /// G92 offsets [mm].
    pub origin_offset: AxisVector,
    pub origin_offset_mode: OriginOffsetMode,

    /// [mm/min]
    pub feed_rate: f64,
    /// [1/min], inverse-time mode only.
    pub inverse_feed_rate: f64,
    pub inverse_feed_rate_mode: bool,

    pub plane: Plane,
    pub coord_system: CoordSystem,
    /// Work coordinate system written by the last G10 block.
    pub set_coord_offset: Option<CoordSystem>,
    pub units_mode: UnitsMode,
    /// G53, single block.
    pub absolute_override: bool,
    pub path_control: PathControl,
    pub distance_mode: DistanceMode,

    pub tool: u8,
    pub change_tool: bool,
    pub spindle_mode: SpindleMode,
    /// [rpm]
    pub spindle_speed: f64,
    /// [s]
    pub dwell_time: f64,
    /// [mm]
    pub arc_radius: f64,
    /// IJK [mm]
    pub arc_offset: [f64; 3],
}

impl GCodeState {
    /// Power-on model.
    pub fn from_defaults(defaults: &GCodeDefaults) -> Self {
        Self {
            next_action: NextAction::None,
            motion_mode: MotionMode::default(),
            program_flow: ProgramFlow::Running,
            target: AxisVector::ZERO,
            position: AxisVector::ZERO,
            origin_offset: AxisVector::ZERO,
            origin_offset_mode: OriginOffsetMode::Cancel,
            feed_rate: 0.0,
            inverse_feed_rate: 0.0,
            inverse_feed_rate_mode: defaults.inverse_feed_rate_mode,
            plane: defaults.plane,
            coord_system: defaults.coord_system,
            set_coord_offset: None,
            units_mode: defaults.units_mode,
            absolute_override: false,
            path_control: defaults.path_control,
            distance_mode: defaults.distance_mode,
            tool: 0,
            change_tool: false,
            spindle_mode: SpindleMode::Off,
            spindle_speed: 0.0,
            dwell_time: 0.0,
            arc_radius: 0.0,
            arc_offset: [0.0; 3],
        }
    }

    #[inline]
    pub fn plane_axes(&self) -> PlaneAxes {
        self.plane.axes()
    }

    /// Offsets in force for the next move.
    pub fn frame(&self, offsets: &CoordOffsetTable) -> Frame {
        Frame {
            coord_offset: offsets.get(self.coord_system),
            origin_offset: self.origin_offset,
            origin_applied: self.origin_offset_mode.is_applied(),
            absolute_override: self.absolute_override,
        }
    }

    /// RS274 end-of-program resets (M2/M30).
    pub fn apply_program_end(&mut self, defaults: &GCodeDefaults) {
        self.plane = defaults.plane;
        self.coord_system = defaults.coord_system;
        self.distance_mode = defaults.distance_mode;
        self.origin_offset_mode = OriginOffsetMode::Suspend;
        self.inverse_feed_rate_mode = false;
        self.spindle_mode = SpindleMode::Off;
        self.motion_mode = MotionMode::StraightFeed;
        self.program_flow = ProgramFlow::Completed;
        self.absolute_override = false;
    }
}

// ─── Settings Changes ───────────────────────────────────────────────

/// Persistent state changed by a committed block or cycle, for the
/// configuration store to write back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "setting", content = "value", rename_all = "snake_case")]
pub enum SettingsChange {
    CoordSystem(CoordSystem),
    UnitsMode(UnitsMode),
    DistanceMode(DistanceMode),
    Plane(Plane),
    PathControl(PathControl),
    SpindleMode(SpindleMode),
    Tool(u8),
    CoordOffsets {
        coord_system: CoordSystem,
        offsets: AxisVector,
    },
    /// Persisted homed flag (0 or 1).
    Homed(u8),
}

impl SettingsChange {
    /// Changes between two models, in a stable order.
    pub fn diff(before: &GCodeState, after: &GCodeState) -> Vec<SettingsChange> {
        let mut changes = Vec::new();
        if before.coord_system != after.coord_system {
            changes.push(Self::CoordSystem(after.coord_system));
        }
        if before.units_mode != after.units_mode {
            changes.push(Self::UnitsMode(after.units_mode));
        }
        if before.distance_mode != after.distance_mode {
            changes.push(Self::DistanceMode(after.distance_mode));
        }
        if before.plane != after.plane {
            changes.push(Self::Plane(after.plane));
        }
        if before.path_control != after.path_control {
            changes.push(Self::PathControl(after.path_control));
        }
        if before.spindle_mode != after.spindle_mode {
            changes.push(Self::SpindleMode(after.spindle_mode));
        }
        if before.tool != after.tool {
            changes.push(Self::Tool(after.tool));
        }
        changes
    }
}
