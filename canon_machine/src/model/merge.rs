//! Staged block merge.
//!
//! [`stage_block`] applies a checked [`Block`] to a copy of the active model
//! in RS274/NGC execution order and returns the result together with the
//! work the block asks for. Nothing is committed here: a rejected block
//! leaves the caller's active model untouched.

use canon_common::consts::AXES;
use canon_common::prelude::*;

use crate::link::MotionKind;
use crate::model::block::{Block, Change};
use crate::model::gcode::{GCodeState, SettingsChange};
use crate::transform::{AxisWords, axis_to_canonical, resolve_target, to_millimeters};

/// Configuration the merge reads.
#[derive(Debug, Clone, Copy)]
pub struct MergeEnv<'a> {
    pub offsets: &'a CoordOffsetTable,
    pub axes: &'a [AxisConfig; AXES],
    /// G28 stored position [mm, machine].
    pub reference_position: &'a AxisVector,
    pub max_tool: u8,
    pub optional_stop_enabled: bool,
}

/// The block's action, resolved to machine coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StagedAction {
    Motion(MotionKind),
    Dwell { seconds: f64 },
    /// G28: optional intermediate point, then the reference position.
    ReturnToHome {
        intermediate: Option<AxisVector>,
        reference: AxisVector,
    },
    HomingCycle,
}

impl StagedAction {
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Motion(MotionKind::Traverse) => "straight_traverse",
            Self::Motion(MotionKind::Feed) => "straight_feed",
            Self::Motion(MotionKind::Arc { .. }) => "arc_feed",
            Self::Motion(MotionKind::Probe) => "straight_probe",
            Self::Dwell { .. } => "dwell",
            Self::ReturnToHome { .. } => "return_to_home",
            Self::HomingCycle => "homing_cycle",
        }
    }
}

/// Result of staging one block. Committed as a whole or dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedBlock {
    pub state: GCodeState,
    pub action: Option<StagedAction>,
    /// Spindle mode or speed changed.
    pub spindle: Option<(SpindleMode, f64)>,
    /// M6 with the selected tool.
    pub tool_change: Option<u8>,
    /// Program stop after optional-stop filtering.
    pub stop: Option<ProgramStop>,
    /// G10 write to the offset tables.
    pub coord_offset_update: Option<(CoordSystem, AxisVector)>,
    pub settings: Vec<SettingsChange>,
    pub line_number: Option<u32>,
}

impl StagedBlock {
    /// Block sends queued work to the executor.
    pub fn queues_work(&self) -> bool {
        self.action.is_some()
            || self.spindle.is_some()
            || self.tool_change.is_some()
            || self.stop.is_some()
    }
}

fn finite(field: &'static str, value: f64) -> Result<f64, CanonError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CanonError::InvalidValue { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, CanonError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(CanonError::InvalidValue { field, value })
    }
}

/// Stage `block` on top of `active`.
pub fn stage_block(
    active: &GCodeState,
    block: &Block,
    env: &MergeEnv<'_>,
) -> Result<StagedBlock, CanonError> {
    let mut next = active.clone();
    next.next_action = NextAction::None;
    next.change_tool = false;
    next.set_coord_offset = None;
    next.arc_radius = 0.0;
    next.arc_offset = [0.0; 3];

    let mut staged = StagedBlock {
        state: active.clone(),
        action: None,
        spindle: None,
        tool_change: None,
        stop: None,
        coord_offset_update: None,
        settings: Vec::new(),
        line_number: None,
    };

    // Words of this block convert in its own G20/G21, else the active one.
    let units = block.units_word().unwrap_or(active.units_mode);
    let mut spindle_changed = false;
    let mut dwell_given = false;
    let mut radius_given = false;

    // Values outside any modal group. Modal group 5 first so F is read in
    // the mode of its own block.
    for change in block.changes() {
        if let Change::InverseFeedRateMode(enabled) = *change {
            next.inverse_feed_rate_mode = enabled;
        }
    }
    if let Some(feed) = block.feed_rate() {
        let feed = non_negative("feed_rate", feed)?;
        if next.inverse_feed_rate_mode {
            next.inverse_feed_rate = feed;
        } else {
            next.feed_rate = to_millimeters(feed, units);
        }
    }
    for change in block.changes() {
        match *change {
            Change::SpindleSpeed(speed) => {
                next.spindle_speed = non_negative("spindle_speed", speed)?;
                spindle_changed = true;
            }
            Change::SelectTool(tool) => {
                if tool > env.max_tool {
                    return Err(CanonError::InvalidValue {
                        field: "tool",
                        value: f64::from(tool),
                    });
                }
                next.tool = tool;
            }
            Change::DwellTime(seconds) => {
                next.dwell_time = non_negative("dwell_time", seconds)?;
                dwell_given = true;
            }
            Change::LineNumber(line) => staged.line_number = Some(line),
            _ => {}
        }
    }

    // M6 after T, spindle after M6.
    if block.changes().contains(&Change::ChangeTool) {
        next.change_tool = true;
        staged.tool_change = Some(next.tool);
    }
    for change in block.changes() {
        if let Change::SpindleMode(mode) = *change {
            next.spindle_mode = mode;
            spindle_changed = true;
        }
    }
    if spindle_changed {
        staged.spindle = Some((next.spindle_mode, next.spindle_speed));
    }

    // Modal state.
    next.units_mode = units;
    if let Some(plane) = block.plane_word() {
        next.plane = plane;
    }
    if let Some(mode) = block.distance_word() {
        next.distance_mode = mode;
    }
    if let Some(mode) = block.motion_word() {
        next.motion_mode = mode;
    }
    for change in block.changes() {
        match *change {
            Change::PathControl(mode) => next.path_control = mode,
            Change::CoordSystem(cs) => next.coord_system = cs,
            Change::ArcRadius(radius) => {
                next.arc_radius = to_millimeters(finite("arc_radius", radius)?, units);
                radius_given = true;
            }
            Change::ArcOffset { index, value } => {
                if index >= 3 {
                    return Err(CanonError::InvalidAxis(index));
                }
                next.arc_offset[index] = to_millimeters(finite("arc_offset", value)?, units);
            }
            Change::Axis { axis, value } => {
                finite(axis_field(axis), value)?;
            }
            _ => {}
        }
    }

    // Non-modal commands.
    let words = block.axis_words();
    let mut words_consumed = false;
    for command in block.non_modals() {
        match command {
            NonModal::SetCoordOffset(cs) => {
                if cs == CoordSystem::Absolute {
                    return Err(CanonError::InvalidCoordSystem(cs as u8));
                }
                let mut offsets = env.offsets.get(cs);
                for (axis, value) in words.values.iter() {
                    if words.present.has(axis) {
                        offsets[axis] = axis_to_canonical(axis, value, units);
                    }
                }
                next.set_coord_offset = Some(cs);
                staged.coord_offset_update = Some((cs, offsets));
                words_consumed = true;
            }
            NonModal::OriginOffset(mode) => {
                apply_origin_offset(&mut next, mode, &words, env);
                words_consumed |= mode == OriginOffsetMode::Set;
            }
            NonModal::AbsoluteOverride => next.absolute_override = true,
            NonModal::Dwell | NonModal::ReturnToHome | NonModal::HomingCycle => {}
        }
    }

    // The block's action.
    let frame = next.frame(env.offsets);
    if block.has_non_modal(NonModal::Dwell) {
        if !dwell_given {
            return Err(CanonError::MissingWord('P'));
        }
        next.next_action = NextAction::Dwell;
        staged.action = Some(StagedAction::Dwell {
            seconds: next.dwell_time,
        });
    } else if block.has_non_modal(NonModal::ReturnToHome) {
        let intermediate = if words.is_empty() {
            None
        } else {
            Some(resolve_target(
                &words,
                next.distance_mode,
                units,
                &frame,
                env.axes,
                &next.position,
            )?)
        };
        next.next_action = NextAction::ReturnToHome;
        next.target = *env.reference_position;
        next.position = next.target;
        staged.action = Some(StagedAction::ReturnToHome {
            intermediate,
            reference: *env.reference_position,
        });
    } else if block.has_non_modal(NonModal::HomingCycle) {
        next.next_action = NextAction::HomingCycle;
        staged.action = Some(StagedAction::HomingCycle);
    } else if !words.is_empty()
        && !words_consumed
        && next.motion_mode != MotionMode::CancelMotionMode
    {
        let kind = motion_kind(&next, block, radius_given)?;
        next.target = resolve_target(
            &words,
            next.distance_mode,
            units,
            &frame,
            env.axes,
            &next.position,
        )?;
        next.position = next.target;
        next.next_action = NextAction::Motion;
        staged.action = Some(StagedAction::Motion(kind));
    }

    // Modal group 4 last.
    for change in block.changes() {
        if let Change::Stop(stop) = *change {
            match stop {
                ProgramStop::Stop => {
                    next.program_flow = ProgramFlow::Paused;
                    staged.stop = Some(stop);
                }
                ProgramStop::OptionalStop if env.optional_stop_enabled => {
                    next.program_flow = ProgramFlow::Paused;
                    staged.stop = Some(stop);
                }
                ProgramStop::OptionalStop => {}
                ProgramStop::End => {
                    next.program_flow = ProgramFlow::Completed;
                    staged.stop = Some(stop);
                }
            }
        }
    }

    staged.settings = SettingsChange::diff(active, &next);
    if let Some((coord_system, offsets)) = staged.coord_offset_update {
        staged.settings.push(SettingsChange::CoordOffsets {
            coord_system,
            offsets,
        });
    }
    staged.state = next;
    Ok(staged)
}

fn axis_field(axis: Axis) -> &'static str {
    match axis {
        Axis::X => "x",
        Axis::Y => "y",
        Axis::Z => "z",
        Axis::A => "a",
        Axis::B => "b",
        Axis::C => "c",
    }
}

/// G92 family. The G92 offset makes the current position read as the
/// programmed value in the current work frame.
fn apply_origin_offset(
    next: &mut GCodeState,
    mode: OriginOffsetMode,
    words: &AxisWords,
    env: &MergeEnv<'_>,
) {
    match mode {
        OriginOffsetMode::Set => {
            let coord = env.offsets.get(next.coord_system);
            for (axis, value) in words.values.iter() {
                if words.present.has(axis) {
                    let value = axis_to_canonical(axis, value, next.units_mode);
                    next.origin_offset[axis] = next.position[axis] - coord[axis] - value;
                }
            }
        }
        OriginOffsetMode::Cancel => next.origin_offset = AxisVector::ZERO,
        OriginOffsetMode::Suspend | OriginOffsetMode::Resume => {}
    }
    next.origin_offset_mode = mode;
}

/// Check feed and arc requirements of the effective motion mode.
fn motion_kind(next: &GCodeState, block: &Block, radius_given: bool) -> Result<MotionKind, CanonError> {
    let mode = next.motion_mode;
    if mode.is_canned_cycle() {
        return Err(CanonError::UnsupportedMotionMode(mode));
    }
    if mode.requires_feed_rate() {
        let has_rate = if next.inverse_feed_rate_mode {
            block.feed_rate().is_some() && next.inverse_feed_rate > 0.0
        } else {
            next.feed_rate > 0.0
        };
        if !has_rate {
            return Err(CanonError::MissingFeedRate);
        }
    }
    Ok(match mode {
        MotionMode::StraightTraverse => MotionKind::Traverse,
        MotionMode::StraightFeed => MotionKind::Feed,
        MotionMode::StraightProbe => MotionKind::Probe,
        MotionMode::CwArc | MotionMode::CcwArc => {
            let axes = next.plane_axes();
            let (_, present) = block.arc_offsets();
            let in_plane = |axis: Axis| axis.is_linear() && present[axis.index()];
            if !radius_given && !in_plane(axes.axis_0) && !in_plane(axes.axis_1) {
                return Err(CanonError::ArcSpecification);
            }
            MotionKind::Arc {
                direction: if mode == MotionMode::CwArc {
                    Direction::Cw
                } else {
                    Direction::Ccw
                },
                radius: radius_given.then_some(next.arc_radius),
                offset: next.arc_offset,
            }
        }
        other => return Err(CanonError::UnsupportedMotionMode(other)),
    })
}
