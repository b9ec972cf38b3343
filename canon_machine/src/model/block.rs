//! Per-block change set.
//!
//! A [`Block`] records every word the parser set for one line, in order,
//! as a list of [`Change`]s. Modal fields not changed by the block carry over
//! from the active model; the carried values are captured at
//! `begin_block` so the parser can query the effective motion mode, plane,
//! units and distance mode while it fills the block. Merging only ever reads
//! the block's own words, never the carried values.

use canon_common::consts::MAX_BLOCK_CHANGES;
use canon_common::prelude::*;
use heapless::Vec as HVec;

use crate::model::gcode::GCodeState;
use crate::transform::AxisWords;

/// One word of a block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Change {
    MotionMode(MotionMode),
    Plane(Plane),
    DistanceMode(DistanceMode),
    Stop(ProgramStop),
    /// G93 (true) / G94 (false)
    InverseFeedRateMode(bool),
    UnitsMode(UnitsMode),
    SpindleMode(SpindleMode),
    CoordSystem(CoordSystem),
    PathControl(PathControl),
    NonModal(NonModal),
    FeedRate(f64),
    SpindleSpeed(f64),
    SelectTool(u8),
    /// M6
    ChangeTool,
    DwellTime(f64),
    ArcRadius(f64),
    /// I (0), J (1), K (2)
    ArcOffset { index: usize, value: f64 },
    Axis { axis: Axis, value: f64 },
    LineNumber(u32),
}

impl Change {
    pub const fn group(&self) -> ModalGroup {
        match self {
            Self::MotionMode(_) => ModalGroup::Motion,
            Self::Plane(_) => ModalGroup::Plane,
            Self::DistanceMode(_) => ModalGroup::Distance,
            Self::Stop(_) => ModalGroup::Stopping,
            Self::InverseFeedRateMode(_) => ModalGroup::FeedRateMode,
            Self::UnitsMode(_) => ModalGroup::Units,
            Self::SpindleMode(_) => ModalGroup::Spindle,
            Self::CoordSystem(_) => ModalGroup::CoordSystem,
            Self::PathControl(_) => ModalGroup::PathControl,
            Self::NonModal(_) => ModalGroup::NonModal,
            _ => ModalGroup::None,
        }
    }

    /// Word as written in a program, for error messages.
    pub const fn gcode(&self) -> &'static str {
        match self {
            Self::MotionMode(m) => m.gcode(),
            Self::Plane(p) => p.gcode(),
            Self::DistanceMode(d) => d.gcode(),
            Self::Stop(s) => s.gcode(),
            Self::InverseFeedRateMode(true) => "G93",
            Self::InverseFeedRateMode(false) => "G94",
            Self::UnitsMode(u) => u.gcode(),
            Self::SpindleMode(s) => s.gcode(),
            Self::CoordSystem(c) => c.gcode(),
            Self::PathControl(p) => p.gcode(),
            Self::NonModal(n) => n.gcode(),
            Self::FeedRate(_) => "F",
            Self::SpindleSpeed(_) => "S",
            Self::SelectTool(_) => "T",
            Self::ChangeTool => "M6",
            Self::DwellTime(_) => "P",
            Self::ArcRadius(_) => "R",
            Self::ArcOffset { index: 0, .. } => "I",
            Self::ArcOffset { index: 1, .. } => "J",
            Self::ArcOffset { .. } => "K",
            Self::Axis { axis, .. } => match axis {
                Axis::X => "X",
                Axis::Y => "Y",
                Axis::Z => "Z",
                Axis::A => "A",
                Axis::B => "B",
                Axis::C => "C",
            },
            Self::LineNumber(_) => "N",
        }
    }
}

/// Modal values carried into a block from the active model.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Carried {
    motion_mode: MotionMode,
    plane: Plane,
    units_mode: UnitsMode,
    distance_mode: DistanceMode,
}

/// Pending change set for one block.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    carried: Carried,
    changes: HVec<Change, MAX_BLOCK_CHANGES>,
    overflow: bool,
}

impl Block {
    /// Empty block carrying the modal state of `active`.
    pub fn carrying(active: &GCodeState) -> Self {
        Self {
            carried: Carried {
                motion_mode: active.motion_mode,
                plane: active.plane,
                units_mode: active.units_mode,
                distance_mode: active.distance_mode,
            },
            changes: HVec::new(),
            overflow: false,
        }
    }

    /// Record a word. A full block is flagged and rejected at check time.
    pub fn push(&mut self, change: Change) -> &mut Self {
        if self.changes.push(change).is_err() {
            self.overflow = true;
        }
        self
    }

    pub fn set_motion_mode(&mut self, mode: MotionMode) -> &mut Self {
        self.push(Change::MotionMode(mode))
    }

    pub fn set_plane(&mut self, plane: Plane) -> &mut Self {
        self.push(Change::Plane(plane))
    }

    pub fn set_distance_mode(&mut self, mode: DistanceMode) -> &mut Self {
        self.push(Change::DistanceMode(mode))
    }

    pub fn set_program_stop(&mut self, stop: ProgramStop) -> &mut Self {
        self.push(Change::Stop(stop))
    }

    pub fn set_inverse_feed_rate_mode(&mut self, enabled: bool) -> &mut Self {
        self.push(Change::InverseFeedRateMode(enabled))
    }

    pub fn set_units_mode(&mut self, units: UnitsMode) -> &mut Self {
        self.push(Change::UnitsMode(units))
    }

    pub fn set_spindle_mode(&mut self, mode: SpindleMode) -> &mut Self {
        self.push(Change::SpindleMode(mode))
    }

    pub fn set_coord_system(&mut self, coord_system: CoordSystem) -> &mut Self {
        self.push(Change::CoordSystem(coord_system))
    }

    pub fn set_path_control(&mut self, mode: PathControl) -> &mut Self {
        self.push(Change::PathControl(mode))
    }

    pub fn set_non_modal(&mut self, command: NonModal) -> &mut Self {
        self.push(Change::NonModal(command))
    }

    pub fn set_feed_rate(&mut self, feed_rate: f64) -> &mut Self {
        self.push(Change::FeedRate(feed_rate))
    }

    pub fn set_spindle_speed(&mut self, speed: f64) -> &mut Self {
        self.push(Change::SpindleSpeed(speed))
    }

    pub fn set_tool(&mut self, tool: u8) -> &mut Self {
        self.push(Change::SelectTool(tool))
    }

    pub fn set_change_tool(&mut self) -> &mut Self {
        self.push(Change::ChangeTool)
    }

    pub fn set_dwell_time(&mut self, seconds: f64) -> &mut Self {
        self.push(Change::DwellTime(seconds))
    }

    pub fn set_arc_radius(&mut self, radius: f64) -> &mut Self {
        self.push(Change::ArcRadius(radius))
    }

    /// I/J/K word; `index` 0..3.
    pub fn set_arc_offset(&mut self, index: usize, value: f64) -> &mut Self {
        self.push(Change::ArcOffset { index, value })
    }

    pub fn set_axis(&mut self, axis: Axis, value: f64) -> &mut Self {
        self.push(Change::Axis { axis, value })
    }

    pub fn set_line_number(&mut self, line: u32) -> &mut Self {
        self.push(Change::LineNumber(line))
    }

    // ─── Queries ────────────────────────────────────────────────────

    #[inline]
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    #[inline]
    pub fn is_overflowed(&self) -> bool {
        self.overflow
    }

    /// G0..G89 word of this block, if any.
    pub fn motion_word(&self) -> Option<MotionMode> {
        self.last(|c| match c {
            Change::MotionMode(m) => Some(*m),
            _ => None,
        })
    }

    pub fn plane_word(&self) -> Option<Plane> {
        self.last(|c| match c {
            Change::Plane(p) => Some(*p),
            _ => None,
        })
    }

    pub fn units_word(&self) -> Option<UnitsMode> {
        self.last(|c| match c {
            Change::UnitsMode(u) => Some(*u),
            _ => None,
        })
    }

    pub fn distance_word(&self) -> Option<DistanceMode> {
        self.last(|c| match c {
            Change::DistanceMode(d) => Some(*d),
            _ => None,
        })
    }

    /// Effective motion mode: the block's, else the carried one.
    pub fn motion_mode(&self) -> MotionMode {
        self.motion_word().unwrap_or(self.carried.motion_mode)
    }

    pub fn plane(&self) -> Plane {
        self.plane_word().unwrap_or(self.carried.plane)
    }

    pub fn units_mode(&self) -> UnitsMode {
        self.units_word().unwrap_or(self.carried.units_mode)
    }

    pub fn distance_mode(&self) -> DistanceMode {
        self.distance_word().unwrap_or(self.carried.distance_mode)
    }

    /// The block's axis words. A repeated word keeps the last value.
    pub fn axis_words(&self) -> AxisWords {
        let mut words = AxisWords::default();
        for change in &self.changes {
            if let Change::Axis { axis, value } = *change {
                words.values[axis] = value;
                words.present |= AxisFlags::of(axis);
            }
        }
        words
    }

    /// IJK words and which of them are present.
    pub fn arc_offsets(&self) -> ([f64; 3], [bool; 3]) {
        let mut values = [0.0; 3];
        let mut present = [false; 3];
        for change in &self.changes {
            match *change {
                Change::ArcOffset { index, value } if index < 3 => {
                    values[index] = value;
                    present[index] = true;
                }
                _ => {}
            }
        }
        (values, present)
    }

    pub fn non_modals(&self) -> impl Iterator<Item = NonModal> + '_ {
        self.changes.iter().filter_map(|c| match c {
            Change::NonModal(n) => Some(*n),
            _ => None,
        })
    }

    pub fn has_non_modal(&self, command: NonModal) -> bool {
        self.non_modals().any(|n| n == command)
    }

    pub fn feed_rate(&self) -> Option<f64> {
        self.last(|c| match c {
            Change::FeedRate(f) => Some(*f),
            _ => None,
        })
    }

    fn last<T>(&self, pick: impl Fn(&Change) -> Option<T>) -> Option<T> {
        self.changes.iter().rev().find_map(pick)
    }
}
