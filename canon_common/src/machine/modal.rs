//! G-code modal enums (RS274/NGC modal groups).
//!
//! All persistent enums use `#[repr(u8)]` with the numeric values of the
//! firmware state bytes so they can be persisted or reported as integers.

use serde::{Deserialize, Serialize};

use super::axis::Axis;
use super::error::CanonError;

// ─── Next Action ────────────────────────────────────────────────────

/// What the current block executes. Unlike [`MotionMode`], this is not
/// sticky: it is recomputed for every block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum NextAction {
    #[default]
    None = 0,
    /// Motion selected by the motion mode.
    Motion = 1,
    /// G4
    Dwell = 2,
    /// G28
    ReturnToHome = 3,
    /// G30
    HomingCycle = 4,
}

// ─── Group 1: Motion ────────────────────────────────────────────────

/// Modal group 1 motion mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum MotionMode {
    /// G0 - seek
    #[default]
    StraightTraverse = 0,
    /// G1 - feed
    StraightFeed = 1,
    /// G2
    CwArc = 2,
    /// G3
    CcwArc = 3,
    /// G80
    CancelMotionMode = 4,
    /// G38.2
    StraightProbe = 5,
    /// G81 - drilling
    CannedCycle81 = 6,
    /// G82 - drilling with dwell
    CannedCycle82 = 7,
    /// G83 - peck drilling
    CannedCycle83 = 8,
    /// G84 - right hand tapping
    CannedCycle84 = 9,
    /// G85 - boring, no dwell, feed out
    CannedCycle85 = 10,
    /// G86 - boring, spindle stop, rapid out
    CannedCycle86 = 11,
    /// G87 - back boring
    CannedCycle87 = 12,
    /// G88 - boring, spindle stop, manual out
    CannedCycle88 = 13,
    /// G89 - boring, dwell, feed out
    CannedCycle89 = 14,
}

impl MotionMode {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::StraightTraverse),
            1 => Some(Self::StraightFeed),
            2 => Some(Self::CwArc),
            3 => Some(Self::CcwArc),
            4 => Some(Self::CancelMotionMode),
            5 => Some(Self::StraightProbe),
            6 => Some(Self::CannedCycle81),
            7 => Some(Self::CannedCycle82),
            8 => Some(Self::CannedCycle83),
            9 => Some(Self::CannedCycle84),
            10 => Some(Self::CannedCycle85),
            11 => Some(Self::CannedCycle86),
            12 => Some(Self::CannedCycle87),
            13 => Some(Self::CannedCycle88),
            14 => Some(Self::CannedCycle89),
            _ => None,
        }
    }

    pub const fn gcode(&self) -> &'static str {
        match self {
            Self::StraightTraverse => "G0",
            Self::StraightFeed => "G1",
            Self::CwArc => "G2",
            Self::CcwArc => "G3",
            Self::CancelMotionMode => "G80",
            Self::StraightProbe => "G38.2",
            Self::CannedCycle81 => "G81",
            Self::CannedCycle82 => "G82",
            Self::CannedCycle83 => "G83",
            Self::CannedCycle84 => "G84",
            Self::CannedCycle85 => "G85",
            Self::CannedCycle86 => "G86",
            Self::CannedCycle87 => "G87",
            Self::CannedCycle88 => "G88",
            Self::CannedCycle89 => "G89",
        }
    }

    #[inline]
    pub const fn is_arc(&self) -> bool {
        matches!(self, Self::CwArc | Self::CcwArc)
    }

    #[inline]
    pub const fn is_canned_cycle(&self) -> bool {
        (*self as u8) >= Self::CannedCycle81 as u8
    }

    /// Modes that move at the programmed feed rate.
    #[inline]
    pub const fn requires_feed_rate(&self) -> bool {
        !matches!(self, Self::StraightTraverse | Self::CancelMotionMode)
    }
}

/// Arc and spindle direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    Cw = 0,
    Ccw = 1,
}

// ─── Program Flow ───────────────────────────────────────────────────

/// Program flow as captured from M0/M1/M2. Tracked in the model only; it does
/// not drive the machine state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ProgramFlow {
    #[default]
    Running = 0,
    Paused = 1,
    Completed = 2,
}

// ─── Group 2: Plane ─────────────────────────────────────────────────

/// Canonical plane selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Plane {
    /// G17 - axes X Y, normal Z
    #[default]
    Xy = 0,
    /// G18 - axes X Z, normal Y
    Xz = 1,
    /// G19 - axes Y Z, normal X
    Yz = 2,
}

/// The two in-plane axes and the normal axis of a [`Plane`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneAxes {
    pub axis_0: Axis,
    pub axis_1: Axis,
    pub axis_2: Axis,
}

impl Plane {
    pub const fn axes(&self) -> PlaneAxes {
        match self {
            Self::Xy => PlaneAxes { axis_0: Axis::X, axis_1: Axis::Y, axis_2: Axis::Z },
            Self::Xz => PlaneAxes { axis_0: Axis::X, axis_1: Axis::Z, axis_2: Axis::Y },
            Self::Yz => PlaneAxes { axis_0: Axis::Y, axis_1: Axis::Z, axis_2: Axis::X },
        }
    }

    pub const fn gcode(&self) -> &'static str {
        match self {
            Self::Xy => "G17",
            Self::Xz => "G18",
            Self::Yz => "G19",
        }
    }
}

impl TryFrom<u8> for Plane {
    type Error = CanonError;

    fn try_from(value: u8) -> Result<Self, CanonError> {
        match value {
            0 => Ok(Self::Xy),
            1 => Ok(Self::Xz),
            2 => Ok(Self::Yz),
            other => Err(CanonError::InvalidPlane(other)),
        }
    }
}

// ─── Group 3: Distance Mode ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum DistanceMode {
    /// G90
    #[default]
    Absolute = 0,
    /// G91
    Incremental = 1,
}

impl DistanceMode {
    pub const fn gcode(&self) -> &'static str {
        match self {
            Self::Absolute => "G90",
            Self::Incremental => "G91",
        }
    }
}

// ─── Group 4: Stopping ──────────────────────────────────────────────

/// Program stop commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ProgramStop {
    /// M0
    Stop = 0,
    /// M1
    OptionalStop = 1,
    /// M2 / M30
    End = 2,
}

impl ProgramStop {
    pub const fn gcode(&self) -> &'static str {
        match self {
            Self::Stop => "M0",
            Self::OptionalStop => "M1",
            Self::End => "M2",
        }
    }
}

// ─── Group 6: Units ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum UnitsMode {
    /// G20
    Inches = 0,
    /// G21
    #[default]
    Millimeters = 1,
}

impl UnitsMode {
    pub const fn gcode(&self) -> &'static str {
        match self {
            Self::Inches => "G20",
            Self::Millimeters => "G21",
        }
    }
}

// ─── Group 7: Spindle ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SpindleMode {
    /// M5
    #[default]
    Off = 0,
    /// M3
    Cw = 1,
    /// M4
    Ccw = 2,
}

impl SpindleMode {
    pub const fn gcode(&self) -> &'static str {
        match self {
            Self::Off => "M5",
            Self::Cw => "M3",
            Self::Ccw => "M4",
        }
    }
}

// ─── Group 12: Coordinate System ────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum CoordSystem {
    /// Machine coordinate system.
    #[serde(rename = "absolute")]
    Absolute = 0,
    #[default]
    G54 = 1,
    G55 = 2,
    G56 = 3,
    G57 = 4,
    G58 = 5,
    G59 = 6,
}

impl CoordSystem {
    /// The six work coordinate systems, in offset-table order.
    pub const WORK: [CoordSystem; 6] = [
        Self::G54,
        Self::G55,
        Self::G56,
        Self::G57,
        Self::G58,
        Self::G59,
    ];

    /// Offset-table slot for G54..G59. `None` for the machine frame.
    #[inline]
    pub const fn table_index(&self) -> Option<usize> {
        match self {
            Self::Absolute => None,
            other => Some(*other as usize - 1),
        }
    }

    pub const fn gcode(&self) -> &'static str {
        match self {
            Self::Absolute => "G53",
            Self::G54 => "G54",
            Self::G55 => "G55",
            Self::G56 => "G56",
            Self::G57 => "G57",
            Self::G58 => "G58",
            Self::G59 => "G59",
        }
    }
}

impl TryFrom<u8> for CoordSystem {
    type Error = CanonError;

    fn try_from(value: u8) -> Result<Self, CanonError> {
        match value {
            0 => Ok(Self::Absolute),
            1 => Ok(Self::G54),
            2 => Ok(Self::G55),
            3 => Ok(Self::G56),
            4 => Ok(Self::G57),
            5 => Ok(Self::G58),
            6 => Ok(Self::G59),
            other => Err(CanonError::InvalidCoordSystem(other)),
        }
    }
}

// ─── Group 13: Path Control ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PathControl {
    /// G61
    ExactStop = 0,
    /// G61.1
    ExactPath = 1,
    /// G64
    #[default]
    Continuous = 2,
}

impl PathControl {
    pub const fn gcode(&self) -> &'static str {
        match self {
            Self::ExactStop => "G61",
            Self::ExactPath => "G61.1",
            Self::Continuous => "G64",
        }
    }
}

// ─── G92 Origin Offsets ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum OriginOffsetMode {
    /// G92 - set origin offsets
    Set = 0,
    /// G92.1 - zero out origin offsets
    #[default]
    Cancel = 1,
    /// G92.2 - keep the values but do not apply them
    Suspend = 2,
    /// G92.3 - apply the kept values again
    Resume = 3,
}

impl OriginOffsetMode {
    /// Origin offsets take part in the work frame unless suspended.
    #[inline]
    pub const fn is_applied(&self) -> bool {
        !matches!(self, Self::Suspend)
    }

    pub const fn gcode(&self) -> &'static str {
        match self {
            Self::Set => "G92",
            Self::Cancel => "G92.1",
            Self::Suspend => "G92.2",
            Self::Resume => "G92.3",
        }
    }
}

// ─── Group 0: Non-Modal ─────────────────────────────────────────────

/// Non-modal (single-shot) commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NonModal {
    /// G4
    Dwell,
    /// G10 L2 - write the offsets of the given work coordinate system
    SetCoordOffset(CoordSystem),
    /// G28
    ReturnToHome,
    /// G30
    HomingCycle,
    /// G53 - machine coordinates for this block only
    AbsoluteOverride,
    /// G92 family
    OriginOffset(OriginOffsetMode),
}

impl NonModal {
    pub const fn gcode(&self) -> &'static str {
        match self {
            Self::Dwell => "G4",
            Self::SetCoordOffset(_) => "G10",
            Self::ReturnToHome => "G28",
            Self::HomingCycle => "G30",
            Self::AbsoluteOverride => "G53",
            Self::OriginOffset(mode) => mode.gcode(),
        }
    }

    /// Commands that consume the block's axis words themselves.
    #[inline]
    pub const fn uses_axis_words(&self) -> bool {
        matches!(
            self,
            Self::SetCoordOffset(_) | Self::ReturnToHome | Self::OriginOffset(OriginOffsetMode::Set)
        )
    }
}

// ─── Modal Groups ───────────────────────────────────────────────────

/// RS274/NGC modal groups used for multiple-command violation checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ModalGroup {
    /// Words outside any group (F, S, T, P, R, axis words...).
    None = 0,
    /// [G4,G10,G28,G30,G53,G92,G92.1,G92.2,G92.3] Non-modal
    NonModal = 1,
    /// [G0,G1,G2,G3,G38.2,G80..G89] Motion
    Motion = 2,
    /// [G17,G18,G19] Plane selection
    Plane = 3,
    /// [G90,G91] Distance mode
    Distance = 4,
    /// [M0,M1,M2,M30] Stopping
    Stopping = 5,
    /// [G93,G94] Feed rate mode
    FeedRateMode = 6,
    /// [G20,G21] Units
    Units = 7,
    /// [M3,M4,M5] Spindle turning
    Spindle = 8,
    /// [G54..G59] Coordinate system selection
    CoordSystem = 9,
    /// [G61,G61.1,G64] Path control
    PathControl = 10,
}

impl ModalGroup {
    /// Number of distinct groups, including `None`.
    pub const COUNT: usize = 11;

    /// RS274/NGC group number. `None` has no number.
    pub const fn number(&self) -> Option<u8> {
        match self {
            Self::None => None,
            Self::NonModal => Some(0),
            Self::Motion => Some(1),
            Self::Plane => Some(2),
            Self::Distance => Some(3),
            Self::Stopping => Some(4),
            Self::FeedRateMode => Some(5),
            Self::Units => Some(6),
            Self::Spindle => Some(7),
            Self::CoordSystem => Some(12),
            Self::PathControl => Some(13),
        }
    }
}
