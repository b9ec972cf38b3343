//! Axis identifiers, axis vectors, per-block axis flags and axis modes.

use std::ops::{Index, IndexMut};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;

use crate::consts::{AXES, LINEAR_AXES};

// ─── Axis Identifier ────────────────────────────────────────────────

/// One of the six canonical axes. The discriminant is the vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
    A = 3,
    B = 4,
    C = 5,
}

const_assert_eq!(Axis::C as usize + 1, AXES);

impl Axis {
    /// All axes in vector order.
    pub const ALL: [Axis; AXES] = [Axis::X, Axis::Y, Axis::Z, Axis::A, Axis::B, Axis::C];

    /// Linear axes only.
    pub const LINEAR: [Axis; LINEAR_AXES] = [Axis::X, Axis::Y, Axis::Z];

    /// Index into a 6-element axis vector.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// G-code word letter.
    pub const fn letter(self) -> char {
        match self {
            Self::X => 'X',
            Self::Y => 'Y',
            Self::Z => 'Z',
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
        }
    }

    /// X, Y and Z are linear (unit-converted); A, B and C are rotary (degrees).
    #[inline]
    pub const fn is_linear(self) -> bool {
        (self as usize) < LINEAR_AXES
    }
}

// ─── Axis Vector ────────────────────────────────────────────────────

/// XYZABC vector. Linear axes in millimeters, rotary axes in degrees,
/// unless a function documents otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisVector(pub [f64; AXES]);

impl AxisVector {
    pub const ZERO: Self = Self([0.0; AXES]);

    pub const fn new(x: f64, y: f64, z: f64, a: f64, b: f64, c: f64) -> Self {
        Self([x, y, z, a, b, c])
    }

    #[inline]
    pub const fn as_array(&self) -> &[f64; AXES] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Axis, f64)> + '_ {
        Axis::ALL.iter().map(move |&axis| (axis, self.0[axis.index()]))
    }
}

impl Index<Axis> for AxisVector {
    type Output = f64;

    #[inline]
    fn index(&self, axis: Axis) -> &f64 {
        &self.0[axis.index()]
    }
}

impl IndexMut<Axis> for AxisVector {
    #[inline]
    fn index_mut(&mut self, axis: Axis) -> &mut f64 {
        &mut self.0[axis.index()]
    }
}

impl From<[f64; AXES]> for AxisVector {
    fn from(values: [f64; AXES]) -> Self {
        Self(values)
    }
}

// ─── Axis Flags ─────────────────────────────────────────────────────

bitflags! {
    /// Axes present in a block (the per-axis "changed" flags).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AxisFlags: u8 {
        const X = 0x01;
        const Y = 0x02;
        const Z = 0x04;
        const A = 0x08;
        const B = 0x10;
        const C = 0x20;
        const LINEAR = Self::X.bits() | Self::Y.bits() | Self::Z.bits();
    }
}

impl AxisFlags {
    #[inline]
    pub const fn of(axis: Axis) -> Self {
        Self::from_bits_truncate(1 << axis as u8)
    }

    #[inline]
    pub const fn has(&self, axis: Axis) -> bool {
        self.contains(Self::of(axis))
    }
}

// ─── Axis Mode ──────────────────────────────────────────────────────

/// How an axis participates in coordinated motion.
///
/// The declaration order is a scale from "no motion contribution" to
/// "full slaved contribution" and is relied on by [`AxisMode::is_rotary_only`]
/// and [`AxisMode::is_slaved`]. New variants must keep that order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum AxisMode {
    /// Axis ignored.
    Disabled = 0,
    /// Coordinated motion, standard behaviour.
    #[default]
    Standard = 1,
    /// Computed but not activated.
    Inhibited = 2,
    /// Rotary axis driven by a linear value through its radius.
    Radius = 3,
    /// Rotary axis slaved to X travel.
    SlaveX = 4,
    /// Rotary axis slaved to Y travel.
    SlaveY = 5,
    /// Rotary axis slaved to Z travel.
    SlaveZ = 6,
    /// Rotary axis slaved to XY path length.
    SlaveXy = 7,
    /// Rotary axis slaved to XZ path length.
    SlaveXz = 8,
    /// Rotary axis slaved to YZ path length.
    SlaveYz = 9,
    /// Rotary axis slaved to XYZ path length.
    SlaveXyz = 10,
}

impl AxisMode {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Disabled),
            1 => Some(Self::Standard),
            2 => Some(Self::Inhibited),
            3 => Some(Self::Radius),
            4 => Some(Self::SlaveX),
            5 => Some(Self::SlaveY),
            6 => Some(Self::SlaveZ),
            7 => Some(Self::SlaveXy),
            8 => Some(Self::SlaveXz),
            9 => Some(Self::SlaveYz),
            10 => Some(Self::SlaveXyz),
            _ => None,
        }
    }

    /// Axis value is taken from the block as-is (after unit/offset handling).
    #[inline]
    pub fn is_pass_through(&self) -> bool {
        matches!(self, Self::Standard | Self::Inhibited)
    }

    /// Modes that only make sense on a rotary axis.
    #[inline]
    pub fn is_rotary_only(&self) -> bool {
        *self >= Self::Radius
    }

    /// Axis position is derived from linear travel.
    #[inline]
    pub fn is_slaved(&self) -> bool {
        *self >= Self::SlaveX
    }

    /// Linear axes whose travel drives a slaved axis. Empty for other modes.
    pub const fn slave_sources(&self) -> AxisFlags {
        match self {
            Self::SlaveX => AxisFlags::X,
            Self::SlaveY => AxisFlags::Y,
            Self::SlaveZ => AxisFlags::Z,
            Self::SlaveXy => AxisFlags::X.union(AxisFlags::Y),
            Self::SlaveXz => AxisFlags::X.union(AxisFlags::Z),
            Self::SlaveYz => AxisFlags::Y.union(AxisFlags::Z),
            Self::SlaveXyz => AxisFlags::LINEAR,
            _ => AxisFlags::empty(),
        }
    }
}
