//! Coordinate and units transform.
//!
//! Pure functions between the block's declared frame (units, distance mode,
//! work coordinate system, G92 origin offsets) and the canonical machine
//! frame in millimeters. Nothing here touches machine state.
//!
//! ```text
//! work = machine - coord_offset - origin_offset   (origin only unless G92.2)
//! ```

use std::f64::consts::PI;

use canon_common::consts::{AXES, EPSILON, MM_PER_INCH};
use canon_common::prelude::*;

// ─── Units ──────────────────────────────────────────────────────────

/// Convert a linear value in `units` to millimeters.
#[inline]
pub fn to_millimeters(value: f64, units: UnitsMode) -> f64 {
    match units {
        UnitsMode::Inches => value * MM_PER_INCH,
        UnitsMode::Millimeters => value,
    }
}

/// Convert a linear value in millimeters to `units`.
#[inline]
pub fn from_millimeters(value: f64, units: UnitsMode) -> f64 {
    match units {
        UnitsMode::Inches => value / MM_PER_INCH,
        UnitsMode::Millimeters => value,
    }
}

/// Block value of `axis` in canonical units: linear axes to mm, rotary
/// axes stay in degrees.
#[inline]
pub fn axis_to_canonical(axis: Axis, value: f64, units: UnitsMode) -> f64 {
    if axis.is_linear() {
        to_millimeters(value, units)
    } else {
        value
    }
}

/// Canonical value of `axis` in display units.
#[inline]
pub fn axis_to_display(axis: Axis, value: f64, units: UnitsMode) -> f64 {
    if axis.is_linear() {
        from_millimeters(value, units)
    } else {
        value
    }
}

/// Degrees of rotation produced by `travel` mm on a cylinder of `radius` mm.
#[inline]
pub fn travel_to_degrees(travel: f64, radius: f64) -> f64 {
    travel * 360.0 / (2.0 * PI * radius)
}

// ─── Frame ──────────────────────────────────────────────────────────

/// Offsets in force for one block.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    /// Offsets of the selected coordinate system (zero for G53 / absolute).
    pub coord_offset: AxisVector,
    /// G92 origin offsets.
    pub origin_offset: AxisVector,
    /// Origin offsets participate (not suspended by G92.2).
    pub origin_applied: bool,
    /// G53 in effect for this block: both offsets bypassed.
    pub absolute_override: bool,
}

impl Frame {
    /// Machine frame, no offsets.
    pub const MACHINE: Self = Self {
        coord_offset: AxisVector::ZERO,
        origin_offset: AxisVector::ZERO,
        origin_applied: false,
        absolute_override: false,
    };

    /// Total offset between work and machine coordinates for `axis`.
    #[inline]
    pub fn offset(&self, axis: Axis) -> f64 {
        if self.absolute_override {
            return 0.0;
        }
        let origin = if self.origin_applied {
            self.origin_offset[axis]
        } else {
            0.0
        };
        self.coord_offset[axis] + origin
    }

    /// The same offsets without the single-block G53 override, i.e. what the
    /// operator sees as the work frame.
    #[inline]
    pub fn standing(&self) -> Self {
        Self {
            absolute_override: false,
            ..*self
        }
    }

    pub fn work_from_machine(&self, machine: &AxisVector) -> AxisVector {
        let mut work = *machine;
        for axis in Axis::ALL {
            work[axis] -= self.offset(axis);
        }
        work
    }
}

// ─── Target Resolution ──────────────────────────────────────────────

/// Axis words of one block, in the block's declared units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisWords {
    pub values: AxisVector,
    pub present: AxisFlags,
}

impl AxisWords {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }
}

/// Resolve a block's axis words to a machine-frame millimeter target.
///
/// Axes not present in the block keep `position`. Slaved rotary axes are
/// derived from the travel of their source axes and may not be programmed
/// directly. Disabled axes never move.
pub fn resolve_target(
    words: &AxisWords,
    distance: DistanceMode,
    units: UnitsMode,
    frame: &Frame,
    axes: &[AxisConfig; AXES],
    position: &AxisVector,
) -> Result<AxisVector, CanonError> {
    let mut target = *position;

    for axis in Axis::ALL {
        let config = &axes[axis.index()];
        let mode = config.mode;
        if axis.is_linear() && mode.is_rotary_only() {
            return Err(CanonError::UnsupportedAxisMode { axis, mode });
        }
        if !words.present.has(axis) || mode == AxisMode::Disabled {
            continue;
        }

        let value = match mode {
            mode if mode.is_pass_through() => {
                axis_to_canonical(axis, words.values[axis], units)
            }
            AxisMode::Radius => {
                if config.radius <= EPSILON {
                    return Err(CanonError::UnsupportedAxisMode { axis, mode });
                }
                travel_to_degrees(to_millimeters(words.values[axis], units), config.radius)
            }
            // Slaved axes follow their sources.
            _ => return Err(CanonError::UnsupportedAxisMode { axis, mode }),
        };

        target[axis] = match distance {
            DistanceMode::Incremental => position[axis] + value,
            DistanceMode::Absolute => value + frame.offset(axis),
        };
    }

    for axis in [Axis::A, Axis::B, Axis::C] {
        let config = &axes[axis.index()];
        if !config.mode.is_slaved() {
            continue;
        }
        if config.radius <= EPSILON {
            return Err(CanonError::UnsupportedAxisMode {
                axis,
                mode: config.mode,
            });
        }
        let sources = config.mode.slave_sources();
        let moved: Vec<f64> = Axis::LINEAR
            .iter()
            .filter(|a| sources.has(**a))
            .map(|a| target[*a] - position[*a])
            .collect();
        let travel = match moved.as_slice() {
            [single] => *single,
            many => many.iter().map(|d| d * d).sum::<f64>().sqrt(),
        };
        if travel.abs() > EPSILON {
            target[axis] = position[axis] + travel_to_degrees(travel, config.radius);
        }
    }

    Ok(target)
}
