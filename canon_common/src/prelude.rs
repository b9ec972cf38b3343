//! Prelude module for common re-exports.
//!
//! ```rust
//! use canon_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig, Validate};
pub use crate::machine::config::{
    AxisConfig, CoordOffsetTable, GCodeDefaults, MachineConfig, MachineSettings,
};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{AXES, LINEAR_AXES, MM_PER_INCH};

// ─── Axes ───────────────────────────────────────────────────────────
pub use crate::machine::axis::{Axis, AxisFlags, AxisMode, AxisVector};

// ─── Modal State ────────────────────────────────────────────────────
pub use crate::machine::modal::{
    CoordSystem, Direction, DistanceMode, ModalGroup, MotionMode, NextAction, NonModal,
    OriginOffsetMode, PathControl, Plane, PlaneAxes, ProgramFlow, ProgramStop, SpindleMode,
    UnitsMode,
};

// ─── Machine State ──────────────────────────────────────────────────
pub use crate::machine::error::CanonError;
pub use crate::machine::state::{FeedholdState, HomingState, MachineState};
