//! Canonical machine error type.
//!
//! Every variant is a local, recoverable rejection of one block or command.
//! A rejected block never leaves the active model partially updated.

use thiserror::Error;

use super::axis::{Axis, AxisMode};
use super::modal::{ModalGroup, MotionMode};
use super::state::MachineState;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CanonError {
    /// Two distinct commands from one modal group in the same block.
    #[error(
        "modal group {} ({group:?}) violation: {first} and {second} in the same block",
        .group.number().unwrap_or_default()
    )]
    ModalGroupViolation {
        group: ModalGroup,
        first: &'static str,
        second: &'static str,
    },

    /// Plane selection outside {XY, XZ, YZ}.
    #[error("invalid plane selection: {0}")]
    InvalidPlane(u8),

    /// Axis mode not usable on this axis.
    #[error("axis {axis:?} does not support mode {mode:?}")]
    UnsupportedAxisMode { axis: Axis, mode: AxisMode },

    /// Command needs a homed machine.
    #[error("machine is not homed")]
    NotHomed,

    /// Command not accepted in the current machine state.
    #[error("{operation} not allowed in machine state {state:?}")]
    IllegalStateTransition {
        state: MachineState,
        operation: &'static str,
    },

    #[error("invalid coordinate system: {0}")]
    InvalidCoordSystem(u8),

    #[error("invalid axis index: {0}")]
    InvalidAxis(usize),

    /// Out-of-range or non-finite numeric argument.
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: f64 },

    /// A word the command needs is missing from the block.
    #[error("missing {0} word")]
    MissingWord(char),

    #[error("block has too many words")]
    BlockTooLarge,

    /// Feed motion with no usable feed rate.
    #[error("feed rate not set")]
    MissingFeedRate,

    /// Arc with neither a radius nor in-plane center offsets.
    #[error("arc needs a radius or center offsets in the selected plane")]
    ArcSpecification,

    #[error("motion mode {} is not supported", .0.gcode())]
    UnsupportedMotionMode(MotionMode),
}
