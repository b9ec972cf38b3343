//! Machine and sub-state machine enums.
//!
//! `#[repr(u8)]` values match the canonical machine state bytes so status
//! reporters and persisted settings can keep using the numeric forms.

use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;

// ─── Machine State ──────────────────────────────────────────────────

/// Top-level canonical machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum MachineState {
    /// Reset or aborted. Initial state.
    #[default]
    Reset = 0,
    /// Executing queued blocks.
    Run = 1,
    /// Program stop or no more blocks.
    Stop = 2,
    /// Feedhold in progress or held.
    Hold = 3,
    /// Transitional state leaving a feedhold.
    EndHold = 4,
    /// Homing or return-to-home cycle.
    Homing = 5,
}

impl MachineState {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Reset),
            1 => Some(Self::Run),
            2 => Some(Self::Stop),
            3 => Some(Self::Hold),
            4 => Some(Self::EndHold),
            5 => Some(Self::Homing),
            _ => None,
        }
    }

    /// Status string used by status reports.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::Run => "run",
            Self::Stop => "stop",
            Self::Hold => "hold",
            Self::EndHold => "end_hold",
            Self::Homing => "homing",
        }
    }
}

// ─── Feedhold State ─────────────────────────────────────────────────

/// Feedhold sub-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum FeedholdState {
    /// No feedhold in effect.
    #[default]
    Off = 0,
    /// Waiting for the streaming segment to reach a decision point.
    Sync = 1,
    /// Planner replanning queued blocks for the stop.
    Plan = 2,
    /// Executor decelerating to the hold point.
    Decel = 3,
    /// Stopped and resumable.
    Hold = 4,
}

impl FeedholdState {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Off),
            1 => Some(Self::Sync),
            2 => Some(Self::Plan),
            3 => Some(Self::Decel),
            4 => Some(Self::Hold),
            _ => None,
        }
    }

    /// Hold requested but motion not yet stopped.
    #[inline]
    pub const fn is_stopping(&self) -> bool {
        matches!(self, Self::Sync | Self::Plan | Self::Decel)
    }
}

// ─── Homing State ───────────────────────────────────────────────────

/// Homing state. Doubles as the persisted "homed" flag.
///
/// `NotHomed` and `Homed` are persisted as 0 and 1 and must keep those values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum HomingState {
    #[default]
    NotHomed = 0,
    Homed = 1,
    /// Transient: a homing cycle is running. Never persisted.
    InCycle = 2,
}

const_assert_eq!(HomingState::NotHomed as u8, 0);
const_assert_eq!(HomingState::Homed as u8, 1);

impl HomingState {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::NotHomed),
            1 => Some(Self::Homed),
            2 => Some(Self::InCycle),
            _ => None,
        }
    }

    /// Value to persist, or `None` for the transient in-cycle state.
    #[inline]
    pub const fn persisted_value(&self) -> Option<u8> {
        match self {
            Self::NotHomed | Self::Homed => Some(*self as u8),
            Self::InCycle => None,
        }
    }
}
