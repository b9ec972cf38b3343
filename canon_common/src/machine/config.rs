//! Canonical machine configuration structures.
//!
//! These mirror the persisted configuration store: power-on G-code
//! defaults, per-axis settings, the G54..G59 offset tables, and machine-wide
//! options. Loading lives in `canon_machine::config`; this module only
//! defines the shapes and their semantic validation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::axis::{Axis, AxisMode, AxisVector};
use super::modal::{CoordSystem, DistanceMode, PathControl, Plane, UnitsMode};
use crate::config::{ConfigError, SharedConfig, Validate};
use crate::consts::{AXES, DEFAULT_MAX_TOOL, DEFAULT_STATUS_INTERVAL_TICKS};

// ─── Power-on Defaults ──────────────────────────────────────────────

/// Power-on / program-end G-code defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GCodeDefaults {
    #[serde(default)]
    pub units_mode: UnitsMode,
    #[serde(default)]
    pub plane: Plane,
    #[serde(default)]
    pub coord_system: CoordSystem,
    #[serde(default)]
    pub distance_mode: DistanceMode,
    #[serde(default)]
    pub path_control: PathControl,
    #[serde(default)]
    pub inverse_feed_rate_mode: bool,
}

impl Default for GCodeDefaults {
    fn default() -> Self {
        Self {
            units_mode: UnitsMode::Millimeters,
            plane: Plane::Xy,
            coord_system: CoordSystem::G54,
            distance_mode: DistanceMode::Absolute,
            path_control: PathControl::Continuous,
            inverse_feed_rate_mode: false,
        }
    }
}

// ─── Axis Settings ──────────────────────────────────────────────────

/// Per-axis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisConfig {
    pub axis: Axis,
    #[serde(default)]
    pub mode: AxisMode,
    /// Radius [mm] for radius and slaved rotary modes.
    #[serde(default)]
    pub radius: f64,
    /// G28 stored reference position, machine frame.
    #[serde(default)]
    pub reference_position: f64,
    #[serde(default = "default_true")]
    pub homing_enabled: bool,
    /// Machine coordinate assigned when the home switch is found.
    #[serde(default)]
    pub home_position: f64,
    /// Homing search velocity [mm/min or deg/min].
    #[serde(default = "default_search_velocity")]
    pub search_velocity: f64,
    /// Homing latch velocity [mm/min or deg/min].
    #[serde(default = "default_latch_velocity")]
    pub latch_velocity: f64,
}

fn default_true() -> bool {
    true
}

fn default_search_velocity() -> f64 {
    500.0
}

fn default_latch_velocity() -> f64 {
    50.0
}

impl AxisConfig {
    /// Standard coordinated axis with default homing parameters.
    pub fn standard(axis: Axis) -> Self {
        Self {
            axis,
            mode: AxisMode::Standard,
            radius: 0.0,
            reference_position: 0.0,
            homing_enabled: true,
            home_position: 0.0,
            search_velocity: default_search_velocity(),
            latch_velocity: default_latch_velocity(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let name = self.axis.letter();
        if self.axis.is_linear() && self.mode.is_rotary_only() {
            return Err(ConfigError::ValidationError(format!(
                "axis {name}: mode {:?} is only valid on rotary axes",
                self.mode
            )));
        }
        if self.mode.is_rotary_only() && !(self.radius > 0.0 && self.radius.is_finite()) {
            return Err(ConfigError::ValidationError(format!(
                "axis {name}: radius must be > 0 for mode {:?}, got {}",
                self.mode, self.radius
            )));
        }
        for (field, value) in [
            ("reference_position", self.reference_position),
            ("home_position", self.home_position),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::ValidationError(format!(
                    "axis {name}: {field} must be finite"
                )));
            }
        }
        if self.homing_enabled {
            for (field, value) in [
                ("search_velocity", self.search_velocity),
                ("latch_velocity", self.latch_velocity),
            ] {
                if !(value > 0.0 && value.is_finite()) {
                    return Err(ConfigError::ValidationError(format!(
                        "axis {name}: {field} must be > 0, got {value}"
                    )));
                }
            }
        }
        Ok(())
    }
}

// ─── Coordinate Offsets ─────────────────────────────────────────────

/// Persisted G54..G59 offset tables, machine frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoordOffsetTable {
    #[serde(default)]
    pub g54: AxisVector,
    #[serde(default)]
    pub g55: AxisVector,
    #[serde(default)]
    pub g56: AxisVector,
    #[serde(default)]
    pub g57: AxisVector,
    #[serde(default)]
    pub g58: AxisVector,
    #[serde(default)]
    pub g59: AxisVector,
}

impl CoordOffsetTable {
    /// Offsets of a coordinate system. The machine frame has none.
    pub fn get(&self, coord_system: CoordSystem) -> AxisVector {
        match coord_system {
            CoordSystem::Absolute => AxisVector::ZERO,
            CoordSystem::G54 => self.g54,
            CoordSystem::G55 => self.g55,
            CoordSystem::G56 => self.g56,
            CoordSystem::G57 => self.g57,
            CoordSystem::G58 => self.g58,
            CoordSystem::G59 => self.g59,
        }
    }

    /// Replace a work coordinate system's offsets. Writes to the machine
    /// frame are ignored and return `false`.
    pub fn set(&mut self, coord_system: CoordSystem, offsets: AxisVector) -> bool {
        let slot = match coord_system {
            CoordSystem::Absolute => return false,
            CoordSystem::G54 => &mut self.g54,
            CoordSystem::G55 => &mut self.g55,
            CoordSystem::G56 => &mut self.g56,
            CoordSystem::G57 => &mut self.g57,
            CoordSystem::G58 => &mut self.g58,
            CoordSystem::G59 => &mut self.g59,
        };
        *slot = offsets;
        true
    }
}

// ─── Machine Options ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineSettings {
    /// Order in which axes are homed by the homing cycle.
    #[serde(default = "default_homing_order")]
    pub homing_order: Vec<Axis>,
    /// Honour M1 optional stops.
    #[serde(default = "default_true")]
    pub optional_stop_enabled: bool,
    /// Scheduler ticks between status reports.
    #[serde(default = "default_status_interval")]
    pub status_interval_ticks: u32,
    /// Highest valid tool number.
    #[serde(default = "default_max_tool")]
    pub max_tool: u8,
}

fn default_homing_order() -> Vec<Axis> {
    vec![Axis::Z, Axis::X, Axis::Y, Axis::A, Axis::B, Axis::C]
}

fn default_status_interval() -> u32 {
    DEFAULT_STATUS_INTERVAL_TICKS
}

fn default_max_tool() -> u8 {
    DEFAULT_MAX_TOOL
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            homing_order: default_homing_order(),
            optional_stop_enabled: true,
            status_interval_ticks: DEFAULT_STATUS_INTERVAL_TICKS,
            max_tool: DEFAULT_MAX_TOOL,
        }
    }
}

// ─── Top-level ──────────────────────────────────────────────────────

/// Complete canonical machine configuration (`machine.toml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub defaults: GCodeDefaults,
    #[serde(default)]
    pub machine: MachineSettings,
    #[serde(default = "default_axes")]
    pub axes: Vec<AxisConfig>,
    #[serde(default)]
    pub offsets: CoordOffsetTable,
}

fn default_axes() -> Vec<AxisConfig> {
    Axis::ALL.iter().copied().map(AxisConfig::standard).collect()
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            defaults: GCodeDefaults::default(),
            machine: MachineSettings::default(),
            axes: default_axes(),
            offsets: CoordOffsetTable::default(),
        }
    }
}

impl MachineConfig {
    pub fn axis(&self, axis: Axis) -> Option<&AxisConfig> {
        self.axes.iter().find(|a| a.axis == axis)
    }

    /// Axis settings in vector order. Axes missing from the file fall back
    /// to [`AxisConfig::standard`]; validation rejects that case.
    pub fn axis_table(&self) -> [AxisConfig; AXES] {
        Axis::ALL.map(|axis| {
            self.axis(axis)
                .cloned()
                .unwrap_or_else(|| AxisConfig::standard(axis))
        })
    }

    /// G28 reference position vector.
    pub fn reference_position(&self) -> AxisVector {
        AxisVector(self.axis_table().map(|a| a.reference_position))
    }
}

impl Validate for MachineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        let mut seen = HashSet::new();
        for axis in &self.axes {
            if !seen.insert(axis.axis) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate axis {}",
                    axis.axis.letter()
                )));
            }
            axis.validate()?;
        }
        if seen.len() != AXES {
            let missing: String = Axis::ALL
                .iter()
                .filter(|a| !seen.contains(*a))
                .map(|a| a.letter())
                .collect();
            return Err(ConfigError::ValidationError(format!(
                "missing axis configuration for {missing}"
            )));
        }

        let mut order = HashSet::new();
        for axis in &self.machine.homing_order {
            if !order.insert(*axis) {
                return Err(ConfigError::ValidationError(format!(
                    "axis {} listed twice in homing_order",
                    axis.letter()
                )));
            }
        }

        if self.machine.status_interval_ticks == 0 {
            return Err(ConfigError::ValidationError(
                "status_interval_ticks must be > 0".to_string(),
            ));
        }

        for cs in CoordSystem::WORK {
            if self.offsets.get(cs).as_array().iter().any(|v| !v.is_finite()) {
                return Err(ConfigError::ValidationError(format!(
                    "{} offsets must be finite",
                    cs.gcode()
                )));
            }
        }
        Ok(())
    }
}
