//! System-wide constants for the canonical machine workspace.
//!
//! Single source of truth for axis counts, unit factors and default paths.

/// Number of axes in the canonical model (X Y Z A B C).
pub const AXES: usize = 6;

/// Number of linear axes (X Y Z). Rotary axes follow them.
pub const LINEAR_AXES: usize = 3;

/// Number of selectable work coordinate systems (G54..G59).
pub const COORD_SYSTEMS: usize = 6;

/// Millimeters per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Flag threshold for floating-point comparisons.
pub const EPSILON: f64 = 1e-6;

/// Maximum number of recorded words in a single block.
pub const MAX_BLOCK_CHANGES: usize = 32;

/// Default number of scheduler ticks between status reports.
pub const DEFAULT_STATUS_INTERVAL_TICKS: u32 = 50;

/// Default highest tool number in the tool table.
pub const DEFAULT_MAX_TOOL: u8 = 24;

/// Default configuration directory path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/canon/config";

/// Machine configuration file name inside a config directory.
pub const MACHINE_CONFIG_FILE: &str = "machine.toml";
