//! Machine configuration loading with validation.
//!
//! Parses `machine.toml` into [`MachineConfig`] and runs its semantic checks
//! (axis table completeness, rotary-only modes, radius, homing order,
//! status interval) so a bad file is refused before a [`CanonicalMachine`]
//! is ever built from it.
//!
//! [`CanonicalMachine`]: crate::CanonicalMachine

use std::path::Path;

use canon_common::config::{ConfigError, ConfigLoader, Validate};
use canon_common::consts::MACHINE_CONFIG_FILE;
use canon_common::machine::config::MachineConfig;
use tracing::{debug, info};

// ─── Loading Functions ──────────────────────────────────────────────

/// Load and validate a single machine configuration file.
pub fn load_config(path: &Path) -> Result<MachineConfig, ConfigError> {
    debug!("Loading machine config from {}", path.display());
    let config = MachineConfig::load_validated(path)?;
    info!(
        "Machine config OK: service={}, homing_order={}",
        config.shared.service_name,
        config
            .machine
            .homing_order
            .iter()
            .map(|a| a.letter())
            .collect::<String>()
    );
    Ok(config)
}

/// Load `<dir>/machine.toml`.
pub fn load_config_dir(dir: &Path) -> Result<MachineConfig, ConfigError> {
    if !dir.is_dir() {
        return Err(ConfigError::FileNotFound);
    }
    load_config(&dir.join(MACHINE_CONFIG_FILE))
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<MachineConfig, ConfigError> {
    let config = MachineConfig::parse(content)?;
    config.validate()?;
    Ok(config)
}
