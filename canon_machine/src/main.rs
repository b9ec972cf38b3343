//! # Canonical Machine diagnostic binary
//!
//! Loads a machine configuration, builds the [`CanonicalMachine`] with its
//! executor link, and prints the power-on status snapshot as JSON.
//!
//! Supports two configuration modes:
//! - **Directory** (`--config-dir`): loads `<dir>/machine.toml`.
//! - **File** (positional arg): loads a single machine TOML.

use clap::Parser;
use canon_common::config::LogLevel;
use canon_common::consts::DEFAULT_CONFIG_PATH;
use canon_common::machine::config::MachineConfig;
use canon_machine::CanonicalMachine;
use canon_machine::config::{load_config, load_config_dir};
use canon_machine::link;
use std::path::PathBuf;
use std::process;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// Canonical Machine: RS274/NGC modal model and machine state
#[derive(Parser, Debug)]
#[command(name = "canon_machine")]
#[command(version)]
#[command(about = "Load a machine configuration and report the canonical machine status")]
struct Args {
    /// Path to the config directory containing machine.toml.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_CONFIG_PATH)]
    config_dir: PathBuf,

    /// Path to a single machine TOML. Overrides --config-dir.
    config: Option<PathBuf>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    let loaded = match args.config {
        Some(ref path) => load_config(path),
        None => load_config_dir(&args.config_dir),
    };

    let log_level = loaded
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);

    info!("Canonical Machine v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            let source = args.config.as_ref().unwrap_or(&args.config_dir);
            error!("FATAL: {} ({})", e, source.display());
            process::exit(1);
        }
    };

    if let Err(e) = run(&config) {
        error!("FATAL: {e}");
        process::exit(1);
    }
}

fn run(config: &MachineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (canonical_link, executor_link) = link::channel();
    let mut machine = CanonicalMachine::new(config, canonical_link);
    info!("Machine '{}' initialized", config.shared.service_name);

    machine.tick();
    for request in executor_link.drain() {
        info!("Pending executor request: {request:?}");
    }

    println!("{}", serde_json::to_string_pretty(&machine.status())?);
    Ok(())
}

/// Setup tracing subscriber from the configured level and CLI arguments.
fn setup_tracing(args: &Args, log_level: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        log_level.into()
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
