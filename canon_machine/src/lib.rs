//! # Canonical Machine
//!
//! The canonical-machine layer of a CNC motion controller. Holds the
//! normalized (millimeter, machine-frame) model of everything a G-code
//! program can command and runs the top-level machine state machine with its
//! feedhold and homing sub-state machines.
//!
//! ## Layers
//!
//! 1. **transform**: units, coordinate systems, origin offsets, axis modes
//! 2. **model**: active modal state, per-block change sets, merge, modal group checks
//! 3. **state**: machine, feedhold and homing state machines
//! 4. **canonical**: the process-scoped [`CanonicalMachine`] context
//!
//! ## Executor Boundary
//!
//! The layer never moves axes. Accepted motion and hold/resume requests are
//! sent over [`link`] to the motion executor, which answers with completion
//! events drained by [`CanonicalMachine::tick`]. Nothing here blocks.

pub mod canonical;
pub mod config;
pub mod link;
pub mod model;
pub mod state;
pub mod status;
pub mod transform;

pub use canonical::{CanonicalMachine, SettingsChange};
