//! State machine module root.
//!
//! The top-level machine state and its two sub-state machines. Each is a
//! total transition function over its state enum, driven by events.

pub mod feedhold;
pub mod homing;
pub mod machine;

pub use feedhold::{FeedholdEvent, FeedholdStateMachine, FeedholdTransition};
pub use homing::{HomingCycle, HomingPhase, HomingStep, ReturnHome};
pub use machine::{MachineEvent, MachineStateMachine, TransitionResult};
