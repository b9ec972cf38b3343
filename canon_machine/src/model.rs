//! Modal state model: the active model, per-block change sets, the modal
//! group checker and the staged merge.

pub mod block;
pub mod gcode;
pub mod merge;
pub mod modal_group;

pub use block::{Block, Change};
pub use gcode::{GCodeState, SettingsChange};
pub use merge::{MergeEnv, StagedAction, StagedBlock, stage_block};
pub use modal_group::check_block;
