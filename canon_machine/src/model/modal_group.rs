//! Modal group conflict check.
//!
//! Runs once per block before anything is staged. Two distinct commands of
//! one modal group in the same block reject the whole block. Group 0
//! (non-modal) commands conflict only with non-modals of the same kind, or
//! with another non-modal that also consumes the block's axis words.

use canon_common::prelude::*;

use crate::model::block::{Block, Change};

/// Non-modal sub-kinds. Commands of one kind exclude each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NonModalKind {
    /// G4, G28, G30: each selects the block's action.
    Action,
    /// G10
    CoordOffset,
    /// G53
    Override,
    /// G92 family
    Origin,
}

fn kind(command: NonModal) -> NonModalKind {
    match command {
        NonModal::Dwell | NonModal::ReturnToHome | NonModal::HomingCycle => NonModalKind::Action,
        NonModal::SetCoordOffset(_) => NonModalKind::CoordOffset,
        NonModal::AbsoluteOverride => NonModalKind::Override,
        NonModal::OriginOffset(_) => NonModalKind::Origin,
    }
}

/// Validate a block against the RS274/NGC modal group rules.
///
/// Repeating the same command is not a conflict.
pub fn check_block(block: &Block) -> Result<(), CanonError> {
    if block.is_overflowed() {
        return Err(CanonError::BlockTooLarge);
    }

    let mut seen: [Option<Change>; ModalGroup::COUNT] = [None; ModalGroup::COUNT];
    let mut non_modals: heapless::Vec<NonModal, 8> = heapless::Vec::new();

    for change in block.changes() {
        match (change.group(), change) {
            (ModalGroup::None, _) => {}
            (ModalGroup::NonModal, Change::NonModal(command)) => {
                check_non_modal(&non_modals, *command)?;
                if !non_modals.contains(command) && non_modals.push(*command).is_err() {
                    return Err(CanonError::BlockTooLarge);
                }
            }
            (group, _) => {
                let slot = &mut seen[group as usize];
                match *slot {
                    Some(first) if first != *change => {
                        return Err(CanonError::ModalGroupViolation {
                            group,
                            first: first.gcode(),
                            second: change.gcode(),
                        });
                    }
                    _ => *slot = Some(*change),
                }
            }
        }
    }
    Ok(())
}

fn check_non_modal(previous: &[NonModal], command: NonModal) -> Result<(), CanonError> {
    for &first in previous {
        if first == command {
            continue;
        }
        let same_kind = kind(first) == kind(command);
        let both_take_axes = first.uses_axis_words() && command.uses_axis_words();
        if same_kind || both_take_axes {
            return Err(CanonError::ModalGroupViolation {
                group: ModalGroup::NonModal,
                first: first.gcode(),
                second: command.gcode(),
            });
        }
    }
    Ok(())
}
