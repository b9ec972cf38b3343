//! Integration test: parsed blocks through the merge pipeline.
//!
//! Validates: block words land in the active model in execution order,
//! conflicting words reject the whole block, and persistent changes are
//! reported once.

use canon_common::prelude::*;
use canon_machine::SettingsChange;
use canon_machine::link::{ExecutorRequest, MotionKind};

use super::{assert_close, machine, xyz};

#[test]
fn inch_incremental_program() {
    let (mut cm, mut exec) = machine();

    // N10 G20 G91 G1 X1 F10
    let mut block = cm.begin_block();
    block
        .set_line_number(10)
        .set_units_mode(UnitsMode::Inches)
        .set_distance_mode(DistanceMode::Incremental)
        .set_motion_mode(MotionMode::StraightFeed)
        .set_axis(Axis::X, 1.0)
        .set_feed_rate(10.0);
    let outcome = cm.merge_block(&block).unwrap();
    assert_eq!(outcome.linecount, 1);
    assert_eq!(outcome.next_action, NextAction::Motion);
    assert!(outcome.queued);

    // N20 X1 Y-0.5: motion mode and units carry over.
    let mut block = cm.begin_block();
    assert_eq!(block.motion_mode(), MotionMode::StraightFeed);
    assert_eq!(block.units_mode(), UnitsMode::Inches);
    block
        .set_line_number(20)
        .set_axis(Axis::X, 1.0)
        .set_axis(Axis::Y, -0.5);
    cm.merge_block(&block).unwrap();

    assert_eq!(cm.linecount(), 2);
    assert_eq!(cm.linenum(), 20);
    let position = cm.model_canonical_position_vector();
    assert_close(position[Axis::X], 50.8);
    assert_close(position[Axis::Y], -12.7);
    assert_close(cm.model_work_position(Axis::X), 2.0);

    let moves: Vec<_> = exec
        .poll()
        .into_iter()
        .filter_map(|r| match r {
            ExecutorRequest::Motion(m) => Some(m),
            _ => None,
        })
        .collect();
    assert_eq!(moves.len(), 2);
    assert_eq!(moves[1].kind, MotionKind::Feed);
    assert_close(moves[1].feed_rate, 254.0);
    assert_eq!(moves[1].line_number, 20);
    assert_eq!(cm.queued_blocks(), 2);
}

#[test]
fn conflicting_words_reject_whole_block() {
    let (mut cm, mut exec) = machine();
    let before = cm.active().clone();

    // G0 G1 X5 S1000
    let mut block = cm.begin_block();
    block
        .set_motion_mode(MotionMode::StraightTraverse)
        .set_motion_mode(MotionMode::StraightFeed)
        .set_axis(Axis::X, 5.0)
        .set_spindle_speed(1000.0);
    assert_eq!(
        cm.check_block(&block),
        Err(CanonError::ModalGroupViolation {
            group: ModalGroup::Motion,
            first: "G0",
            second: "G1",
        })
    );
    assert!(cm.merge_block(&block).is_err());

    assert_eq!(cm.active(), &before);
    assert_eq!(cm.linecount(), 0);
    assert_eq!(cm.machine_state(), MachineState::Reset);
    assert!(exec.poll().is_empty());
}

#[test]
fn repeated_identical_word_is_accepted() {
    let (mut cm, _exec) = machine();
    let mut block = cm.begin_block();
    block.set_plane(Plane::Xz).set_plane(Plane::Xz);
    cm.merge_block(&block).unwrap();
    assert_eq!(cm.plane(), Plane::Xz);
}

#[test]
fn tool_change_and_spindle_in_one_block() {
    let (mut cm, mut exec) = machine();

    // T3 M6 S8000 M3 G0 Z5
    let mut block = cm.begin_block();
    block
        .set_tool(3)
        .set_change_tool()
        .set_spindle_speed(8000.0)
        .set_spindle_mode(SpindleMode::Cw)
        .set_motion_mode(MotionMode::StraightTraverse)
        .set_axis(Axis::Z, 5.0);
    cm.merge_block(&block).unwrap();

    let requests = exec.poll();
    assert_eq!(requests[0], ExecutorRequest::ToolChange { tool: 3 });
    assert_eq!(
        requests[1],
        ExecutorRequest::SpindleControl {
            mode: SpindleMode::Cw,
            speed: 8000.0
        }
    );
    match requests[2] {
        ExecutorRequest::Motion(m) => {
            assert_eq!(m.tool, 3);
            assert_eq!(m.target, xyz(0.0, 0.0, 5.0));
        }
        ref other => panic!("unexpected request {other:?}"),
    }

    let changes = cm.drain_settings_changes();
    assert!(changes.contains(&SettingsChange::Tool(3)));
    assert!(changes.contains(&SettingsChange::SpindleMode(SpindleMode::Cw)));
}

#[test]
fn inverse_time_feed_needs_f_each_block() {
    let (mut cm, mut exec) = machine();

    // G93 G1 X10 F2
    let mut block = cm.begin_block();
    block
        .set_inverse_feed_rate_mode(true)
        .set_motion_mode(MotionMode::StraightFeed)
        .set_axis(Axis::X, 10.0)
        .set_feed_rate(2.0);
    cm.merge_block(&block).unwrap();
    let inverse = exec.poll().into_iter().find_map(|r| match r {
        ExecutorRequest::Motion(m) => m.inverse_feed_rate,
        _ => None,
    });
    assert_eq!(inverse, Some(2.0));

    // X20 without F in inverse-time mode
    let mut block = cm.begin_block();
    block.set_axis(Axis::X, 20.0);
    assert_eq!(cm.merge_block(&block), Err(CanonError::MissingFeedRate));
    assert_close(cm.model_canonical_position_vector()[Axis::X], 10.0);
}

#[test]
fn canned_cycles_are_refused() {
    let (mut cm, _exec) = machine();
    cm.set_feed_rate(100.0).unwrap();
    let mut block = cm.begin_block();
    block
        .set_motion_mode(MotionMode::CannedCycle81)
        .set_axis(Axis::Z, -2.0);
    assert_eq!(
        cm.merge_block(&block),
        Err(CanonError::UnsupportedMotionMode(MotionMode::CannedCycle81))
    );
}

#[test]
fn cancel_motion_mode_ignores_axis_words() {
    let (mut cm, mut exec) = machine();
    let mut block = cm.begin_block();
    block
        .set_motion_mode(MotionMode::CancelMotionMode)
        .set_axis(Axis::X, 3.0);
    let outcome = cm.merge_block(&block).unwrap();
    assert!(!outcome.queued);
    assert_eq!(cm.motion_mode(), MotionMode::CancelMotionMode);
    assert_eq!(cm.model_canonical_position_vector(), AxisVector::ZERO);
    assert!(exec.poll().is_empty());
}

#[test]
fn direct_setter_between_begin_and_merge_survives() {
    let (mut cm, _exec) = machine();

    let mut block = cm.begin_block();
    block.set_feed_rate(100.0);
    cm.set_units_mode(UnitsMode::Inches).unwrap();
    cm.merge_block(&block).unwrap();

    assert_eq!(cm.units_mode(), UnitsMode::Inches);
    assert_close(cm.active().feed_rate, 2540.0);
}

#[test]
fn program_end_resets_survive_block_opened_before_drain() {
    let (mut cm, mut exec) = machine();

    // G91 G0 X1
    let mut block = cm.begin_block();
    block
        .set_distance_mode(DistanceMode::Incremental)
        .set_motion_mode(MotionMode::StraightTraverse)
        .set_axis(Axis::X, 1.0);
    cm.merge_block(&block).unwrap();

    // M2
    let mut block = cm.begin_block();
    block.set_program_stop(ProgramStop::End);
    cm.merge_block(&block).unwrap();
    assert_eq!(cm.distance_mode(), DistanceMode::Incremental);

    // S1000 is opened while the end is still pending.
    let mut block = cm.begin_block();
    block.set_spindle_speed(1000.0);

    exec.complete_all();
    cm.tick();
    assert_eq!(cm.machine_state(), MachineState::Reset);
    assert_eq!(cm.distance_mode(), DistanceMode::Absolute);

    cm.merge_block(&block).unwrap();
    assert_eq!(cm.distance_mode(), DistanceMode::Absolute);
    assert_eq!(cm.motion_mode(), MotionMode::StraightFeed);
    assert_close(cm.active().spindle_speed, 1000.0);
}
