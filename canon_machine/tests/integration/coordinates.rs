//! Integration test: coordinate systems, origin offsets and axis modes.
//!
//! Validates: work = machine - coord_offset - origin_offset across G10,
//! G54..G59, G92 and G53, and rotary axis handling on the way to the
//! executor.

use canon_common::prelude::*;
use canon_machine::SettingsChange;
use canon_machine::link::ExecutorRequest;

use super::{assert_close, machine, machine_with, xyz};

fn last_target(requests: &[ExecutorRequest]) -> AxisVector {
    requests
        .iter()
        .rev()
        .find_map(|r| match r {
            ExecutorRequest::Motion(m) => Some(m.target),
            _ => None,
        })
        .expect("no motion request")
}

#[test]
fn work_offsets_select_and_write() {
    let (mut cm, mut exec) = machine();

    // G10 L2 P2 X100 Y-20
    let mut block = cm.begin_block();
    block
        .set_non_modal(NonModal::SetCoordOffset(CoordSystem::G55))
        .set_axis(Axis::X, 100.0)
        .set_axis(Axis::Y, -20.0);
    let outcome = cm.merge_block(&block).unwrap();
    assert!(!outcome.queued);
    assert_eq!(cm.offsets().g55, xyz(100.0, -20.0, 0.0));
    assert!(cm.drain_settings_changes().iter().any(|c| matches!(
        c,
        SettingsChange::CoordOffsets {
            coord_system: CoordSystem::G55,
            ..
        }
    )));

    // G55 G0 X10 Y10
    let mut block = cm.begin_block();
    block
        .set_coord_system(CoordSystem::G55)
        .set_motion_mode(MotionMode::StraightTraverse)
        .set_axis(Axis::X, 10.0)
        .set_axis(Axis::Y, 10.0);
    cm.merge_block(&block).unwrap();

    assert_eq!(last_target(&exec.poll()), xyz(110.0, -10.0, 0.0));
    assert_close(cm.model_work_position(Axis::X), 10.0);
    assert_close(cm.coord_offset(Axis::Y), -20.0);
}

#[test]
fn absolute_override_lasts_one_block() {
    let (mut cm, mut exec) = machine();
    cm.set_coord_offsets(CoordSystem::G54, &xyz(50.0, 0.0, 0.0), AxisFlags::X)
        .unwrap();

    // G53 G0 X5
    let mut block = cm.begin_block();
    block
        .set_non_modal(NonModal::AbsoluteOverride)
        .set_motion_mode(MotionMode::StraightTraverse)
        .set_axis(Axis::X, 5.0);
    cm.merge_block(&block).unwrap();
    assert_close(last_target(&exec.poll())[Axis::X], 5.0);
    assert!(!cm.active().absolute_override);
    assert_close(cm.model_work_position(Axis::X), -45.0);

    // X5 again, back in G54
    let mut block = cm.begin_block();
    block.set_axis(Axis::X, 5.0);
    cm.merge_block(&block).unwrap();
    assert_close(last_target(&exec.poll())[Axis::X], 55.0);
}

#[test]
fn direct_absolute_override_applies_to_next_move() {
    let (mut cm, mut exec) = machine();
    cm.set_coord_offsets(CoordSystem::G54, &xyz(0.0, 0.0, -10.0), AxisFlags::Z)
        .unwrap();
    cm.set_absolute_override(true);
    cm.straight_traverse(&xyz(0.0, 0.0, 1.0), AxisFlags::Z).unwrap();
    assert_close(last_target(&exec.poll())[Axis::Z], 1.0);
    cm.straight_traverse(&xyz(0.0, 0.0, 1.0), AxisFlags::Z).unwrap();
    assert_close(last_target(&exec.poll())[Axis::Z], -9.0);
}

#[test]
fn origin_offsets_through_blocks() {
    let (mut cm, mut exec) = machine();
    cm.straight_traverse(&xyz(30.0, 0.0, 0.0), AxisFlags::X).unwrap();
    exec.complete_all();
    cm.tick();

    // G92 X0: the current point becomes X0.
    let mut block = cm.begin_block();
    block
        .set_non_modal(NonModal::OriginOffset(OriginOffsetMode::Set))
        .set_axis(Axis::X, 0.0);
    let outcome = cm.merge_block(&block).unwrap();
    assert!(!outcome.queued);
    assert_close(cm.model_work_position(Axis::X), 0.0);

    // X10 moves to machine 40.
    cm.straight_traverse(&xyz(10.0, 0.0, 0.0), AxisFlags::X).unwrap();
    assert_close(last_target(&exec.poll())[Axis::X], 40.0);

    // G92.2 suspends, G92.3 restores.
    cm.set_origin_offsets(OriginOffsetMode::Suspend, &AxisVector::ZERO, AxisFlags::empty())
        .unwrap();
    assert_close(cm.model_work_position(Axis::X), 40.0);
    cm.set_origin_offsets(OriginOffsetMode::Resume, &AxisVector::ZERO, AxisFlags::empty())
        .unwrap();
    assert_close(cm.model_work_position(Axis::X), 10.0);
}

#[test]
fn inch_display_of_runtime_position() {
    let (mut cm, mut exec) = machine();
    cm.set_units_mode(UnitsMode::Inches).unwrap();
    cm.straight_traverse(&xyz(1.0, 2.0, 0.0), AxisFlags::X | AxisFlags::Y)
        .unwrap();
    exec.complete_all();
    cm.tick();
    assert_close(cm.runtime_machine_position(Axis::X), 25.4);
    assert_close(cm.runtime_work_position(Axis::Y), 2.0);
    assert_eq!(cm.machine_state(), MachineState::Stop);
}

#[test]
fn radius_mode_converts_travel_to_degrees() {
    let mut config = MachineConfig::default();
    config.axes[Axis::A.index()].mode = AxisMode::Radius;
    config.axes[Axis::A.index()].radius = 10.0;
    let (mut cm, mut exec) = machine_with(&config);

    // A quarter of the circumference.
    let quarter = std::f64::consts::PI * 10.0 / 2.0;
    cm.straight_traverse(&AxisVector::new(0.0, 0.0, 0.0, quarter, 0.0, 0.0), AxisFlags::A)
        .unwrap();
    assert_close(last_target(&exec.poll())[Axis::A], 90.0);
}

#[test]
fn slaved_axis_follows_source_travel() {
    let mut config = MachineConfig::default();
    config.axes[Axis::B.index()].mode = AxisMode::SlaveX;
    config.axes[Axis::B.index()].radius = 10.0;
    let (mut cm, mut exec) = machine_with(&config);

    let half = std::f64::consts::PI * 10.0;
    cm.straight_traverse(&xyz(half, 0.0, 0.0), AxisFlags::X).unwrap();
    let target = last_target(&exec.poll());
    assert_close(target[Axis::X], half);
    assert_close(target[Axis::B], 180.0);

    assert_eq!(
        cm.straight_traverse(&AxisVector::new(0.0, 0.0, 0.0, 0.0, 10.0, 0.0), AxisFlags::B),
        Err(CanonError::UnsupportedAxisMode {
            axis: Axis::B,
            mode: AxisMode::SlaveX
        })
    );
}

#[test]
fn disabled_axis_never_moves() {
    let mut config = MachineConfig::default();
    config.axes[Axis::C.index()].mode = AxisMode::Disabled;
    let (mut cm, mut exec) = machine_with(&config);
    cm.straight_traverse(&AxisVector::new(1.0, 0.0, 0.0, 0.0, 0.0, 45.0), AxisFlags::X | AxisFlags::C)
        .unwrap();
    let target = last_target(&exec.poll());
    assert_close(target[Axis::X], 1.0);
    assert_close(target[Axis::C], 0.0);
}
