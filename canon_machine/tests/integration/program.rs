//! Integration test: a short program from first block to M30.
//!
//! Validates: the machine runs while work is queued, M0 and M30 take
//! effect only once the executor drains, end-of-program resets, and a
//! vanished executor never panics the canonical side.

use canon_common::prelude::*;
use canon_machine::SettingsChange;
use canon_machine::link::{ExecutorRequest, MotionKind};

use super::{machine, xyz};

#[test]
fn program_with_stop_and_end() {
    let (mut cm, mut exec) = machine();

    // N1 G17 G21 G90 G54 M3 S1200 F300
    let mut block = cm.begin_block();
    block
        .set_line_number(1)
        .set_plane(Plane::Xy)
        .set_units_mode(UnitsMode::Millimeters)
        .set_distance_mode(DistanceMode::Absolute)
        .set_coord_system(CoordSystem::G54)
        .set_spindle_mode(SpindleMode::Cw)
        .set_spindle_speed(1200.0)
        .set_feed_rate(300.0);
    cm.merge_block(&block).unwrap();
    assert_eq!(cm.machine_state(), MachineState::Run);

    // N2 G1 X20 Y10
    let mut block = cm.begin_block();
    block
        .set_line_number(2)
        .set_motion_mode(MotionMode::StraightFeed)
        .set_axis(Axis::X, 20.0)
        .set_axis(Axis::Y, 10.0);
    cm.merge_block(&block).unwrap();

    // N3 G3 X0 Y10 I-10 J0
    let mut block = cm.begin_block();
    block
        .set_line_number(3)
        .set_motion_mode(MotionMode::CcwArc)
        .set_axis(Axis::X, 0.0)
        .set_arc_offset(0, -10.0)
        .set_arc_offset(1, 0.0);
    cm.merge_block(&block).unwrap();

    // N4 G4 P0.25 M0
    let mut block = cm.begin_block();
    block
        .set_line_number(4)
        .set_non_modal(NonModal::Dwell)
        .set_dwell_time(0.25)
        .set_program_stop(ProgramStop::Stop);
    cm.merge_block(&block).unwrap();
    assert_eq!(cm.linecount(), 4);
    assert_eq!(cm.machine_state(), MachineState::Run);
    assert!(cm.is_busy());

    let requests = exec.poll();
    assert!(matches!(
        requests.as_slice(),
        [
            ExecutorRequest::SpindleControl { mode: SpindleMode::Cw, .. },
            ExecutorRequest::Motion(_),
            ExecutorRequest::Motion(_),
            ExecutorRequest::Dwell { .. },
            ExecutorRequest::ProgramStop,
        ]
    ));
    if let ExecutorRequest::Motion(arc) = requests[2] {
        assert_eq!(
            arc.kind,
            MotionKind::Arc {
                direction: Direction::Ccw,
                radius: None,
                offset: [-10.0, 0.0, 0.0],
            }
        );
        assert_eq!(arc.line_number, 3);
    }

    exec.complete_all();
    cm.tick();
    assert_eq!(cm.machine_state(), MachineState::Stop);
    assert_eq!(cm.active().program_flow, ProgramFlow::Paused);

    // N5 G91 G0 Z5 M30
    cm.cycle_start().unwrap();
    let mut block = cm.begin_block();
    block
        .set_line_number(5)
        .set_distance_mode(DistanceMode::Incremental)
        .set_motion_mode(MotionMode::StraightTraverse)
        .set_axis(Axis::Z, 5.0)
        .set_program_stop(ProgramStop::End);
    cm.merge_block(&block).unwrap();
    assert_eq!(cm.distance_mode(), DistanceMode::Incremental);

    exec.complete_all();
    cm.tick();
    assert_eq!(cm.machine_state(), MachineState::Reset);
    assert_eq!(cm.distance_mode(), DistanceMode::Absolute);
    assert_eq!(cm.motion_mode(), MotionMode::StraightFeed);
    assert_eq!(cm.active().spindle_mode, SpindleMode::Off);
    assert_eq!(cm.active().program_flow, ProgramFlow::Completed);
    assert_eq!(cm.model_canonical_position_vector(), xyz(0.0, 10.0, 5.0));
    assert_eq!(cm.linenum(), 5);
    assert!(!cm.is_busy());

    let changes = cm.drain_settings_changes();
    assert!(changes.contains(&SettingsChange::SpindleMode(SpindleMode::Cw)));
    assert!(changes.contains(&SettingsChange::DistanceMode(DistanceMode::Absolute)));
    assert_eq!(
        changes.last(),
        Some(&SettingsChange::SpindleMode(SpindleMode::Off))
    );
}

#[test]
fn status_snapshot_tracks_the_program() {
    let (mut cm, mut exec) = machine();
    cm.set_units_mode(UnitsMode::Inches).unwrap();
    cm.straight_traverse(&xyz(1.0, 0.0, 0.0), AxisFlags::X).unwrap();

    let status = cm.status();
    assert_eq!(status.state_name(), "run");
    assert!(status.busy);

    exec.complete_all();
    cm.tick();
    let json = serde_json::to_value(cm.status()).unwrap();
    assert_eq!(json["machine_state"], "stop");
    assert_eq!(json["units_mode"], "inches");
    assert_eq!(json["busy"], false);
    assert!((json["runtime_position"][0].as_f64().unwrap() - 25.4).abs() < 1e-9);
}

#[test]
fn lost_executor_does_not_panic() {
    let (mut cm, exec) = machine();
    drop(exec);
    cm.straight_traverse(&xyz(1.0, 0.0, 0.0), AxisFlags::X).unwrap();
    cm.tick();
    cm.feedhold().unwrap();
    cm.abort();
    assert_eq!(cm.machine_state(), MachineState::Reset);
}
