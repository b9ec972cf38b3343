//! Integration test: feedhold and resume with a scripted executor.
//!
//! Validates: Run → Hold through Sync/Plan/Decel, cycle start → EndHold →
//! Run or Stop, the latched resume, and abort from a hold.

use canon_common::prelude::*;
use canon_machine::link::{ExecutorEvent, ExecutorRequest};

use super::{machine, xyz};

#[test]
fn hold_and_resume_with_motion_remaining() {
    let (mut cm, mut exec) = machine();
    cm.straight_traverse(&xyz(100.0, 0.0, 0.0), AxisFlags::X).unwrap();
    cm.straight_traverse(&xyz(100.0, 100.0, 0.0), AxisFlags::Y).unwrap();
    exec.poll();

    cm.feedhold().unwrap();
    assert_eq!(cm.machine_state(), MachineState::Hold);
    assert_eq!(cm.feedhold_state(), FeedholdState::Sync);
    assert_eq!(exec.poll(), vec![ExecutorRequest::FeedholdSync]);

    // A second feedhold is a no-op.
    cm.feedhold().unwrap();
    assert_eq!(cm.feedhold_state(), FeedholdState::Sync);

    exec.send(ExecutorEvent::SegmentBoundary);
    cm.tick();
    assert_eq!(cm.feedhold_state(), FeedholdState::Plan);
    assert_eq!(exec.poll(), vec![ExecutorRequest::FeedholdPlan]);

    exec.send(ExecutorEvent::HoldPlanned);
    cm.tick();
    assert_eq!(cm.feedhold_state(), FeedholdState::Decel);

    exec.send(ExecutorEvent::MotionStopped);
    cm.tick();
    assert_eq!(cm.feedhold_state(), FeedholdState::Hold);
    assert_eq!(cm.machine_state(), MachineState::Hold);
    assert!(cm.is_busy());

    // New motion is refused while held.
    assert!(matches!(
        cm.straight_traverse(&xyz(0.0, 0.0, 0.0), AxisFlags::X),
        Err(CanonError::IllegalStateTransition {
            state: MachineState::Hold,
            ..
        })
    ));

    cm.cycle_start().unwrap();
    assert_eq!(cm.machine_state(), MachineState::EndHold);
    assert_eq!(cm.feedhold_state(), FeedholdState::Off);
    assert_eq!(
        exec.poll(),
        vec![ExecutorRequest::Resume {
            target: xyz(100.0, 100.0, 0.0)
        }]
    );

    // Two moves still queued: back to Run.
    cm.tick();
    assert_eq!(cm.machine_state(), MachineState::Run);

    exec.complete_all();
    cm.tick();
    assert_eq!(cm.machine_state(), MachineState::Stop);
    assert!(!cm.is_busy());
}

#[test]
fn resume_after_queue_drained_in_hold_stops() {
    let (mut cm, mut exec) = machine();
    cm.straight_traverse(&xyz(5.0, 0.0, 0.0), AxisFlags::X).unwrap();
    cm.feedhold().unwrap();

    // The last move finishes before the hold completes.
    exec.complete_all();
    cm.tick();
    assert_eq!(cm.feedhold_state(), FeedholdState::Hold);

    cm.cycle_start().unwrap();
    assert_eq!(cm.machine_state(), MachineState::EndHold);
    cm.tick();
    assert_eq!(cm.machine_state(), MachineState::Stop);
}

#[test]
fn cycle_start_during_deceleration_is_latched() {
    let (mut cm, mut exec) = machine();
    cm.set_feed_rate(600.0).unwrap();
    cm.straight_feed(&xyz(0.0, 50.0, 0.0), AxisFlags::Y).unwrap();
    cm.feedhold().unwrap();
    exec.send(ExecutorEvent::SegmentBoundary);
    exec.send(ExecutorEvent::HoldPlanned);
    cm.tick();
    assert_eq!(cm.feedhold_state(), FeedholdState::Decel);

    cm.cycle_start().unwrap();
    assert_eq!(cm.machine_state(), MachineState::Hold);

    exec.send(ExecutorEvent::MotionStopped);
    cm.tick();
    assert_eq!(cm.feedhold_state(), FeedholdState::Off);
    assert_eq!(cm.machine_state(), MachineState::Run);
    assert!(
        exec.poll()
            .iter()
            .any(|r| matches!(r, ExecutorRequest::Resume { .. }))
    );
}

#[test]
fn feedhold_with_nothing_queued_holds_at_once() {
    let (mut cm, _exec) = machine();
    cm.cycle_start().unwrap();
    cm.feedhold().unwrap();
    assert_eq!(cm.machine_state(), MachineState::Hold);
    assert_eq!(cm.feedhold_state(), FeedholdState::Hold);

    cm.cycle_start().unwrap();
    cm.tick();
    assert_eq!(cm.machine_state(), MachineState::Stop);
}

#[test]
fn abort_from_hold_returns_to_reset() {
    let (mut cm, mut exec) = machine();
    cm.straight_traverse(&xyz(100.0, 0.0, 0.0), AxisFlags::X).unwrap();
    cm.feedhold().unwrap();
    exec.send(ExecutorEvent::SegmentBoundary);
    exec.send(ExecutorEvent::RuntimePosition([37.5, 0.0, 0.0, 0.0, 0.0, 0.0]));
    cm.tick();

    cm.abort();
    assert_eq!(cm.machine_state(), MachineState::Reset);
    assert_eq!(cm.feedhold_state(), FeedholdState::Off);
    assert_eq!(cm.model_canonical_position_vector(), xyz(37.5, 0.0, 0.0));
    assert!(!cm.is_busy());
    assert!(exec.poll().contains(&ExecutorRequest::Flush));

    // Ready for a fresh program.
    cm.straight_traverse(&xyz(0.0, 0.0, 0.0), AxisFlags::X).unwrap();
    assert_eq!(cm.machine_state(), MachineState::Run);
}
