//! Integration test: homing cycle and return to home.
//!
//! Validates: the homing sequence follows the configured order and skips
//! axes that do not home, G28 needs a homed machine and traverses through
//! the intermediate point to the stored reference position, and abort
//! clears an unfinished homing cycle.

use canon_common::prelude::*;
use canon_machine::CanonicalMachine;
use canon_machine::SettingsChange;
use canon_machine::link::{ExecutorEvent, ExecutorRequest, MotionKind};

use super::{TestExecutor, machine, machine_with, xyz};

fn homing_config() -> MachineConfig {
    let mut config = MachineConfig::default();
    let x = &mut config.axes[Axis::X.index()];
    x.home_position = -5.0;
    x.reference_position = 10.0;
    config.axes[Axis::Y.index()].reference_position = 20.0;
    config.axes[Axis::Z.index()].reference_position = 30.0;
    config.axes[Axis::B.index()].homing_enabled = false;
    config.axes[Axis::C.index()].mode = AxisMode::Disabled;
    config
}

/// Run the homing cycle to completion, answering every axis.
fn home(cm: &mut CanonicalMachine, exec: &mut TestExecutor) -> Vec<Axis> {
    cm.homing_cycle().unwrap();
    let mut homed = Vec::new();
    loop {
        let next = exec.poll().into_iter().find_map(|r| match r {
            ExecutorRequest::HomeAxis { axis, .. } => Some(axis),
            _ => None,
        });
        let Some(axis) = next else { break };
        homed.push(axis);
        exec.send(ExecutorEvent::HomingAxisComplete { axis });
        cm.tick();
    }
    homed
}

#[test]
fn homing_follows_order_and_skips_axes() {
    let (mut cm, mut exec) = machine_with(&homing_config());
    let homed = home(&mut cm, &mut exec);

    assert_eq!(homed, vec![Axis::Z, Axis::X, Axis::Y, Axis::A]);
    assert_eq!(cm.homing_state(), HomingState::Homed);
    assert_eq!(cm.machine_state(), MachineState::Reset);
    assert_eq!(cm.runtime_machine_position(Axis::X), -5.0);
    assert_eq!(cm.model_canonical_position_vector()[Axis::X], -5.0);
    assert!(cm.drain_settings_changes().contains(&SettingsChange::Homed(1)));
}

#[test]
fn return_to_home_through_intermediate_point() {
    let (mut cm, mut exec) = machine_with(&homing_config());
    assert_eq!(
        cm.return_to_home(&AxisVector::ZERO, AxisFlags::empty()),
        Err(CanonError::NotHomed)
    );
    home(&mut cm, &mut exec);

    // G28 Z50
    let mut block = cm.begin_block();
    block
        .set_non_modal(NonModal::ReturnToHome)
        .set_axis(Axis::Z, 50.0);
    let outcome = cm.merge_block(&block).unwrap();
    assert_eq!(outcome.next_action, NextAction::ReturnToHome);
    assert_eq!(cm.machine_state(), MachineState::Homing);
    assert!(cm.is_busy());

    // The feedhold key does nothing during the G28 traverse.
    cm.feedhold().unwrap();
    assert_eq!(cm.machine_state(), MachineState::Homing);
    assert_eq!(cm.feedhold_state(), FeedholdState::Off);

    let moves: Vec<_> = exec
        .poll()
        .into_iter()
        .filter_map(|r| match r {
            ExecutorRequest::Motion(m) => Some(m),
            _ => None,
        })
        .collect();
    assert_eq!(moves.len(), 2);
    assert_eq!(moves[0].kind, MotionKind::Traverse);
    assert_eq!(moves[0].target, xyz(-5.0, 0.0, 50.0));
    assert_eq!(moves[1].target, xyz(10.0, 20.0, 30.0));

    exec.complete_all();
    cm.tick();
    assert_eq!(cm.machine_state(), MachineState::Reset);
    assert!(!cm.is_busy());
    assert_eq!(cm.model_canonical_position_vector(), xyz(10.0, 20.0, 30.0));
}

#[test]
fn return_to_home_mid_program_resumes_run() {
    let (mut cm, mut exec) = machine_with(&homing_config());
    home(&mut cm, &mut exec);

    cm.straight_traverse(&xyz(1.0, 1.0, 1.0), AxisFlags::LINEAR).unwrap();
    assert_eq!(cm.machine_state(), MachineState::Run);
    cm.return_to_home(&AxisVector::ZERO, AxisFlags::empty()).unwrap();
    assert_eq!(cm.machine_state(), MachineState::Homing);
    assert_eq!(cm.queued_blocks(), 3);

    exec.complete_all();
    cm.tick();
    // Back to Run, then the empty queue ends the cycle.
    assert_eq!(cm.machine_state(), MachineState::Stop);
}

#[test]
fn abort_during_homing_leaves_machine_unhomed() {
    let (mut cm, mut exec) = machine();
    cm.restore_homing_state(1).unwrap();
    cm.homing_cycle().unwrap();
    assert_eq!(cm.homing_state(), HomingState::InCycle);
    exec.poll();

    cm.abort();
    assert_eq!(cm.homing_state(), HomingState::NotHomed);
    assert_eq!(cm.machine_state(), MachineState::Reset);
    assert!(cm.drain_settings_changes().contains(&SettingsChange::Homed(0)));

    // Late completions from the executor are ignored.
    exec.send(ExecutorEvent::HomingAxisComplete { axis: Axis::Z });
    cm.tick();
    assert_eq!(cm.homing_state(), HomingState::NotHomed);
    assert!(!cm.is_busy());
}

#[test]
fn abort_after_homing_keeps_homed_flag() {
    let (mut cm, mut exec) = machine();
    home(&mut cm, &mut exec);
    cm.straight_traverse(&xyz(3.0, 0.0, 0.0), AxisFlags::X).unwrap();
    cm.abort();
    assert_eq!(cm.homing_state(), HomingState::Homed);
}
