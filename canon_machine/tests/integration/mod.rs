//! Shared helpers for the integration tests.

mod coordinates;
mod feedhold;
mod homing;
mod modal;
mod program;

use canon_common::prelude::*;
use canon_machine::CanonicalMachine;
use canon_machine::link::{self, ExecutorEvent, ExecutorLink, ExecutorRequest};

/// Scripted motion executor: records requests and answers them on demand.
pub struct TestExecutor {
    link: ExecutorLink,
    /// Every request received, oldest first.
    pub received: Vec<ExecutorRequest>,
    outstanding: usize,
}

impl TestExecutor {
    /// Pull pending requests off the link.
    pub fn poll(&mut self) -> Vec<ExecutorRequest> {
        let requests = self.link.drain();
        self.outstanding += requests.iter().filter(|r| r.is_queued()).count();
        self.received.extend(requests.iter().copied());
        requests
    }

    /// Acknowledge every queued request received so far, reporting the
    /// last motion target as the runtime position.
    pub fn complete_all(&mut self) {
        self.poll();
        let last_target = self.received.iter().rev().find_map(|r| match r {
            ExecutorRequest::Motion(m) => Some(m.target),
            _ => None,
        });
        for _ in 0..self.outstanding {
            self.link.send(ExecutorEvent::BlockComplete);
        }
        self.outstanding = 0;
        if let Some(target) = last_target {
            self.link.send(ExecutorEvent::RuntimePosition(*target.as_array()));
        }
    }

    pub fn send(&self, event: ExecutorEvent) {
        assert!(self.link.send(event));
    }

    /// Number of queued requests not yet acknowledged.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }
}

pub fn machine_with(config: &MachineConfig) -> (CanonicalMachine, TestExecutor) {
    let (canon, exec) = link::channel();
    (
        CanonicalMachine::new(config, canon),
        TestExecutor {
            link: exec,
            received: Vec::new(),
            outstanding: 0,
        },
    )
}

pub fn machine() -> (CanonicalMachine, TestExecutor) {
    machine_with(&MachineConfig::default())
}

pub fn xyz(x: f64, y: f64, z: f64) -> AxisVector {
    AxisVector::new(x, y, z, 0.0, 0.0, 0.0)
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
