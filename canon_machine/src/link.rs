//! Message link between the canonical machine and the motion executor.
//!
//! Requests flow canonical → executor, completion events flow back. Both
//! directions are non-blocking `std::sync::mpsc` channels; the canonical
//! side drains events from [`CanonicalMachine::tick`](crate::CanonicalMachine::tick).

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use canon_common::prelude::*;
use static_assertions::assert_impl_all;
use tracing::warn;

// ─── Requests ───────────────────────────────────────────────────────

/// Geometry of a queued move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionKind {
    /// G0
    Traverse,
    /// G1
    Feed,
    /// G2 / G3. Either `radius` or the in-plane `offset` words define the arc.
    Arc {
        direction: Direction,
        radius: Option<f64>,
        /// IJK [mm]
        offset: [f64; 3],
    },
    /// G38.2
    Probe,
}

/// Everything the executor needs for one move, captured from the active
/// model when the move is accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionRequest {
    pub kind: MotionKind,
    /// [mm, machine]
    pub target: AxisVector,
    /// [mm/min]
    pub feed_rate: f64,
    /// [1/min], present in inverse-time mode.
    pub inverse_feed_rate: Option<f64>,
    pub path_control: PathControl,
    pub plane: Plane,
    pub tool: u8,
    pub spindle_mode: SpindleMode,
    pub spindle_speed: f64,
    pub line_number: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExecutorRequest {
    Motion(MotionRequest),
    Dwell { seconds: f64 },
    SpindleControl { mode: SpindleMode, speed: f64 },
    ToolChange { tool: u8 },
    /// Stop at the next segment decision point.
    FeedholdSync,
    /// Replan queued blocks for a controlled stop.
    FeedholdPlan,
    /// Leave the hold and continue toward `target`.
    Resume { target: AxisVector },
    /// Discard everything queued.
    Flush,
    HomeAxis {
        axis: Axis,
        search_velocity: f64,
        latch_velocity: f64,
    },
    ProgramStop,
    ProgramEnd,
}

impl ExecutorRequest {
    /// Requests the executor acknowledges with `BlockComplete`.
    #[inline]
    pub const fn is_queued(&self) -> bool {
        matches!(
            self,
            Self::Motion(_) | Self::Dwell { .. } | Self::SpindleControl { .. } | Self::ToolChange { .. }
        )
    }
}

// ─── Events ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExecutorEvent {
    /// One queued request finished.
    BlockComplete,
    /// The streaming segment reached a decision point.
    SegmentBoundary,
    /// The planner finished replanning for the hold.
    HoldPlanned,
    /// All axes at rest.
    MotionStopped,
    /// Runtime machine position [mm, machine].
    RuntimePosition([f64; 6]),
    HomingAxisComplete { axis: Axis },
    HomingAxisFailed { axis: Axis },
}

// ─── Endpoints ──────────────────────────────────────────────────────

/// Canonical-machine end of the link.
#[derive(Debug)]
pub struct CanonicalLink {
    requests: Sender<ExecutorRequest>,
    events: Receiver<ExecutorEvent>,
    connected: bool,
}

impl CanonicalLink {
    /// Send a request. Returns `false` once the executor has gone away;
    /// the disconnect is logged once.
    pub fn send(&mut self, request: ExecutorRequest) -> bool {
        if self.requests.send(request).is_ok() {
            return true;
        }
        self.disconnected();
        false
    }

    /// Next pending event, without blocking.
    pub fn try_recv(&mut self) -> Option<ExecutorEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.disconnected();
                None
            }
        }
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn disconnected(&mut self) {
        if self.connected {
            warn!("motion executor disconnected; requests are dropped");
            self.connected = false;
        }
    }
}

/// Executor end of the link. `Send`, so it can live on another thread.
#[derive(Debug)]
pub struct ExecutorLink {
    requests: Receiver<ExecutorRequest>,
    events: Sender<ExecutorEvent>,
}

impl ExecutorLink {
    pub fn try_recv(&self) -> Option<ExecutorRequest> {
        self.requests.try_recv().ok()
    }

    /// All requests sent so far.
    pub fn drain(&self) -> Vec<ExecutorRequest> {
        self.requests.try_iter().collect()
    }

    /// Post an event. Returns `false` if the canonical machine is gone.
    pub fn send(&self, event: ExecutorEvent) -> bool {
        self.events.send(event).is_ok()
    }
}

assert_impl_all!(ExecutorLink: Send);
assert_impl_all!(ExecutorRequest: Send, Copy);

/// Create a connected pair of link endpoints.
pub fn channel() -> (CanonicalLink, ExecutorLink) {
    let (request_tx, request_rx) = mpsc::channel();
    let (event_tx, event_rx) = mpsc::channel();
    (
        CanonicalLink {
            requests: request_tx,
            events: event_rx,
            connected: true,
        },
        ExecutorLink {
            requests: request_rx,
            events: event_tx,
        },
    )
}
