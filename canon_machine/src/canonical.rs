//! Process-scoped canonical machine context.
//!
//! One [`CanonicalMachine`] owns the active model, the machine state
//! machine with its feedhold and homing sub-state machines, and the
//! canonical end of the executor link. It is passed explicitly to the
//! parser, the executor event pump and the status reporter.
//!
//! ## Block Lifecycle
//!
//! 1. `begin_block()` returns an empty [`Block`] carrying the active modal state
//! 2. the parser records the block's words on it
//! 3. `merge_block()` checks modal groups, stages the block on a copy of the
//!    active model, gates it on the machine state and only then commits it
//!    and sends the executor requests
//!
//! The direct canonical operations (`straight_feed`, `set_units_mode`, ...)
//! are single-command blocks through the same path.

mod cycle;
mod homing;
mod modal;
mod motion;

use canon_common::consts::AXES;
use canon_common::prelude::*;
use tracing::{debug, info, warn};

use crate::link::{CanonicalLink, ExecutorEvent, ExecutorRequest, MotionKind, MotionRequest};
use crate::model::{Block, GCodeState, MergeEnv, StagedAction, StagedBlock, check_block, stage_block};
use crate::state::{
    FeedholdEvent, FeedholdStateMachine, HomingCycle, HomingPhase, MachineEvent,
    MachineStateMachine, ReturnHome, TransitionResult,
};
use crate::status::StatusSnapshot;
use crate::transform::{Frame, axis_to_display};

pub use crate::model::SettingsChange;
pub use motion::ArcWords;

/// Deferred program stop or end, executed when the queue drains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drain {
    Stop,
    End,
}

/// What a committed block did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockOutcome {
    /// Block counter after this block.
    pub linecount: u32,
    pub next_action: NextAction,
    /// Block queued work for the executor.
    pub queued: bool,
}

/// The canonical machine.
#[derive(Debug)]
pub struct CanonicalMachine {
    active: GCodeState,
    defaults: GCodeDefaults,
    offsets: CoordOffsetTable,
    axes: [AxisConfig; AXES],
    reference_position: AxisVector,
    settings: MachineSettings,

    linecount: u32,
    linenum: u32,
    machine: MachineStateMachine,
    feedhold: FeedholdStateMachine,
    homing_state: HomingState,
    homing_cycle: HomingCycle,
    return_home: ReturnHome,
    status_report_counter: u32,

    /// Last position reported by the executor [mm, machine].
    runtime_position: AxisVector,
    /// Requests sent and not yet acknowledged with `BlockComplete`.
    queued_blocks: usize,
    drain: Option<Drain>,
    /// Cycle start received while the feedhold was still stopping.
    resume_latched: bool,
    pending_arc: ArcWords,
    settings_changes: Vec<SettingsChange>,
    link: CanonicalLink,
}

impl CanonicalMachine {
    /// Power-on construction from a validated configuration.
    pub fn new(config: &MachineConfig, link: CanonicalLink) -> Self {
        let active = GCodeState::from_defaults(&config.defaults);
        info!(
            "Canonical machine initialized: units={}, plane={}, coord={}",
            active.units_mode.gcode(),
            active.plane.gcode(),
            active.coord_system.gcode()
        );
        Self {
            active,
            defaults: config.defaults.clone(),
            offsets: config.offsets.clone(),
            axes: config.axis_table(),
            reference_position: config.reference_position(),
            settings: config.machine.clone(),
            linecount: 0,
            linenum: 0,
            machine: MachineStateMachine::new(),
            feedhold: FeedholdStateMachine::new(),
            homing_state: HomingState::NotHomed,
            homing_cycle: HomingCycle::new(),
            return_home: ReturnHome::Idle,
            status_report_counter: 0,
            runtime_position: AxisVector::ZERO,
            queued_blocks: 0,
            drain: None,
            resume_latched: false,
            pending_arc: ArcWords::default(),
            settings_changes: Vec::new(),
            link,
        }
    }

    // ─── Block Pipeline ─────────────────────────────────────────────

    /// Empty block seeded with the carried-over modal state.
    pub fn begin_block(&self) -> Block {
        Block::carrying(&self.active)
    }

    /// Modal group check without side effects.
    pub fn check_block(&self, block: &Block) -> Result<(), CanonError> {
        check_block(block)
    }

    /// Check, stage, gate and commit one parsed block.
    pub fn merge_block(&mut self, block: &Block) -> Result<BlockOutcome, CanonError> {
        self.apply_block(block, true)
    }

    fn apply_block(&mut self, block: &Block, count_line: bool) -> Result<BlockOutcome, CanonError> {
        let staged = check_block(block)
            .and_then(|()| stage_block(&self.active, block, &self.merge_env()))
            .and_then(|staged| self.admit(&staged).map(|()| staged));
        match staged {
            Ok(staged) => Ok(self.commit(staged, count_line)),
            Err(e) => {
                warn!("Block rejected (line {}): {e}", self.linenum);
                Err(e)
            }
        }
    }

    fn merge_env(&self) -> MergeEnv<'_> {
        MergeEnv {
            offsets: &self.offsets,
            axes: &self.axes,
            reference_position: &self.reference_position,
            max_tool: self.settings.max_tool,
            optional_stop_enabled: self.settings.optional_stop_enabled,
        }
    }

    /// Machine-state gating of a staged block.
    fn admit(&self, staged: &StagedBlock) -> Result<(), CanonError> {
        if matches!(staged.action, Some(StagedAction::ReturnToHome { .. }))
            && self.homing_state != HomingState::Homed
        {
            return Err(CanonError::NotHomed);
        }
        if !staged.queues_work() {
            return Ok(());
        }

        let state = self.machine.state();
        let operation = match (staged.action, staged.stop) {
            (Some(action), _) => action.operation(),
            (None, Some(ProgramStop::End)) => "program_end",
            (None, Some(_)) => "program_stop",
            (None, None) => "queue",
        };
        let illegal = CanonError::IllegalStateTransition { state, operation };

        if !self.machine.accepts_work() || self.drain.is_some() {
            return Err(illegal);
        }
        if matches!(staged.action, Some(StagedAction::HomingCycle)) && self.queued_blocks > 0 {
            return Err(illegal);
        }
        Ok(())
    }

    fn commit(&mut self, staged: StagedBlock, count_line: bool) -> BlockOutcome {
        let StagedBlock {
            state,
            action,
            spindle,
            tool_change,
            stop,
            coord_offset_update,
            settings,
            line_number,
        } = staged;

        if let Some((coord_system, offsets)) = coord_offset_update {
            self.offsets.set(coord_system, offsets);
            info!("{} offsets set to {:?}", coord_system.gcode(), offsets.as_array());
        }
        self.active = state;
        if count_line {
            self.linecount = self.linecount.wrapping_add(1);
        }
        if let Some(line) = line_number {
            self.linenum = line;
        }
        self.settings_changes.extend(settings);

        let queued_before = self.queued_blocks;
        if let Some(tool) = tool_change {
            self.queue(ExecutorRequest::ToolChange { tool });
        }
        if let Some((mode, speed)) = spindle {
            self.queue(ExecutorRequest::SpindleControl { mode, speed });
        }
        match action {
            Some(StagedAction::Motion(kind)) => {
                let request = self.motion_request(kind, self.active.target);
                self.queue(ExecutorRequest::Motion(request));
            }
            Some(StagedAction::Dwell { seconds }) => {
                self.queue(ExecutorRequest::Dwell { seconds });
            }
            Some(StagedAction::ReturnToHome {
                intermediate,
                reference,
            }) => self.start_return_home(intermediate, reference),
            Some(StagedAction::HomingCycle) => self.start_homing_cycle(),
            None => {}
        }
        match stop {
            Some(ProgramStop::Stop | ProgramStop::OptionalStop) => self.request_drain(Drain::Stop),
            Some(ProgramStop::End) => self.request_drain(Drain::End),
            None => {}
        }
        self.active.absolute_override = false;

        BlockOutcome {
            linecount: self.linecount,
            next_action: self.active.next_action,
            queued: self.queued_blocks > queued_before,
        }
    }

    /// Executor request for a move to `target`, from the active model.
    fn motion_request(&self, kind: MotionKind, target: AxisVector) -> MotionRequest {
        MotionRequest {
            kind,
            target,
            feed_rate: self.active.feed_rate,
            inverse_feed_rate: self
                .active
                .inverse_feed_rate_mode
                .then_some(self.active.inverse_feed_rate),
            path_control: self.active.path_control,
            plane: self.active.plane,
            tool: self.active.tool,
            spindle_mode: self.active.spindle_mode,
            spindle_speed: self.active.spindle_speed,
            line_number: self.linenum,
        }
    }

    /// Send a request the executor acknowledges, starting the cycle if idle.
    fn queue(&mut self, request: ExecutorRequest) {
        if matches!(self.machine.state(), MachineState::Reset | MachineState::Stop) {
            self.transition(MachineEvent::CycleStart);
        }
        if request.is_queued() {
            self.queued_blocks += 1;
        }
        self.link.send(request);
    }

    fn transition(&mut self, event: MachineEvent) -> TransitionResult {
        let from = self.machine.state();
        let result = self.machine.handle_event(event);
        match &result {
            TransitionResult::Ok(to) if *to != from => {
                info!("Machine state {} -> {} ({event:?})", from.name(), to.name());
            }
            TransitionResult::Ok(_) | TransitionResult::Ignored => {
                debug!("Machine state {} unchanged by {event:?}", from.name());
            }
            TransitionResult::Rejected(reason) => {
                debug!("Machine event {event:?} rejected: {reason}");
            }
        }
        result
    }

    // ─── Executor Events ────────────────────────────────────────────

    /// Drain executor events, advance the sub-state machines, finish
    /// END_HOLD and count status ticks. Never blocks.
    pub fn tick(&mut self) {
        while let Some(event) = self.link.try_recv() {
            self.handle_executor_event(event);
        }
        self.check_queue_drained();
        self.apply_latched_resume();
        if self.machine.state() == MachineState::EndHold {
            self.transition(MachineEvent::HoldReleased {
                blocks_queued: self.queued_blocks > 0,
            });
        }
        self.status_report_counter = self.status_report_counter.saturating_add(1);
    }

    fn handle_executor_event(&mut self, event: ExecutorEvent) {
        match event {
            ExecutorEvent::BlockComplete => match self.queued_blocks.checked_sub(1) {
                Some(remaining) => self.queued_blocks = remaining,
                None => warn!("BlockComplete with nothing queued"),
            },
            ExecutorEvent::SegmentBoundary => {
                self.feedhold_event(FeedholdEvent::SegmentBoundary);
            }
            ExecutorEvent::HoldPlanned => {
                self.feedhold_event(FeedholdEvent::HoldPlanned);
            }
            ExecutorEvent::MotionStopped => {
                self.feedhold_event(FeedholdEvent::MotionStopped);
            }
            ExecutorEvent::RuntimePosition(position) => {
                self.runtime_position = AxisVector(position);
            }
            ExecutorEvent::HomingAxisComplete { axis } => self.homing_callback(axis, true),
            ExecutorEvent::HomingAxisFailed { axis } => self.homing_callback(axis, false),
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────

    /// The active model.
    #[inline]
    pub fn active(&self) -> &GCodeState {
        &self.active
    }

    #[inline]
    pub fn next_action(&self) -> NextAction {
        self.active.next_action
    }

    #[inline]
    pub fn motion_mode(&self) -> MotionMode {
        self.active.motion_mode
    }

    #[inline]
    pub fn machine_state(&self) -> MachineState {
        self.machine.state()
    }

    #[inline]
    pub fn feedhold_state(&self) -> FeedholdState {
        self.feedhold.state()
    }

    #[inline]
    pub fn homing_state(&self) -> HomingState {
        self.homing_state
    }

    #[inline]
    pub fn plane(&self) -> Plane {
        self.active.plane
    }

    #[inline]
    pub fn path_control(&self) -> PathControl {
        self.active.path_control
    }

    #[inline]
    pub fn coord_system(&self) -> CoordSystem {
        self.active.coord_system
    }

    #[inline]
    pub fn units_mode(&self) -> UnitsMode {
        self.active.units_mode
    }

    #[inline]
    pub fn distance_mode(&self) -> DistanceMode {
        self.active.distance_mode
    }

    #[inline]
    pub fn linecount(&self) -> u32 {
        self.linecount
    }

    #[inline]
    pub fn linenum(&self) -> u32 {
        self.linenum
    }

    #[inline]
    pub fn queued_blocks(&self) -> usize {
        self.queued_blocks
    }

    #[inline]
    pub fn offsets(&self) -> &CoordOffsetTable {
        &self.offsets
    }

    /// Work frame as the operator sees it.
    fn work_frame(&self) -> Frame {
        self.active.frame(&self.offsets).standing()
    }

    /// Total work offset of `axis` [mm].
    pub fn coord_offset(&self, axis: Axis) -> f64 {
        self.work_frame().offset(axis)
    }

    /// Model work position of `axis` in display units.
    pub fn model_work_position(&self, axis: Axis) -> f64 {
        self.model_work_position_vector()[axis]
    }

    /// Model work position in display units.
    pub fn model_work_position_vector(&self) -> AxisVector {
        let work = self.work_frame().work_from_machine(&self.active.position);
        self.to_display(&work)
    }

    /// Model position [mm, machine].
    #[inline]
    pub fn model_canonical_position_vector(&self) -> AxisVector {
        self.active.position
    }

    /// Target of the last block [mm, machine].
    #[inline]
    pub fn model_canonical_target(&self) -> AxisVector {
        self.active.target
    }

    /// Executor-reported position of `axis` [mm, machine].
    #[inline]
    pub fn runtime_machine_position(&self, axis: Axis) -> f64 {
        self.runtime_position[axis]
    }

    /// Executor-reported work position of `axis` in display units.
    pub fn runtime_work_position(&self, axis: Axis) -> f64 {
        let work = self.runtime_position[axis] - self.coord_offset(axis);
        axis_to_display(axis, work, self.active.units_mode)
    }

    pub(crate) fn runtime_position_vector(&self) -> AxisVector {
        self.runtime_position
    }

    fn to_display(&self, v: &AxisVector) -> AxisVector {
        let mut out = *v;
        for (axis, value) in v.iter() {
            out[axis] = axis_to_display(axis, value, self.active.units_mode);
        }
        out
    }

    pub(crate) fn machine_position_display(&self) -> AxisVector {
        self.to_display(&self.active.position)
    }

    /// Something is running or about to run.
    pub fn is_busy(&self) -> bool {
        self.machine.is_cycle_active()
            || self.queued_blocks > 0
            || self.drain.is_some()
            || self.feedhold.state() != FeedholdState::Off
            || self.homing_cycle.is_active()
            || self.return_home.is_active()
    }

    /// Axis the executor is homing, if a homing cycle is running.
    pub fn homing_axis(&self) -> Option<Axis> {
        match self.homing_cycle.phase() {
            HomingPhase::Searching { axis } => Some(axis),
            _ => None,
        }
    }

    // ─── Status & Settings ──────────────────────────────────────────

    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot::capture(self)
    }

    /// True once every `status_interval_ticks` ticks.
    pub fn status_report_due(&mut self) -> bool {
        if self.status_report_counter >= self.settings.status_interval_ticks {
            self.status_report_counter = 0;
            true
        } else {
            false
        }
    }

    /// Persistent changes since the last call, oldest first.
    pub fn drain_settings_changes(&mut self) -> Vec<SettingsChange> {
        std::mem::take(&mut self.settings_changes)
    }

    /// Restore the persisted homed flag at power-on.
    pub fn restore_homing_state(&mut self, persisted: u8) -> Result<(), CanonError> {
        match HomingState::from_u8(persisted) {
            Some(state @ (HomingState::NotHomed | HomingState::Homed)) => {
                self.homing_state = state;
                Ok(())
            }
            _ => Err(CanonError::InvalidValue {
                field: "homing_state",
                value: f64::from(persisted),
            }),
        }
    }

    /// Log a program comment.
    pub fn comment(&self, text: &str) {
        debug!("Comment: {text}");
    }

    /// Operator message from the program.
    pub fn message(&self, text: &str) {
        info!("Message: {text}");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::link::{self, ExecutorLink};

    pub(crate) fn machine() -> (CanonicalMachine, ExecutorLink) {
        let (canon, exec) = link::channel();
        (CanonicalMachine::new(&MachineConfig::default(), canon), exec)
    }

    #[test]
    fn power_on_state() {
        let (cm, _exec) = machine();
        assert_eq!(cm.machine_state(), MachineState::Reset);
        assert_eq!(cm.units_mode(), UnitsMode::Millimeters);
        assert_eq!(cm.coord_system(), CoordSystem::G54);
        assert!(!cm.is_busy());
        assert_eq!(cm.homing_state(), HomingState::NotHomed);
    }

    #[test]
    fn merge_counts_lines_and_takes_line_number() {
        let (mut cm, _exec) = machine();
        let mut block = cm.begin_block();
        block.set_line_number(120).set_units_mode(UnitsMode::Inches);
        let outcome = cm.merge_block(&block).unwrap();
        assert_eq!(outcome.linecount, 1);
        assert!(!outcome.queued);
        assert_eq!(cm.linenum(), 120);
        assert_eq!(cm.units_mode(), UnitsMode::Inches);
    }

    #[test]
    fn rejected_block_leaves_model_untouched() {
        let (mut cm, _exec) = machine();
        let before = cm.active().clone();
        let mut block = cm.begin_block();
        block
            .set_units_mode(UnitsMode::Inches)
            .set_motion_mode(MotionMode::StraightFeed)
            .set_axis(Axis::X, 1.0);
        assert_eq!(cm.merge_block(&block), Err(CanonError::MissingFeedRate));
        assert_eq!(cm.active(), &before);
        assert_eq!(cm.linecount(), 0);
    }

    #[test]
    fn status_report_interval() {
        let (mut cm, _exec) = machine();
        for _ in 0..canon_common::consts::DEFAULT_STATUS_INTERVAL_TICKS - 1 {
            cm.tick();
            assert!(!cm.status_report_due());
        }
        cm.tick();
        assert!(cm.status_report_due());
        assert!(!cm.status_report_due());
    }

    #[test]
    fn restore_homing_flag() {
        let (mut cm, _exec) = machine();
        assert!(cm.restore_homing_state(1).is_ok());
        assert_eq!(cm.homing_state(), HomingState::Homed);
        assert!(cm.restore_homing_state(2).is_err());
        assert_eq!(cm.homing_state(), HomingState::Homed);
    }

    #[test]
    fn runtime_position_from_executor() {
        let (mut cm, exec) = machine();
        exec.send(ExecutorEvent::RuntimePosition([1.0, 2.0, 3.0, 0.0, 0.0, 0.0]));
        cm.tick();
        assert_eq!(cm.runtime_machine_position(Axis::Y), 2.0);
        assert_eq!(cm.runtime_work_position(Axis::Z), 3.0);
    }
}
