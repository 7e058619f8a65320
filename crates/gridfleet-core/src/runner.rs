//! Simulation loop runner.
//!
//! [`run_simulation`] wraps the single-tick [`run_tick`] function and keeps
//! calling it until a stop condition fires:
//!
//! - **Complete** -- every task resolved (checked before the first tick,
//!   so an empty initial pool never runs a tick);
//! - **Budget exhausted** -- the configured step budget is spent (a budget
//!   of zero ends the run before the first tick);
//! - **Stuck** -- a whole tick made no progress while tasks remain.
//!
//! Cancellation is simply not calling the runner again: state only ever
//! advances at tick boundaries.
//!
//! [`run_tick`]: crate::tick::run_tick

use gridfleet_types::{AgentId, StopReason, TickSnapshot};
use tracing::{info, warn};

use crate::events::EventFeed;
use crate::tick::{self, SimulationState, TickError, TickSummary};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Result of the simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub stop_reason: StopReason,
    /// Total number of ticks executed.
    pub total_ticks: u64,
    /// Tasks resolved per agent, in fleet order.
    pub completed_by_agent: Vec<(AgentId, u32)>,
    /// Tasks left in the pool.
    pub remaining_tasks: usize,
    /// Engine state when the run stopped.
    pub final_snapshot: TickSnapshot,
}

impl SimulationResult {
    /// Tasks resolved across the fleet.
    pub fn total_completed(&self) -> u64 {
        self.completed_by_agent
            .iter()
            .map(|&(_, count)| u64::from(count))
            .fold(0, u64::saturating_add)
    }
}

/// Callback invoked after each tick completes.
///
/// Implementations can use this to feed a renderer or record a replay. The
/// callback receives the tick summary and the current simulation state.
pub trait TickCallback {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, state: &SimulationState);
}

/// A no-op tick callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _state: &SimulationState) {}
}

/// Records every tick snapshot, starting with the initial state.
#[derive(Debug, Clone, Default)]
pub struct SnapshotRecorder {
    /// Recorded snapshots in tick order.
    frames: Vec<TickSnapshot>,
}

impl SnapshotRecorder {
    /// A recorder seeded with the state before the first tick.
    pub fn starting_from(state: &SimulationState) -> Self {
        Self {
            frames: vec![state.snapshot(Vec::new())],
        }
    }

    /// Recorded snapshots in tick order.
    pub fn frames(&self) -> &[TickSnapshot] {
        &self.frames
    }

    /// Consume the recorder and return its snapshots.
    pub fn into_frames(self) -> Vec<TickSnapshot> {
        self.frames
    }
}

impl TickCallback for SnapshotRecorder {
    fn on_tick(&mut self, summary: &TickSummary, _state: &SimulationState) {
        self.frames.push(summary.snapshot.clone());
    }
}

/// Build the result for a run that stopped with `stop_reason`.
fn finish(state: &SimulationState, stop_reason: StopReason, total_ticks: u64) -> SimulationResult {
    SimulationResult {
        stop_reason,
        total_ticks,
        completed_by_agent: state
            .agents()
            .iter()
            .map(|agent| (agent.id(), agent.completed()))
            .collect(),
        remaining_tasks: state.pool().len(),
        final_snapshot: state.snapshot(Vec::new()),
    }
}

/// Run the simulation loop until a stop condition is met.
///
/// # Arguments
///
/// * `state` - Mutable simulation state (grid, pool, fleet, clock)
/// * `feed` - Source of dynamic task events
/// * `callback` - Called after each tick
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick execution fails unrecoverably.
pub fn run_simulation(
    state: &mut SimulationState,
    feed: &mut dyn EventFeed,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut total_ticks: u64 = 0;

    info!(
        max_ticks = state.clock().budget(),
        agents = state.agents().len(),
        tasks = state.pool().len(),
        "Simulation starting"
    );

    if state.is_complete() {
        info!("No tasks to resolve");
        return Ok(finish(state, StopReason::Complete, total_ticks));
    }
    if state.clock().is_exhausted() {
        warn!("Step budget is zero, no tick executed");
        return Ok(finish(state, StopReason::BudgetExhausted, total_ticks));
    }

    loop {
        let summary = tick::run_tick(state, feed)?;
        total_ticks = total_ticks.saturating_add(1);

        callback.on_tick(&summary, state);

        if let Some(reason) = summary.stop {
            info!(tick = summary.tick, %reason, remaining = summary.remaining, "Stop condition reached");
            let mut result = finish(state, reason, total_ticks);
            result.final_snapshot = summary.snapshot;
            return Ok(result);
        }
    }
}

/// Log the end-of-run report.
pub fn log_simulation_end(result: &SimulationResult) {
    let resolved = result.total_completed();
    let total = resolved.saturating_add(u64::try_from(result.remaining_tasks).unwrap_or(u64::MAX));
    info!(
        reason = %result.stop_reason,
        total_ticks = result.total_ticks,
        "tasks resolved {resolved}/{total}"
    );
    for (agent, count) in &result.completed_by_agent {
        info!(%agent, completed = count, "Agent summary");
    }
    if !result.stop_reason.is_complete() {
        warn!(remaining = result.remaining_tasks, "Mission incomplete");
    }
}
