//! Tick cycle: one synchronous step of the whole fleet.
//!
//! Each tick runs through these phases:
//!
//! 1. **Advance** -- bump the [`StepClock`].
//! 2. **Agent turns** -- for every agent in fleet order:
//!    release a held task that no longer exists, plan (allocate a task and
//!    search a route) when the replan mode calls for it, take one step, then
//!    claim any live task under the agent.
//! 3. **Events** -- apply the [`EventFeed`] output to the pool.
//! 4. **Settle** -- release holders of vanished tasks, evaluate the stop
//!    conditions, and build the snapshot.
//!
//! Agents are processed one at a time because later agents see the claims
//! and reservations of earlier ones. The cycle is deterministic given the
//! same initial state and event feed.

use std::collections::BTreeSet;

use gridfleet_agents::{Agent, AgentError, Allocator, TaskPool};
use gridfleet_types::{
    AgentId, AllocationPolicy, CollisionMode, Position, ReplanMode, StopReason, TaskClaim,
    TickSnapshot,
};
use gridfleet_world::{GridWorld, Path, PathFinder};
use tracing::{debug, info, trace};

use crate::clock::{ClockError, StepClock};
use crate::config::{ConfigError, EngineConfig};
use crate::events::{self, AppliedEvents, EventFeed};

/// Errors that reject an initial state before any tick runs.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// The engine configuration failed validation.
    #[error("invalid engine config: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// No agents were supplied.
    #[error("a simulation needs at least one agent")]
    NoAgents,

    /// More agents than identifiers.
    #[error("{count} agents exceed the supported fleet size")]
    FleetTooLarge {
        /// Number of starts supplied.
        count: usize,
    },

    /// An agent would start outside the grid or on a wall.
    #[error("{agent} starts on {position}, which is not an open cell")]
    BlockedStart {
        /// The offending agent.
        agent: AgentId,
        /// Its start cell.
        position: Position,
    },

    /// A task sits outside the grid or on a wall.
    #[error("task at {position} is not on an open cell")]
    BlockedTask {
        /// The offending task cell.
        position: Position,
    },
}

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// A route could not be committed to an agent.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Agents that advanced one cell.
    pub moved: u32,
    /// Agents that stood still because their next cell was occupied.
    pub waited: u32,
    /// Route searches that came back empty and put a task on a skip list.
    pub unreachable: u32,
    /// Tasks resolved this tick, in claim order.
    pub claims: Vec<TaskClaim>,
    /// Pool changes made by the event feed.
    pub events: AppliedEvents,
    /// Live tasks after the tick.
    pub remaining: usize,
    /// Set when this tick ended the run.
    pub stop: Option<StopReason>,
    /// Engine state at the end of the tick.
    pub snapshot: TickSnapshot,
}

/// Per-tick counters accumulated across agent turns.
#[derive(Debug, Default)]
struct Tally {
    /// Agents that moved.
    moved: u32,
    /// Agents that waited.
    waited: u32,
    /// Set when an agent waited on a route planned before this tick; its
    /// next search sees the current positions and may find a way around.
    stale_wait: bool,
    /// Failed searches.
    unreachable: u32,
    /// Claims in order.
    claims: Vec<TaskClaim>,
}

/// Read-only inputs to one agent's planning step.
struct PlanContext<'a> {
    /// The map.
    grid: &'a GridWorld,
    /// Live tasks.
    pool: &'a TaskPool,
    /// Candidate ranking.
    allocator: &'a Allocator,
    /// Fleet slot of the planning agent.
    slot: u32,
    /// Tasks other agents are heading for.
    reserved: &'a BTreeSet<Position>,
    /// Cells of other agents, populated only in inline collision mode.
    occupied: &'a BTreeSet<Position>,
    /// Current tick.
    tick: u64,
    /// Skip cooldown.
    retry_ticks: u64,
}

impl PlanContext<'_> {
    /// Route from `start` to `goal`, around other agents when possible.
    fn route_to(&self, start: Position, goal: Position) -> Option<Path> {
        let plain = PathFinder::new(self.grid);
        if self.occupied.is_empty() {
            return plain.shortest_path_to(start, goal);
        }
        plain
            .avoiding(self.occupied)
            .shortest_path_to(start, goal)
            .or_else(|| plain.shortest_path_to(start, goal))
    }

    /// Route from `start` to the nearest of `goals`, around other agents
    /// when possible.
    fn route_to_any(&self, start: Position, goals: &BTreeSet<Position>) -> Option<Path> {
        let plain = PathFinder::new(self.grid);
        if self.occupied.is_empty() {
            return plain.shortest_path(start, goals);
        }
        plain
            .avoiding(self.occupied)
            .shortest_path(start, goals)
            .or_else(|| plain.shortest_path(start, goals))
    }

    /// First tick at which a task skipped now may be retried.
    const fn retry_at(&self) -> u64 {
        self.tick.saturating_add(self.retry_ticks)
    }
}

/// The mutable simulation state passed through the tick cycle.
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// The map; never mutated once the run starts.
    grid: GridWorld,
    /// Live tasks.
    pool: TaskPool,
    /// The fleet in processing order; agent `i` has id `i`.
    agents: Vec<Agent>,
    /// Tick counter and step budget.
    clock: StepClock,
    /// Engine parameters.
    config: EngineConfig,
    /// Candidate ranking for the configured policy.
    allocator: Allocator,
}

impl SimulationState {
    /// Build the initial state: one agent per start cell, ids in order.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] if the config is invalid, there are no
    /// agents, or any start or task is not an open cell.
    pub fn new<I>(
        grid: GridWorld,
        tasks: I,
        starts: &[Position],
        config: EngineConfig,
    ) -> Result<Self, SetupError>
    where
        I: IntoIterator<Item = Position>,
    {
        config.validate()?;
        if starts.is_empty() {
            return Err(SetupError::NoAgents);
        }
        let fleet_size =
            u32::try_from(starts.len()).map_err(|_err| SetupError::FleetTooLarge {
                count: starts.len(),
            })?;

        let mut agents = Vec::with_capacity(starts.len());
        for (raw, &start) in (0..fleet_size).zip(starts) {
            let id = AgentId::new(raw);
            if !grid.is_traversable(start) {
                return Err(SetupError::BlockedStart {
                    agent: id,
                    position: start,
                });
            }
            agents.push(Agent::new(id, start, config.history_limit));
        }

        let pool = TaskPool::from_tasks(tasks);
        if let Some(&position) = pool.peek_all().iter().find(|&&t| !grid.is_traversable(t)) {
            return Err(SetupError::BlockedTask { position });
        }

        let allocator = Allocator::new(
            config.allocation,
            config.region_scheme,
            fleet_size,
            grid.width(),
        );
        info!(
            height = grid.height(),
            width = grid.width(),
            agents = fleet_size,
            tasks = pool.len(),
            policy = ?config.allocation,
            replan = ?config.replan_mode,
            collisions = ?config.collision_mode,
            "Simulation state built"
        );

        Ok(Self {
            grid,
            pool,
            agents,
            clock: StepClock::new(config.max_ticks),
            config,
            allocator,
        })
    }

    // -------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------

    /// The map.
    pub const fn grid(&self) -> &GridWorld {
        &self.grid
    }

    /// Live tasks.
    pub const fn pool(&self) -> &TaskPool {
        &self.pool
    }

    /// The fleet in processing order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Look up one agent.
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        usize::try_from(id.into_inner())
            .ok()
            .and_then(|index| self.agents.get(index))
    }

    /// The step clock.
    pub const fn clock(&self) -> &StepClock {
        &self.clock
    }

    /// Engine parameters.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether every task is resolved and nobody is heading anywhere.
    pub fn is_complete(&self) -> bool {
        self.pool.is_empty() && self.agents.iter().all(Agent::is_idle)
    }

    /// Snapshot of the current state.
    pub fn snapshot(&self, claims: Vec<TaskClaim>) -> TickSnapshot {
        TickSnapshot {
            tick: self.clock.tick(),
            agents: self.agents.iter().map(Agent::snapshot).collect(),
            tasks: self.pool.peek_all().iter().copied().collect(),
            claims,
        }
    }

    // -------------------------------------------------------------------
    // Turn helpers
    // -------------------------------------------------------------------

    /// Tasks held by every agent except the one in `slot`.
    fn reserved_except(&self, slot: usize) -> BTreeSet<Position> {
        if self.config.allocation != AllocationPolicy::ClaimWithConflictResolution {
            return BTreeSet::new();
        }
        self.agents
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != slot)
            .filter_map(|(_, agent)| agent.task())
            .collect()
    }

    /// Cells of every agent except the one in `slot` (inline mode only).
    fn occupied_except(&self, slot: usize) -> BTreeSet<Position> {
        if self.config.collision_mode != CollisionMode::Inline {
            return BTreeSet::new();
        }
        self.agents
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != slot)
            .map(|(_, agent)| agent.position())
            .collect()
    }

    /// Release every agent whose task has left the pool.
    fn release_vanished(&mut self) {
        for agent in &mut self.agents {
            if agent.task().is_some_and(|task| !self.pool.contains(task)) {
                debug!(agent = %agent.id(), "held task vanished, releasing");
                agent.release();
            }
        }
    }

    /// Run one agent's turn.
    fn take_turn(&mut self, slot: usize, tally: &mut Tally) -> Result<(), TickError> {
        let reserved = self.reserved_except(slot);
        let occupied = self.occupied_except(slot);
        let fleet_slot = u32::try_from(slot).unwrap_or(u32::MAX);
        let tick = self.clock.tick();
        let replan_mode = self.config.replan_mode;

        let Some(agent) = self.agents.get_mut(slot) else {
            return Ok(());
        };
        agent.begin_tick();
        agent.expire_skips(tick);

        // Release.
        if agent.task().is_some_and(|task| !self.pool.contains(task)) {
            debug!(agent = %agent.id(), tick, "held task vanished, releasing");
            agent.release();
        }

        let carried_route = agent.has_committed_route();

        // Plan.
        let ctx = PlanContext {
            grid: &self.grid,
            pool: &self.pool,
            allocator: &self.allocator,
            slot: fleet_slot,
            reserved: &reserved,
            occupied: &occupied,
            tick,
            retry_ticks: self.config.unreachable_retry_ticks,
        };
        tally.unreachable = tally.unreachable.saturating_add(match replan_mode {
            ReplanMode::OnIdleOnly => plan_on_idle(agent, &ctx)?,
            ReplanMode::OnEveryTickTowardPoolAsGoalSet => plan_toward_pool(agent, &ctx)?,
        });

        // Step.
        if agent.next_cell().is_some_and(|next| occupied.contains(&next)) {
            trace!(agent = %agent.id(), "next cell occupied, waiting");
            agent.wait();
            agent.drop_route();
            tally.waited = tally.waited.saturating_add(1);
            tally.stale_wait |= carried_route;
        } else if agent.step() {
            tally.moved = tally.moved.saturating_add(1);
        }

        // Arrive.
        let here = agent.position();
        if self.pool.claim(agent.id(), here) {
            agent.complete(here);
            tally.claims.push(TaskClaim {
                agent: agent.id(),
                position: here,
            });
        }
        Ok(())
    }

    /// First matching stop condition after a tick.
    fn evaluate_stop(&self, tally: &Tally) -> Option<StopReason> {
        if self.is_complete() {
            return Some(StopReason::Complete);
        }
        if self.clock.is_exhausted() {
            return Some(StopReason::BudgetExhausted);
        }
        // Agents that waited out a blocked cell keep their task but hold no
        // route, so a head-on deadlock in inline mode counts as stalled.
        let stalled = tally.moved == 0
            && tally.claims.is_empty()
            && !tally.stale_wait
            && !self.agents.iter().any(Agent::has_committed_route)
            && !self.pool.is_empty();
        stalled.then_some(StopReason::Stuck)
    }
}

/// Plan for an agent that only replans when it has no route.
///
/// Returns the number of candidates found unreachable.
fn plan_on_idle(agent: &mut Agent, ctx: &PlanContext<'_>) -> Result<u32, TickError> {
    let origin = agent.position();
    let mut unreachable = 0_u32;

    // A held task whose route was dropped (after a wait) is routed again.
    if let Some(task) = agent.task() {
        if agent.has_committed_route() || task == origin {
            return Ok(0);
        }
        if let Some(path) = ctx.route_to(origin, task) {
            agent.assign(task, path)?;
            return Ok(0);
        }
        agent.skip(task, ctx.retry_at());
        agent.release();
        unreachable = 1;
    }

    let candidates = ctx
        .allocator
        .candidates(ctx.slot, origin, ctx.pool, ctx.reserved, |task| {
            agent.is_skipped(task, ctx.tick)
        });
    for task in candidates {
        if let Some(path) = ctx.route_to(origin, task) {
            debug!(
                agent = %agent.id(),
                %task,
                moves = path.edge_count(),
                "task allocated"
            );
            agent.assign(task, path)?;
            return Ok(unreachable);
        }
        debug!(agent = %agent.id(), %task, retry_at = ctx.retry_at(), "task unreachable, skipping");
        agent.skip(task, ctx.retry_at());
        unreachable = unreachable.saturating_add(1);
    }
    Ok(unreachable)
}

/// Plan toward the whole candidate pool as one goal set, every tick.
///
/// The result replaces the current route when the agent has none or when
/// it is strictly shorter. Returns the number of candidates found
/// unreachable.
fn plan_toward_pool(agent: &mut Agent, ctx: &PlanContext<'_>) -> Result<u32, TickError> {
    let origin = agent.position();
    let goals: BTreeSet<Position> = ctx
        .allocator
        .candidates(ctx.slot, origin, ctx.pool, ctx.reserved, |task| {
            agent.is_skipped(task, ctx.tick)
        })
        .into_iter()
        .collect();
    if goals.is_empty() {
        return Ok(0);
    }

    let Some(path) = ctx.route_to_any(origin, &goals) else {
        if agent.has_committed_route() {
            return Ok(0);
        }
        debug!(agent = %agent.id(), candidates = goals.len(), "no candidate reachable, skipping all");
        for &task in &goals {
            agent.skip(task, ctx.retry_at());
        }
        if agent.task().is_some_and(|task| goals.contains(&task)) {
            agent.release();
        }
        return Ok(u32::try_from(goals.len()).unwrap_or(u32::MAX));
    };

    let Some(goal) = path.goal() else {
        return Ok(0);
    };
    if !agent.has_committed_route() || path.edge_count() < agent.remaining_moves() {
        trace!(agent = %agent.id(), task = %goal, moves = path.edge_count(), "route toward pool");
        agent.assign(goal, path)?;
    }
    Ok(0)
}

/// Execute one complete tick of the simulation.
///
/// # Errors
///
/// Returns [`TickError::Clock`] if the tick counter overflows, or
/// [`TickError::Agent`] if a planned route does not fit its agent.
pub fn run_tick(
    state: &mut SimulationState,
    feed: &mut dyn EventFeed,
) -> Result<TickSummary, TickError> {
    // --- Advance ---
    let tick = state.clock.advance()?;
    trace!(tick, "Tick started");

    // --- Agent turns ---
    let mut tally = Tally::default();
    for slot in 0..state.agents.len() {
        state.take_turn(slot, &mut tally)?;
    }

    // --- Events ---
    let events = feed.events(tick, &state.grid, &state.pool);
    let applied = events::apply_events(&state.grid, &mut state.pool, &events);
    if applied != AppliedEvents::default() {
        debug!(tick, spawned = applied.spawned, removed = applied.removed, "events applied");
    }

    // --- Settle ---
    state.release_vanished();
    let stop = state.evaluate_stop(&tally);
    debug!(
        tick,
        moved = tally.moved,
        waited = tally.waited,
        claims = tally.claims.len(),
        remaining = state.pool.len(),
        "Tick finished"
    );

    let snapshot = state.snapshot(tally.claims.clone());
    Ok(TickSummary {
        tick,
        moved: tally.moved,
        waited: tally.waited,
        unreachable: tally.unreachable,
        claims: tally.claims,
        events: applied,
        remaining: state.pool.len(),
        stop,
        snapshot,
    })
}
