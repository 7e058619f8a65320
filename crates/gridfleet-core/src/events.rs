//! External task events applied after the agent phase of each tick.
//!
//! The engine does not know why tasks appear or vanish. A scenario plugs in
//! an [`EventFeed`] (fire spread, package arrivals, a fixed script) and the
//! tick driver applies whatever it returns to the pool once every agent has
//! moved. Spawns on blocked, out-of-bounds, or already-live cells are
//! dropped by the pool.

use std::collections::BTreeMap;

use gridfleet_agents::TaskPool;
use gridfleet_types::Position;
use gridfleet_world::GridWorld;

/// One change to the task pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskEvent {
    /// A new task appears on the cell.
    Spawn(Position),
    /// The task on the cell disappears without being credited.
    Remove(Position),
}

/// Source of dynamic task events.
///
/// Implementations see the grid and the pool as they stand after the agent
/// phase of `tick` and return the events to apply, in order.
pub trait EventFeed {
    /// Events for the tick that just ran its agent phase.
    fn events(&mut self, tick: u64, grid: &GridWorld, pool: &TaskPool) -> Vec<TaskEvent>;
}

/// A feed for static scenarios: never produces events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEvents;

impl EventFeed for NoEvents {
    fn events(&mut self, _tick: u64, _grid: &GridWorld, _pool: &TaskPool) -> Vec<TaskEvent> {
        Vec::new()
    }
}

/// A fixed schedule of events keyed by tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptedFeed {
    /// Events per tick, in application order.
    script: BTreeMap<u64, Vec<TaskEvent>>,
}

impl ScriptedFeed {
    /// An empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `event` for `tick` (builder form).
    #[must_use]
    pub fn at(mut self, tick: u64, event: TaskEvent) -> Self {
        self.push(tick, event);
        self
    }

    /// Schedule `event` for `tick`.
    pub fn push(&mut self, tick: u64, event: TaskEvent) {
        self.script.entry(tick).or_default().push(event);
    }
}

impl EventFeed for ScriptedFeed {
    fn events(&mut self, tick: u64, _grid: &GridWorld, _pool: &TaskPool) -> Vec<TaskEvent> {
        self.script.remove(&tick).unwrap_or_default()
    }
}

/// Counts of events that actually changed the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppliedEvents {
    /// Tasks added.
    pub spawned: u32,
    /// Tasks withdrawn.
    pub removed: u32,
}

/// Apply `events` to `pool` in order.
pub fn apply_events(grid: &GridWorld, pool: &mut TaskPool, events: &[TaskEvent]) -> AppliedEvents {
    let mut applied = AppliedEvents::default();
    for event in events {
        match *event {
            TaskEvent::Spawn(cell) => {
                if pool.spawn(grid, cell) {
                    applied.spawned = applied.spawned.saturating_add(1);
                }
            }
            TaskEvent::Remove(cell) => {
                if pool.remove(cell) {
                    applied.removed = applied.removed.saturating_add(1);
                }
            }
        }
    }
    applied
}
