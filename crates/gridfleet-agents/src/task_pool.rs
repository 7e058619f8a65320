//! The shared pool of unclaimed tasks.
//!
//! A task is nothing more than a cell: at most one live task may sit on a
//! cell at a time. The pool remembers the order in which tasks entered so
//! the FIFO allocation policy can hand them out first-come first-served.

use std::collections::{BTreeSet, VecDeque};

use gridfleet_types::{AgentId, Position};
use gridfleet_world::GridWorld;
use tracing::{debug, trace};

/// Live task cells plus their arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPool {
    /// Live task cells.
    live: BTreeSet<Position>,
    /// Live task cells in arrival order.
    arrivals: VecDeque<Position>,
    /// Tasks claimed by agents since construction.
    claimed: u64,
    /// Tasks withdrawn by the event feed since construction.
    withdrawn: u64,
}

impl TaskPool {
    /// An empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// A pool holding `tasks` in the given order. Duplicates are dropped.
    ///
    /// Cells are not validated against a grid here; the simulation state
    /// checks them at setup.
    pub fn from_tasks<I: IntoIterator<Item = Position>>(tasks: I) -> Self {
        let mut pool = Self::new();
        for task in tasks {
            pool.insert(task);
        }
        pool
    }

    fn insert(&mut self, task: Position) -> bool {
        if self.live.insert(task) {
            self.arrivals.push_back(task);
            true
        } else {
            false
        }
    }

    fn forget(&mut self, task: Position) -> bool {
        if self.live.remove(&task) {
            self.arrivals.retain(|&cell| cell != task);
            true
        } else {
            false
        }
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// Every live task cell in row-major order.
    pub const fn peek_all(&self) -> &BTreeSet<Position> {
        &self.live
    }

    /// Live task cells in arrival order.
    pub fn arrival_order(&self) -> impl Iterator<Item = Position> + '_ {
        self.arrivals.iter().copied()
    }

    /// Whether a live task sits on `cell`.
    pub fn contains(&self, cell: Position) -> bool {
        self.live.contains(&cell)
    }

    /// Whether no task remains.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Number of live tasks.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Tasks resolved by agents so far.
    pub const fn claimed_count(&self) -> u64 {
        self.claimed
    }

    /// Tasks withdrawn by external events so far.
    pub const fn withdrawn_count(&self) -> u64 {
        self.withdrawn
    }

    // -------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------

    /// Resolve the task at `cell` on behalf of `agent`.
    ///
    /// Returns `false` without side effects if no task is there, so a claim
    /// racing an earlier claim on the same cell is harmless.
    pub fn claim(&mut self, agent: AgentId, cell: Position) -> bool {
        if !self.forget(cell) {
            trace!(%agent, %cell, "claim on empty cell ignored");
            return false;
        }
        self.claimed = self.claimed.saturating_add(1);
        debug!(%agent, %cell, remaining = self.live.len(), "task claimed");
        true
    }

    /// Add a dynamic task at `cell`.
    ///
    /// Ignored (returns `false`) if the cell is outside the grid, blocked,
    /// or already holds a task.
    pub fn spawn(&mut self, grid: &GridWorld, cell: Position) -> bool {
        if !grid.is_traversable(cell) {
            trace!(%cell, "spawn on non-traversable cell ignored");
            return false;
        }
        self.insert(cell)
    }

    /// Withdraw the task at `cell` without crediting any agent.
    pub fn remove(&mut self, cell: Position) -> bool {
        if self.forget(cell) {
            self.withdrawn = self.withdrawn.saturating_add(1);
            true
        } else {
            false
        }
    }
}
