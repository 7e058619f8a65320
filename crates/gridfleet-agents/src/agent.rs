//! Agent state and one-cell-per-tick movement.
//!
//! An [`Agent`] is either [`Assignment::Idle`] or [`Assignment::EnRoute`]
//! toward a task along a committed route. The route is stored as the
//! remaining cells with the head equal to the agent's current position, so
//! a route of length one means the agent is standing on its destination.
//!
//! Only the simulation tick driver mutates agents. History is kept purely
//! for display and may be capped; nothing in the engine reads it back.

use std::collections::{BTreeMap, VecDeque};

use gridfleet_types::{AgentId, AgentSnapshot, AgentStatus, Position};
use gridfleet_world::Path;

use crate::error::AgentError;

/// What an agent is currently committed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    /// No task and no remaining route.
    Idle,
    /// Heading for `task` along `route` (head = current cell).
    EnRoute {
        /// The task cell at the end of the route.
        task: Position,
        /// Remaining cells, current cell first.
        route: VecDeque<Position>,
    },
}

/// Visited cells, oldest first, optionally capped to the most recent `limit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    /// Stored cells.
    cells: VecDeque<Position>,
    /// Maximum number of cells kept; `None` keeps everything.
    limit: Option<usize>,
}

impl History {
    /// An empty history with the given cap.
    pub const fn new(limit: Option<usize>) -> Self {
        Self {
            cells: VecDeque::new(),
            limit,
        }
    }

    /// Append a cell, evicting the oldest entries beyond the cap.
    pub fn push(&mut self, cell: Position) {
        self.cells.push_back(cell);
        if let Some(limit) = self.limit {
            while self.cells.len() > limit {
                self.cells.pop_front();
            }
        }
    }

    /// Stored cells, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells.iter().copied()
    }

    /// Number of stored cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A mobile agent on the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    /// Stable identity; also the agent's priority (lower wins).
    id: AgentId,
    /// Current cell.
    position: Position,
    /// Current commitment.
    assignment: Assignment,
    /// What happened to this agent on the latest tick.
    status: AgentStatus,
    /// Visited cells for trail rendering.
    history: History,
    /// Tasks resolved by this agent.
    completed: u32,
    /// Tasks found unreachable, mapped to the first tick they may be
    /// retried.
    skipped: BTreeMap<Position, u64>,
}

impl Agent {
    /// Create an idle agent at `start`.
    pub fn new(id: AgentId, start: Position, history_limit: Option<usize>) -> Self {
        let mut history = History::new(history_limit);
        history.push(start);
        Self {
            id,
            position: start,
            assignment: Assignment::Idle,
            status: AgentStatus::Idle,
            history,
            completed: 0,
            skipped: BTreeMap::new(),
        }
    }

    // -------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------

    /// The agent's identifier.
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Current cell.
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Current commitment.
    pub const fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// What happened on the latest tick.
    pub const fn status(&self) -> AgentStatus {
        self.status
    }

    /// The task this agent is heading for.
    pub const fn task(&self) -> Option<Position> {
        match &self.assignment {
            Assignment::Idle => None,
            Assignment::EnRoute { task, .. } => Some(*task),
        }
    }

    /// Remaining route cells, current cell first. Empty when idle.
    pub fn route(&self) -> Vec<Position> {
        match &self.assignment {
            Assignment::Idle => Vec::new(),
            Assignment::EnRoute { route, .. } => route.iter().copied().collect(),
        }
    }

    /// Number of moves left on the committed route.
    pub fn remaining_moves(&self) -> usize {
        match &self.assignment {
            Assignment::Idle => 0,
            Assignment::EnRoute { route, .. } => route.len().saturating_sub(1),
        }
    }

    /// The next cell on the route, if the agent still has to move.
    pub fn next_cell(&self) -> Option<Position> {
        match &self.assignment {
            Assignment::Idle => None,
            Assignment::EnRoute { route, .. } => route.get(1).copied(),
        }
    }

    /// Idle: no task held and nothing left to traverse.
    pub const fn is_idle(&self) -> bool {
        matches!(self.assignment, Assignment::Idle)
    }

    /// Whether the agent has at least one move left on a route.
    pub fn has_committed_route(&self) -> bool {
        self.remaining_moves() > 0
    }

    /// Tasks resolved so far.
    pub const fn completed(&self) -> u32 {
        self.completed
    }

    /// Visited cells, oldest first.
    pub const fn history(&self) -> &History {
        &self.history
    }

    // -------------------------------------------------------------------
    // Commitment
    // -------------------------------------------------------------------

    /// Commit to `task` along `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::RouteOriginMismatch`] if the path does not start
    /// at the agent's position, or [`AgentError::RouteGoalMismatch`] if it
    /// does not end at `task`.
    pub fn assign(&mut self, task: Position, path: Path) -> Result<(), AgentError> {
        if path.origin() != Some(self.position) {
            return Err(AgentError::RouteOriginMismatch {
                agent: self.id,
                position: self.position,
                origin: path.origin(),
            });
        }
        if path.goal() != Some(task) {
            return Err(AgentError::RouteGoalMismatch {
                agent: self.id,
                task,
                goal: path.goal(),
            });
        }
        self.assignment = Assignment::EnRoute {
            task,
            route: path.into_cells().into(),
        };
        self.status = AgentStatus::EnRoute;
        Ok(())
    }

    /// Drop the current task and route.
    pub fn release(&mut self) {
        self.assignment = Assignment::Idle;
    }

    /// Keep the task but forget the route, so it is searched again on the
    /// agent's next turn.
    pub fn drop_route(&mut self) {
        if let Assignment::EnRoute { route, .. } = &mut self.assignment {
            route.clear();
            route.push_back(self.position);
        }
    }

    // -------------------------------------------------------------------
    // Per-tick mechanics
    // -------------------------------------------------------------------

    /// Reset the display status at the start of a tick.
    pub fn begin_tick(&mut self) {
        self.status = if self.is_idle() {
            AgentStatus::Idle
        } else {
            AgentStatus::EnRoute
        };
    }

    /// Advance one cell along the route.
    ///
    /// Moves only when more than one route cell remains; returns whether the
    /// agent moved. There are no diagonal moves, jumps or partial moves.
    pub fn step(&mut self) -> bool {
        let Assignment::EnRoute { route, .. } = &mut self.assignment else {
            return false;
        };
        if route.len() <= 1 {
            return false;
        }
        route.pop_front();
        let Some(&next) = route.front() else {
            return false;
        };
        self.position = next;
        self.history.push(next);
        true
    }

    /// Record that the agent stood still because its next cell was taken.
    pub fn wait(&mut self) {
        self.status = AgentStatus::Waiting;
    }

    /// Record a resolved task.
    ///
    /// If `task` is the agent's own target the agent becomes idle; a task
    /// picked up in passing leaves the commitment untouched.
    pub fn complete(&mut self, task: Position) {
        self.completed = self.completed.saturating_add(1);
        self.status = AgentStatus::Arrived;
        if self.task() == Some(task) {
            self.assignment = Assignment::Idle;
        }
    }

    // -------------------------------------------------------------------
    // Unreachable-task bookkeeping
    // -------------------------------------------------------------------

    /// Skip `task` until `retry_at`.
    pub fn skip(&mut self, task: Position, retry_at: u64) {
        self.skipped.insert(task, retry_at);
    }

    /// Whether `task` is currently skipped at `tick`.
    pub fn is_skipped(&self, task: Position, tick: u64) -> bool {
        self.skipped.get(&task).is_some_and(|&retry_at| tick < retry_at)
    }

    /// Forget skips that have expired by `tick`.
    pub fn expire_skips(&mut self, tick: u64) {
        self.skipped.retain(|_, retry_at| tick < *retry_at);
    }

    /// Display snapshot of this agent.
    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            position: self.position,
            status: self.status,
            task: self.task(),
            route: self.route(),
            trail: self.history.iter().collect(),
            completed: self.completed,
        }
    }
}
