//! Per-tick snapshots handed to the rendering/reporting consumer.
//!
//! A snapshot is a pure read of engine state. The engine never depends on
//! how, or whether, it is displayed.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::AgentStatus;
use crate::ids::AgentId;
use crate::position::Position;

/// One agent as seen at the end of a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AgentSnapshot {
    /// The agent.
    pub id: AgentId,
    /// Current cell.
    pub position: Position,
    /// What the agent did this tick.
    pub status: AgentStatus,
    /// The task the agent is heading for, if any.
    pub task: Option<Position>,
    /// Remaining route, head first (the head is the current cell).
    pub route: Vec<Position>,
    /// Visited cells kept for trail rendering, oldest first.
    pub trail: Vec<Position>,
    /// Number of tasks this agent has resolved so far.
    pub completed: u32,
}

/// A task resolved during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TaskClaim {
    /// The agent that resolved the task.
    pub agent: AgentId,
    /// The task cell.
    pub position: Position,
}

/// Complete engine state at the end of a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TickSnapshot {
    /// The tick that just finished (0 = initial state).
    pub tick: u64,
    /// Every agent in fleet order.
    pub agents: Vec<AgentSnapshot>,
    /// Live task cells in row-major order.
    pub tasks: Vec<Position>,
    /// Tasks resolved during this tick, in the order they were claimed.
    pub claims: Vec<TaskClaim>,
}

impl TickSnapshot {
    /// Look up an agent's snapshot by id.
    pub fn agent(&self, id: AgentId) -> Option<&AgentSnapshot> {
        self.agents.iter().find(|a| a.id == id)
    }
}
