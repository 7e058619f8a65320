//! Error types for the gridfleet-agents crate.
//!
//! All operations that can fail return typed errors rather than panicking.

use gridfleet_types::{AgentId, Position};

/// Errors that can occur when mutating agent state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    /// A route was handed to an agent that is not standing on its origin.
    #[error("route for {agent} starts at {origin:?} but the agent is at {position}")]
    RouteOriginMismatch {
        /// The agent receiving the route.
        agent: AgentId,
        /// Where the agent actually is.
        position: Position,
        /// First cell of the offered route.
        origin: Option<Position>,
    },

    /// A route was handed to an agent for a task it does not end on.
    #[error("route for {agent} ends at {goal:?}, not at task {task}")]
    RouteGoalMismatch {
        /// The agent receiving the route.
        agent: AgentId,
        /// The task the route is supposed to reach.
        task: Position,
        /// Last cell of the offered route.
        goal: Option<Position>,
    },
}

/// Errors from serializing independently planned trajectories.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConflictError {
    /// A trajectory has no cells at all.
    #[error("trajectory for {agent} is empty")]
    EmptyTrajectory {
        /// The agent with the empty trajectory.
        agent: AgentId,
    },

    /// Two agents finish on the same cell, so they would collide forever
    /// once both are parked.
    #[error("{first} and {second} both end at {cell}")]
    SharedGoal {
        /// Higher-priority agent.
        first: AgentId,
        /// Lower-priority agent.
        second: AgentId,
        /// The shared final cell.
        cell: Position,
    },

    /// No wait slot can separate the pair: the higher-priority agent passes
    /// through the lower-priority agent's start cell.
    #[error("cannot serialize {agent} around a collision at tick {tick}")]
    Unresolvable {
        /// The lower-priority agent that would have to wait.
        agent: AgentId,
        /// Tick of the collision.
        tick: usize,
    },

    /// The insertion bound was exceeded without reaching a collision-free
    /// schedule.
    #[error("no collision-free schedule after {insertions} waits")]
    NotConverged {
        /// Waits inserted before giving up.
        insertions: usize,
    },
}
