//! Enumeration types shared by the engine, its configuration, and its
//! snapshot consumers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// How idle agents choose their next task from the shared pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum AllocationPolicy {
    /// Nearest task by Manhattan distance; ties go to the lowest cell in
    /// row-major order. Several agents may chase the same task.
    #[default]
    GreedyNearest,
    /// Nearest task inside the agent's static region, falling back to the
    /// whole pool once the region is empty.
    Regioned,
    /// Nearest task among those not already held by another agent. Agents
    /// are served in fleet order, so lower ids win contested cells.
    ClaimWithConflictResolution,
    /// Tasks are handed out in the order they entered the pool, regardless
    /// of distance.
    FifoQueue,
}

/// Static partition of the grid used by [`AllocationPolicy::Regioned`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RegionScheme {
    /// Contiguous column bands of `width / k` columns; the last band takes
    /// the remainder.
    #[default]
    ColumnBands,
    /// Checkerboard generalized to `k` agents: region `(row + col) % k`.
    Parity,
    /// Row-major cell index modulo `k`.
    Striped,
}

/// When an agent recomputes its route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ReplanMode {
    /// Plan only when idle; an in-flight route is never abandoned for a
    /// closer task.
    #[default]
    OnIdleOnly,
    /// Every tick, search toward the whole candidate pool as a goal set and
    /// adopt the result when idle or when it is strictly shorter than the
    /// remaining route.
    #[serde(rename = "on_every_tick_toward_pool")]
    OnEveryTickTowardPoolAsGoalSet,
}

/// How agents treat each other during a live run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum CollisionMode {
    /// Agents are transparent to each other and may share a cell.
    #[default]
    Ignore,
    /// Routes avoid other agents' current cells and an agent waits instead
    /// of stepping into an occupied cell.
    Inline,
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum StopReason {
    /// The pool is empty and no agent holds an in-flight task.
    Complete,
    /// The tick counter reached the configured step budget.
    BudgetExhausted,
    /// A full tick passed with no movement, no claim and no committed route
    /// while tasks remain: everything left is unreachable.
    Stuck,
}

impl StopReason {
    /// Whether every task was resolved.
    pub const fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl core::fmt::Display for StopReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Complete => "complete",
            Self::BudgetExhausted => "budget exhausted",
            Self::Stuck => "stuck",
        };
        f.write_str(label)
    }
}

/// What an agent did on the most recent tick, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum AgentStatus {
    /// No task and no remaining route.
    #[default]
    Idle,
    /// Following a committed route toward a task.
    EnRoute,
    /// Stood still this tick because the next cell was occupied.
    Waiting,
    /// Claimed a task this tick.
    Arrived,
}

/// The ten scenario presets that wrap the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ScenarioKind {
    /// Two cleaners split the floor by column bands and remove dirt.
    #[default]
    Cleaning,
    /// Drones fly to packages, greedy nearest.
    Delivery,
    /// Firefighters chase fires that keep spreading.
    Firefighting,
    /// Two painters split cells by checkerboard parity.
    Painting,
    /// Explorers visit every open cell of their column band.
    Exploration,
    /// Agents collect keys in a maze, resolving contested claims.
    MazeKeys,
    /// Two agents plan independently and are serialized afterwards.
    PathPlanning,
    /// A rescue squad always heads for the nearest victim by path length.
    Rescue,
    /// Miners take resource sites from a FIFO queue.
    Mining,
    /// Warehouse robots pick items, greedy nearest.
    Warehouse,
}

impl ScenarioKind {
    /// Every preset, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Cleaning,
        Self::Delivery,
        Self::Firefighting,
        Self::Painting,
        Self::Exploration,
        Self::MazeKeys,
        Self::PathPlanning,
        Self::Rescue,
        Self::Mining,
        Self::Warehouse,
    ];
}
