//! Post-hoc serialization of independently planned trajectories.
//!
//! When agents plan without looking at each other, their routes can put two
//! agents on the same cell at the same tick. [`resolve_trajectories`] scans
//! the timeline tick by tick and, at each vertex collision, makes the
//! lower-priority agent wait (repeat its previous cell), then re-scans from
//! the affected tick because a wait can create a collision further down.
//!
//! Priority is slice order: index 0 never waits. An agent that has reached
//! the end of its trajectory stays parked on its last cell for the rest of
//! the timeline. Only vertex collisions at ticks after 0 are considered;
//! edge swaps are not.

use gridfleet_types::{AgentId, Position};
use gridfleet_world::{GridWorld, Path, PathFinder};
use tracing::{debug, warn};

use crate::error::ConflictError;

/// The cells one agent occupies at ticks `0, 1, 2, ...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trajectory {
    /// The agent following this trajectory.
    agent: AgentId,
    /// Occupied cell per tick; never empty.
    cells: Vec<Position>,
}

impl Trajectory {
    /// Build a trajectory from explicit cells.
    ///
    /// # Errors
    ///
    /// Returns [`ConflictError::EmptyTrajectory`] if `cells` is empty.
    pub fn new(agent: AgentId, cells: Vec<Position>) -> Result<Self, ConflictError> {
        if cells.is_empty() {
            return Err(ConflictError::EmptyTrajectory { agent });
        }
        Ok(Self { agent, cells })
    }

    /// Trajectory that follows `path` without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`ConflictError::EmptyTrajectory`] if `path` is empty.
    pub fn from_path(agent: AgentId, path: &Path) -> Result<Self, ConflictError> {
        Self::new(agent, path.cells().to_vec())
    }

    /// The agent.
    pub const fn agent(&self) -> AgentId {
        self.agent
    }

    /// Cells per tick.
    pub fn cells(&self) -> &[Position] {
        &self.cells
    }

    /// Number of ticks covered, including tick 0.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always `false` for a constructed trajectory.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Final cell.
    pub fn goal(&self) -> Option<Position> {
        self.cells.last().copied()
    }

    /// Cell occupied at `tick`; past the end the agent stays on its goal.
    pub fn at(&self, tick: usize) -> Option<Position> {
        self.cells.get(tick).or_else(|| self.cells.last()).copied()
    }

    /// Number of ticks spent standing still.
    pub fn wait_count(&self) -> usize {
        self.cells.windows(2).filter(|w| w.first() == w.get(1)).count()
    }

    /// Whether this trajectory is `route` with zero or more waits inserted.
    pub fn is_padding_of(&self, route: &[Position]) -> bool {
        let mut squashed = self.cells.clone();
        squashed.dedup();
        let mut original = route.to_vec();
        original.dedup();
        squashed == original
    }

    /// Repeat the cell before `index` at `index`, delaying everything after.
    fn insert_wait(&mut self, index: usize) {
        let Some(previous) = index.checked_sub(1).and_then(|i| self.cells.get(i)).copied() else {
            return;
        };
        if index <= self.cells.len() {
            self.cells.insert(index, previous);
        }
    }
}

/// A vertex collision found while scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collision {
    /// Tick of the collision.
    pub tick: usize,
    /// Shared cell.
    pub cell: Position,
    /// Slice index of the higher-priority trajectory.
    pub higher: usize,
    /// Slice index of the lower-priority trajectory.
    pub lower: usize,
}

/// One wait inserted by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wait {
    /// The agent made to wait.
    pub agent: AgentId,
    /// Index in its trajectory where the repeated cell was inserted.
    pub index: usize,
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Waits in the order they were inserted.
    pub waits: Vec<Wait>,
    /// Ticks until the last agent reaches its goal.
    pub makespan: usize,
}

/// Last tick index at which any trajectory still moves, plus one.
fn horizon(trajectories: &[Trajectory]) -> usize {
    trajectories.iter().map(Trajectory::len).max().unwrap_or(0)
}

/// First vertex collision at or after tick `from` (and after tick 0).
pub fn first_collision(trajectories: &[Trajectory], from: usize) -> Option<Collision> {
    for tick in from.max(1)..horizon(trajectories) {
        for (higher, a) in trajectories.iter().enumerate() {
            for (lower, b) in trajectories.iter().enumerate().skip(higher.saturating_add(1)) {
                let (Some(cell), Some(other)) = (a.at(tick), b.at(tick)) else {
                    continue;
                };
                if cell == other {
                    return Some(Collision {
                        tick,
                        cell,
                        higher,
                        lower,
                    });
                }
            }
        }
    }
    None
}

/// Whether no two trajectories share a cell at any tick after 0.
pub fn is_collision_free(trajectories: &[Trajectory]) -> bool {
    first_collision(trajectories, 1).is_none()
}

/// Insert waits until no two trajectories share a cell at the same tick.
///
/// A wait is inserted at the collision tick when repeating the previous
/// cell separates the pair. When the higher-priority agent is moving into
/// exactly that previous cell, the wait is moved earlier until it helps.
///
/// # Errors
///
/// - [`ConflictError::SharedGoal`] if two trajectories end on one cell.
/// - [`ConflictError::Unresolvable`] if no wait slot separates a pair.
/// - [`ConflictError::NotConverged`] if more than `Σ len × agent count`
///   waits would be needed.
pub fn resolve_trajectories(trajectories: &mut [Trajectory]) -> Result<Resolution, ConflictError> {
    for (i, a) in trajectories.iter().enumerate() {
        for b in trajectories.iter().skip(i.saturating_add(1)) {
            if let Some(cell) = a.goal().filter(|&cell| b.goal() == Some(cell)) {
                return Err(ConflictError::SharedGoal {
                    first: a.agent,
                    second: b.agent,
                    cell,
                });
            }
        }
    }

    let bound = trajectories
        .iter()
        .map(Trajectory::len)
        .fold(0_usize, usize::saturating_add)
        .saturating_mul(trajectories.len());
    let mut resolution = Resolution::default();
    let mut from = 1;

    while let Some(collision) = first_collision(trajectories, from) {
        if resolution.waits.len() >= bound {
            return Err(ConflictError::NotConverged {
                insertions: resolution.waits.len(),
            });
        }
        let Some(higher) = trajectories.get(collision.higher).cloned() else {
            break;
        };
        let Some(lower) = trajectories.get_mut(collision.lower) else {
            break;
        };

        let unresolvable = ConflictError::Unresolvable {
            agent: lower.agent,
            tick: collision.tick,
        };
        let mut index = collision.tick.min(lower.len().saturating_sub(1));
        if index == 0 {
            return Err(unresolvable);
        }
        while index
            .checked_sub(1)
            .and_then(|i| lower.at(i))
            .is_some_and(|held| Some(held) == higher.at(index))
        {
            if index <= 1 {
                return Err(unresolvable);
            }
            index = index.saturating_sub(1);
        }

        lower.insert_wait(index);
        debug!(
            agent = %lower.agent,
            tick = collision.tick,
            cell = %collision.cell,
            index,
            "wait inserted"
        );
        resolution.waits.push(Wait {
            agent: lower.agent,
            index,
        });
        from = index;
    }

    resolution.makespan = horizon(trajectories).saturating_sub(1);
    Ok(resolution)
}

/// Plan every `(agent, start, goal)` independently with heuristic search.
///
/// An agent whose goal is unreachable stays on its start cell.
pub fn plan_independent(
    grid: &GridWorld,
    requests: &[(AgentId, Position, Position)],
) -> Vec<Trajectory> {
    let finder = PathFinder::new(grid);
    requests
        .iter()
        .map(|&(agent, start, goal)| {
            let cells = finder.shortest_path_to(start, goal).map_or_else(
                || {
                    warn!(%agent, %start, %goal, "no route, agent stays put");
                    vec![start]
                },
                Path::into_cells,
            );
            Trajectory { agent, cells }
        })
        .collect()
}
