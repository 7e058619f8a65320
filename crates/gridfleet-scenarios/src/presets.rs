//! The ten scenario presets and the glue that turns one into a runnable
//! [`Scenario`].
//!
//! A preset fixes grid size, wall density, seed, fleet size and start
//! corners, how tasks are laid out, and the engine parameters the scenario
//! runs with. Any of the first few can be overridden from
//! [`ScenarioConfig`].
//!
//! | Preset         | Grid  | Walls | Fleet | Tasks               | Engine                      |
//! |----------------|-------|-------|-------|---------------------|-----------------------------|
//! | cleaning       | 12x12 | 0.10  | 2     | 30% of open cells   | regioned, column bands      |
//! | delivery       | 16x16 | 0.04  | 2     | 6 scattered         | greedy nearest              |
//! | firefighting   | 16x16 | 0.03  | 3     | 6 scattered, spread | greedy nearest              |
//! | painting       | 12x12 | 0.05  | 2     | 35% of open cells   | regioned, parity            |
//! | exploration    | 18x18 | 0.06  | 3     | every open cell     | regioned, column bands      |
//! | maze keys      | 15x15 | 0.18  | 2     | 8 scattered         | claim with conflict         |
//! | path planning  | 12x12 | 0.12  | 2     | one goal per agent  | post-hoc resolver           |
//! | rescue         | 15x15 | 0.10  | 3     | 6 scattered         | greedy, pool as goal set    |
//! | mining         | 14x14 | 0.07  | 3     | 10 scattered        | FIFO queue                  |
//! | warehouse      | 14x14 | 0.05  | 3     | 8 scattered         | greedy nearest              |

use gridfleet_agents::TaskPool;
use gridfleet_core::{EngineConfig, EventFeed, NoEvents, ScenarioConfig, TaskEvent};
use gridfleet_types::{
    AgentId, AllocationPolicy, CollisionMode, Position, RegionScheme, ReplanMode, ScenarioKind,
};
use gridfleet_world::GridWorld;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::error::ScenarioError;
use crate::fire::FireSpread;
use crate::generate::Corner::{NorthEast, NorthWest, SouthEast, SouthWest};
use crate::generate::{self, Corner, TaskLayout};

/// Ticks an agent ignores a task it found no route to.
const RETRY_TICKS: u64 = 10;

/// What the fleet is asked to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Objective {
    /// Work through a shared pool laid out like this.
    Tasks(TaskLayout),
    /// Each agent crosses to the cell mirrored across the middle row.
    MirroredGoals,
}

/// Fixed parameters of one scenario.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    /// Which scenario this is.
    pub kind: ScenarioKind,
    /// Grid rows.
    pub height: u32,
    /// Grid columns.
    pub width: u32,
    /// Chance that a cell is a wall.
    pub wall_density: f64,
    /// Generator seed.
    pub seed: u64,
    /// Number of agents.
    pub fleet: u32,
    /// Corner order for starts.
    pub corners: [Corner; 4],
    /// Distance of the first lap of starts from the corners.
    pub inset: u32,
    /// Task layout or per-agent goals.
    pub objective: Objective,
    /// Chance a fire ignites a neighbour per tick, for spreading scenarios.
    pub fire_spread: Option<f64>,
    /// Engine parameters the scenario runs with.
    pub engine: EngineConfig,
}

const fn engine(
    allocation: AllocationPolicy,
    region_scheme: RegionScheme,
    replan_mode: ReplanMode,
    max_ticks: u64,
) -> EngineConfig {
    EngineConfig {
        allocation,
        region_scheme,
        replan_mode,
        collision_mode: CollisionMode::Ignore,
        max_ticks,
        unreachable_retry_ticks: RETRY_TICKS,
        history_limit: None,
    }
}

const fn greedy(max_ticks: u64) -> EngineConfig {
    engine(
        AllocationPolicy::GreedyNearest,
        RegionScheme::ColumnBands,
        ReplanMode::OnIdleOnly,
        max_ticks,
    )
}

const fn regioned(region_scheme: RegionScheme, max_ticks: u64) -> EngineConfig {
    engine(
        AllocationPolicy::Regioned,
        region_scheme,
        ReplanMode::OnIdleOnly,
        max_ticks,
    )
}

impl Preset {
    /// The preset for `kind`.
    #[allow(clippy::too_many_lines)]
    pub const fn of(kind: ScenarioKind) -> Self {
        match kind {
            ScenarioKind::Cleaning => Self {
                kind,
                height: 12,
                width: 12,
                wall_density: 0.1,
                seed: 7,
                fleet: 2,
                corners: [NorthWest, SouthEast, NorthEast, SouthWest],
                inset: 0,
                objective: Objective::Tasks(TaskLayout::Sprinkle { probability: 0.3 }),
                fire_spread: None,
                engine: regioned(RegionScheme::ColumnBands, 400),
            },
            ScenarioKind::Delivery => Self {
                kind,
                height: 16,
                width: 16,
                wall_density: 0.04,
                seed: 99,
                fleet: 2,
                corners: [NorthWest, SouthEast, NorthEast, SouthWest],
                inset: 1,
                objective: Objective::Tasks(TaskLayout::Scatter { count: 6, margin: 1 }),
                fire_spread: None,
                engine: greedy(400),
            },
            ScenarioKind::Firefighting => Self {
                kind,
                height: 16,
                width: 16,
                wall_density: 0.03,
                seed: 21,
                fleet: 3,
                corners: [NorthWest, NorthEast, SouthEast, SouthWest],
                inset: 0,
                objective: Objective::Tasks(TaskLayout::Scatter { count: 6, margin: 3 }),
                fire_spread: Some(0.08),
                engine: greedy(300),
            },
            ScenarioKind::Painting => Self {
                kind,
                height: 12,
                width: 12,
                wall_density: 0.05,
                seed: 8,
                fleet: 2,
                corners: [NorthWest, SouthEast, NorthEast, SouthWest],
                inset: 0,
                objective: Objective::Tasks(TaskLayout::Sprinkle { probability: 0.35 }),
                fire_spread: None,
                engine: regioned(RegionScheme::Parity, 500),
            },
            ScenarioKind::Exploration => Self {
                kind,
                height: 18,
                width: 18,
                wall_density: 0.06,
                seed: 31,
                fleet: 3,
                corners: [NorthWest, NorthEast, SouthWest, SouthEast],
                inset: 1,
                objective: Objective::Tasks(TaskLayout::EveryOpenCell),
                fire_spread: None,
                engine: regioned(RegionScheme::ColumnBands, 800),
            },
            ScenarioKind::MazeKeys => Self {
                kind,
                height: 15,
                width: 15,
                wall_density: 0.18,
                seed: 42,
                fleet: 2,
                corners: [NorthWest, SouthEast, NorthEast, SouthWest],
                inset: 1,
                objective: Objective::Tasks(TaskLayout::Scatter { count: 8, margin: 0 }),
                fire_spread: None,
                engine: engine(
                    AllocationPolicy::ClaimWithConflictResolution,
                    RegionScheme::ColumnBands,
                    ReplanMode::OnIdleOnly,
                    500,
                ),
            },
            ScenarioKind::PathPlanning => Self {
                kind,
                height: 12,
                width: 12,
                wall_density: 0.12,
                seed: 5,
                fleet: 2,
                corners: [NorthWest, NorthEast, SouthWest, SouthEast],
                inset: 1,
                objective: Objective::MirroredGoals,
                fire_spread: None,
                engine: greedy(200),
            },
            ScenarioKind::Rescue => Self {
                kind,
                height: 15,
                width: 15,
                wall_density: 0.1,
                seed: 3,
                fleet: 3,
                corners: [NorthWest, NorthEast, SouthWest, SouthEast],
                inset: 0,
                objective: Objective::Tasks(TaskLayout::Scatter { count: 6, margin: 0 }),
                fire_spread: None,
                engine: engine(
                    AllocationPolicy::GreedyNearest,
                    RegionScheme::ColumnBands,
                    ReplanMode::OnEveryTickTowardPoolAsGoalSet,
                    400,
                ),
            },
            ScenarioKind::Mining => Self {
                kind,
                height: 14,
                width: 14,
                wall_density: 0.07,
                seed: 13,
                fleet: 3,
                corners: [NorthWest, SouthEast, SouthWest, NorthEast],
                inset: 0,
                objective: Objective::Tasks(TaskLayout::Scatter { count: 10, margin: 1 }),
                fire_spread: None,
                engine: engine(
                    AllocationPolicy::FifoQueue,
                    RegionScheme::ColumnBands,
                    ReplanMode::OnIdleOnly,
                    600,
                ),
            },
            ScenarioKind::Warehouse => Self {
                kind,
                height: 14,
                width: 14,
                wall_density: 0.05,
                seed: 11,
                fleet: 3,
                corners: [NorthWest, SouthWest, NorthEast, SouthEast],
                inset: 0,
                objective: Objective::Tasks(TaskLayout::Scatter { count: 8, margin: 1 }),
                fire_spread: None,
                engine: greedy(400),
            },
        }
    }
}

/// Event feed chosen by a scenario.
#[derive(Debug, Clone)]
pub enum ScenarioFeed {
    /// Static pool.
    Quiet,
    /// Fires keep spreading.
    Fire(Box<FireSpread>),
}

impl EventFeed for ScenarioFeed {
    fn events(&mut self, tick: u64, grid: &GridWorld, pool: &TaskPool) -> Vec<TaskEvent> {
        match self {
            Self::Quiet => NoEvents.events(tick, grid, pool),
            Self::Fire(fire) => fire.events(tick, grid, pool),
        }
    }
}

/// What a built scenario asks of its fleet.
#[derive(Debug, Clone)]
pub enum Mission {
    /// Run the engine over a shared task pool.
    Pool {
        /// Initial tasks in arrival order.
        tasks: Vec<Position>,
        /// Events applied after every agent phase.
        feed: ScenarioFeed,
    },
    /// Plan each agent to its own goal, then serialize the trajectories.
    Routes {
        /// Goal per agent, in fleet order.
        goals: Vec<Position>,
    },
}

/// A generated scenario, ready to hand to the engine.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Which preset it came from.
    pub kind: ScenarioKind,
    /// Seed the map and tasks were drawn with.
    pub seed: u64,
    /// The map.
    pub grid: GridWorld,
    /// Start cell per agent, in fleet order.
    pub starts: Vec<Position>,
    /// Tasks or goals.
    pub mission: Mission,
    /// Engine parameters.
    pub engine: EngineConfig,
}

impl Scenario {
    /// Generate the scenario `config.kind` with `config`'s overrides.
    ///
    /// Starts are always open. Tasks never sit on a start and are always
    /// reachable from at least one start.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError`] if the fleet does not fit, a probability
    /// is out of range, or the grid cannot be built.
    pub fn build(config: &ScenarioConfig) -> Result<Self, ScenarioError> {
        let preset = Preset::of(config.kind);
        let height = config.height.unwrap_or(preset.height);
        let width = config.width.unwrap_or(preset.width);
        let density = config.obstacle_density.unwrap_or(preset.wall_density);
        let seed = config.seed.unwrap_or(preset.seed);
        let fleet = config.agents.unwrap_or(preset.fleet);

        let mut rng = StdRng::seed_from_u64(seed);
        let starts = generate::corner_starts(height, width, &preset.corners, preset.inset, fleet)?;

        let (grid, mission) = match preset.objective {
            Objective::Tasks(layout) => {
                let grid = generate::random_walls(height, width, density, &starts, &mut rng)?;
                let layout = match (layout, config.task_count) {
                    (TaskLayout::Scatter { margin, .. }, Some(count)) => {
                        TaskLayout::Scatter { count, margin }
                    }
                    (other, _) => other,
                };
                let mut tasks = generate::place_tasks(&grid, layout, &starts, &mut rng)?;
                if let Some(cap) = config.task_count {
                    tasks.truncate(usize::try_from(cap).unwrap_or(usize::MAX));
                }
                let feed = match preset.fire_spread {
                    Some(probability) => {
                        ScenarioFeed::Fire(Box::new(FireSpread::new(probability, rng.random())?))
                    }
                    None => ScenarioFeed::Quiet,
                };
                (grid, Mission::Pool { tasks, feed })
            }
            Objective::MirroredGoals => {
                let goals: Vec<Position> = starts
                    .iter()
                    .map(|start| {
                        Position::new(height.saturating_sub(1).saturating_sub(start.row), start.col)
                    })
                    .collect();
                let mut keep_open = starts.clone();
                keep_open.extend_from_slice(&goals);
                let grid = generate::random_walls(height, width, density, &keep_open, &mut rng)?;
                (grid, Mission::Routes { goals })
            }
        };

        let scenario = Self {
            kind: config.kind,
            seed,
            grid,
            starts,
            mission,
            engine: preset.engine,
        };
        info!(
            kind = ?scenario.kind,
            seed,
            height,
            width,
            agents = fleet,
            open_cells = scenario.grid.open_count(),
            tasks = scenario.task_count(),
            "Scenario generated"
        );
        for (row, cells) in scenario.grid.to_ascii().iter().enumerate() {
            debug!(row, "{cells}");
        }
        Ok(scenario)
    }

    /// Replace the preset's engine parameters.
    #[must_use]
    pub const fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Initial tasks, or goals for a routing scenario.
    pub fn task_count(&self) -> usize {
        match &self.mission {
            Mission::Pool { tasks, .. } => tasks.len(),
            Mission::Routes { goals } => goals.len(),
        }
    }

    /// `(agent, start, goal)` per agent for a routing scenario; empty for a
    /// pool scenario.
    pub fn route_requests(&self) -> Vec<(AgentId, Position, Position)> {
        let Mission::Routes { goals } = &self.mission else {
            return Vec::new();
        };
        (0..)
            .map(AgentId::new)
            .zip(self.starts.iter().zip(goals))
            .map(|(agent, (&start, &goal))| (agent, start, goal))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn p(row: u32, col: u32) -> Position {
        Position::new(row, col)
    }

    fn build(kind: ScenarioKind) -> Scenario {
        Scenario::build(&ScenarioConfig {
            kind,
            ..ScenarioConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn every_preset_builds_a_valid_layout() {
        for kind in ScenarioKind::ALL {
            let scenario = build(kind);
            let preset = Preset::of(kind);
            assert_eq!(scenario.kind, kind);
            assert_eq!(scenario.seed, preset.seed);
            assert_eq!(scenario.grid.height(), preset.height);
            assert_eq!(scenario.engine, preset.engine);

            let starts: BTreeSet<Position> = scenario.starts.iter().copied().collect();
            assert_eq!(starts.len(), usize::try_from(preset.fleet).unwrap(), "{kind:?}");
            assert!(starts.iter().all(|s| scenario.grid.is_traversable(*s)));

            if let Mission::Pool { tasks, .. } = &scenario.mission {
                let distinct: BTreeSet<Position> = tasks.iter().copied().collect();
                assert_eq!(distinct.len(), tasks.len(), "{kind:?}");
                assert!(tasks.iter().all(|t| scenario.grid.is_traversable(*t)));
                assert!(tasks.iter().all(|t| !starts.contains(t)));
            }
        }
    }

    #[test]
    fn generation_is_seeded() {
        let first = build(ScenarioKind::MazeKeys);
        let second = build(ScenarioKind::MazeKeys);
        assert_eq!(first.grid, second.grid);
        assert_eq!(first.task_count(), second.task_count());
        if let (Mission::Pool { tasks: a, .. }, Mission::Pool { tasks: b, .. }) =
            (&first.mission, &second.mission)
        {
            assert_eq!(a, b);
        }

        let reseeded = Scenario::build(&ScenarioConfig {
            kind: ScenarioKind::MazeKeys,
            seed: Some(1234),
            ..ScenarioConfig::default()
        })
        .unwrap();
        assert_eq!(reseeded.seed, 1234);
        assert_ne!(reseeded.grid, first.grid);
    }

    #[test]
    fn overrides_are_honoured() {
        let scenario = Scenario::build(&ScenarioConfig {
            kind: ScenarioKind::Warehouse,
            agents: Some(6),
            height: Some(20),
            width: Some(10),
            obstacle_density: Some(0.0),
            task_count: Some(15),
            ..ScenarioConfig::default()
        })
        .unwrap();
        assert_eq!(scenario.grid.height(), 20);
        assert_eq!(scenario.grid.width(), 10);
        assert_eq!(scenario.grid.open_count(), 200);
        assert_eq!(scenario.starts.len(), 6);
        // Fifth agent starts one ring in from the first corner.
        assert_eq!(scenario.starts[4], p(1, 1));
        assert_eq!(scenario.task_count(), 15);
    }

    #[test]
    fn sprinkled_tasks_can_be_capped() {
        let scenario = Scenario::build(&ScenarioConfig {
            kind: ScenarioKind::Exploration,
            task_count: Some(5),
            ..ScenarioConfig::default()
        })
        .unwrap();
        assert_eq!(scenario.task_count(), 5);
    }

    #[test]
    fn exploration_covers_the_reachable_map() {
        let scenario = Scenario::build(&ScenarioConfig {
            kind: ScenarioKind::Exploration,
            obstacle_density: Some(0.0),
            ..ScenarioConfig::default()
        })
        .unwrap();
        // 18x18 open cells minus three starts.
        assert_eq!(scenario.task_count(), 321);
    }

    #[test]
    fn path_planning_mirrors_starts() {
        let scenario = build(ScenarioKind::PathPlanning);
        assert_eq!(scenario.starts, vec![p(1, 1), p(1, 10)]);
        let requests = scenario.route_requests();
        assert_eq!(
            requests,
            vec![
                (AgentId::new(0), p(1, 1), p(10, 1)),
                (AgentId::new(1), p(1, 10), p(10, 10)),
            ]
        );
        assert!(scenario.grid.is_traversable(p(10, 1)));
        assert!(scenario.grid.is_traversable(p(10, 10)));
    }

    #[test]
    fn only_firefighting_spreads() {
        for kind in ScenarioKind::ALL {
            let scenario = build(kind);
            let spreads = matches!(
                scenario.mission,
                Mission::Pool {
                    feed: ScenarioFeed::Fire(_),
                    ..
                }
            );
            assert_eq!(spreads, kind == ScenarioKind::Firefighting, "{kind:?}");
        }
    }

    #[test]
    fn too_many_agents_is_an_error() {
        let result = Scenario::build(&ScenarioConfig {
            kind: ScenarioKind::Cleaning,
            agents: Some(9),
            height: Some(3),
            width: Some(3),
            ..ScenarioConfig::default()
        });
        assert!(matches!(result, Err(ScenarioError::NoRoomForStarts { agents: 9, .. })));
    }

    #[test]
    fn engine_can_be_replaced() {
        let custom = EngineConfig {
            max_ticks: 3,
            ..EngineConfig::default()
        };
        let scenario = build(ScenarioKind::Rescue).with_engine(custom);
        assert_eq!(scenario.engine, custom);
        assert!(scenario.route_requests().is_empty());
    }
}
