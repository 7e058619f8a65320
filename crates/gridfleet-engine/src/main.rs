//! Command-line runner for the gridfleet engine.
//!
//! Loads a run configuration, generates the selected scenario, drives the
//! fleet until a stop condition fires, and logs the outcome. The
//! path-planning scenario has no task pool: its routes are planned
//! independently and then serialized by the trajectory resolver.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `GRIDFLEET_CONFIG` or `gridfleet.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Generate the scenario, applying any engine override
//! 4. Run the fleet, or plan and resolve routes
//! 5. Log the result and write the replay if `GRIDFLEET_REPLAY` is set

mod error;
mod progress;

use std::path::PathBuf;

use gridfleet_agents::{plan_independent, resolve_trajectories};
use gridfleet_core::{
    EngineConfig, LoggingConfig, SimulationConfig, SimulationState, log_simulation_end,
    run_simulation,
};
use gridfleet_scenarios::{Mission, Scenario, ScenarioFeed};
use gridfleet_types::{AgentId, Position};
use gridfleet_world::GridWorld;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::progress::ProgressLog;

/// Config file used when `GRIDFLEET_CONFIG` is not set.
const DEFAULT_CONFIG_PATH: &str = "gridfleet.yaml";

/// Ticks between unconditional progress lines.
const PROGRESS_INTERVAL: u64 = 25;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, scenario generation, or the run
/// itself fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so remember where it
    //    came from and report it afterwards.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("gridfleet-engine starting");
    match &source {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }

    // 3. Generate the scenario.
    let mut scenario = Scenario::build(&config.scenario)?;
    if let Some(engine) = config.engine {
        info!("Engine parameters overridden by config");
        scenario = scenario.with_engine(engine);
    }
    log_engine(&scenario.engine);

    // 4. Run.
    let requests = scenario.route_requests();
    let Scenario {
        grid,
        starts,
        mission,
        engine,
        ..
    } = scenario;
    match mission {
        Mission::Pool { tasks, feed } => run_fleet(grid, tasks, &starts, engine, feed)?,
        Mission::Routes { .. } => run_routes(&grid, &requests)?,
    }

    info!("gridfleet-engine shutdown complete");
    Ok(())
}

/// Load the run configuration.
///
/// Reads the file named by `GRIDFLEET_CONFIG`, falling back to
/// `gridfleet.yaml` in the working directory. A missing file means
/// defaults; the returned path is `None` in that case.
fn load_config() -> Result<(SimulationConfig, Option<PathBuf>), EngineError> {
    let path = std::env::var_os("GRIDFLEET_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        let config = SimulationConfig::from_file(&path)?;
        Ok((config, Some(path)))
    } else {
        let mut config = SimulationConfig::default();
        config.apply_env_overrides()?;
        Ok((config, None))
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn log_engine(engine: &EngineConfig) {
    info!(
        allocation = ?engine.allocation,
        region_scheme = ?engine.region_scheme,
        replan_mode = ?engine.replan_mode,
        collision_mode = ?engine.collision_mode,
        max_ticks = engine.max_ticks,
        retry_ticks = engine.unreachable_retry_ticks,
        history_limit = ?engine.history_limit,
        "Engine configured"
    );
}

/// Drive the fleet over the task pool until a stop condition fires.
fn run_fleet(
    grid: GridWorld,
    tasks: Vec<Position>,
    starts: &[Position],
    engine: EngineConfig,
    mut feed: ScenarioFeed,
) -> Result<(), EngineError> {
    let mut state = SimulationState::new(grid, tasks, starts, engine)?;
    let replay = std::env::var_os("GRIDFLEET_REPLAY").map(PathBuf::from);
    let mut progress = ProgressLog::new(PROGRESS_INTERVAL, replay.is_some(), &state);

    let result = run_simulation(&mut state, &mut feed, &mut progress)?;
    log_simulation_end(&result);

    if let Some(path) = replay {
        progress.write_replay(&path)?;
    }
    Ok(())
}

/// Plan every agent to its goal independently, then insert waits until no
/// two agents share a cell at the same tick.
fn run_routes(
    grid: &GridWorld,
    requests: &[(AgentId, Position, Position)],
) -> Result<(), EngineError> {
    let mut trajectories = plan_independent(grid, requests);
    let resolution = resolve_trajectories(&mut trajectories)?;

    for trajectory in &trajectories {
        info!(
            agent = %trajectory.agent(),
            ticks = trajectory.len().saturating_sub(1),
            waits = trajectory.wait_count(),
            goal = ?trajectory.goal(),
            "Route scheduled"
        );
    }

    let total = requests.len();
    let arrived = requests
        .iter()
        .zip(&trajectories)
        .filter(|((_, _, goal), trajectory)| trajectory.goal() == Some(*goal))
        .count();
    info!(
        waits = resolution.waits.len(),
        makespan = resolution.makespan,
        "routes resolved {arrived}/{total}"
    );
    if arrived < total {
        let stranded: Vec<AgentId> = requests
            .iter()
            .zip(&trajectories)
            .filter(|((_, _, goal), trajectory)| trajectory.goal() != Some(*goal))
            .map(|(_, trajectory)| trajectory.agent())
            .collect();
        warn!(?stranded, "Some goals are unreachable");
    }
    Ok(())
}
