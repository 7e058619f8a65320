//! Every bundled scenario, run end to end with its own engine parameters.

// Integration tests use unwrap extensively for clarity -- panicking on
// failure is the correct behavior in test code.
#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::arithmetic_side_effects
)]

use gridfleet_agents::{is_collision_free, plan_independent, resolve_trajectories};
use gridfleet_core::{NoOpCallback, ScenarioConfig, SimulationState, run_simulation};
use gridfleet_scenarios::{Mission, Scenario};
use gridfleet_types::{ScenarioKind, StopReason};

fn build(kind: ScenarioKind) -> Scenario {
    Scenario::build(&ScenarioConfig {
        kind,
        ..ScenarioConfig::default()
    })
    .unwrap()
}

#[test]
fn static_pool_presets_finish_their_tasks() {
    for kind in ScenarioKind::ALL {
        if matches!(kind, ScenarioKind::PathPlanning | ScenarioKind::Firefighting) {
            continue;
        }
        let scenario = build(kind);
        let Mission::Pool { tasks, mut feed } = scenario.mission else {
            panic!("{kind:?} should be a pool scenario");
        };
        let total = tasks.len();
        let mut state =
            SimulationState::new(scenario.grid, tasks, &scenario.starts, scenario.engine).unwrap();
        let result = run_simulation(&mut state, &mut feed, &mut NoOpCallback).unwrap();

        assert_eq!(result.stop_reason, StopReason::Complete, "{kind:?}");
        assert_eq!(result.total_completed(), u64::try_from(total).unwrap(), "{kind:?}");
        assert!(result.total_ticks <= scenario.engine.max_ticks);
    }
}

#[test]
fn firefighting_stays_within_budget() {
    let scenario = build(ScenarioKind::Firefighting);
    let Mission::Pool { tasks, mut feed } = scenario.mission else {
        panic!("firefighting should be a pool scenario");
    };
    let mut state =
        SimulationState::new(scenario.grid, tasks, &scenario.starts, scenario.engine).unwrap();
    let result = run_simulation(&mut state, &mut feed, &mut NoOpCallback).unwrap();
    assert!(result.total_ticks <= scenario.engine.max_ticks);
    assert_ne!(result.stop_reason, StopReason::Stuck);
}

#[test]
fn path_planning_resolves_to_collision_free_schedule() {
    let scenario = build(ScenarioKind::PathPlanning);
    let requests = scenario.route_requests();
    assert_eq!(requests.len(), 2);

    let mut trajectories = plan_independent(&scenario.grid, &requests);
    let resolution = resolve_trajectories(&mut trajectories).unwrap();
    assert!(is_collision_free(&trajectories));
    for ((_, start, goal), trajectory) in requests.iter().zip(&trajectories) {
        assert_eq!(trajectory.cells()[0], *start);
        if trajectory.len() > 1 {
            assert_eq!(trajectory.goal(), Some(*goal));
        }
    }
    assert!(resolution.makespan >= trajectories[0].len() - 1);
}
