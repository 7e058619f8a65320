//! Fire spread: the event feed behind the firefighting scenario.
//!
//! After each agent phase every live fire may ignite each open neighbour
//! with a fixed chance. Draws come from the feed's own seeded generator,
//! taken in pool order and then neighbour order, so a run replays exactly
//! for a given seed.

use std::collections::BTreeSet;

use gridfleet_agents::TaskPool;
use gridfleet_core::{EventFeed, TaskEvent};
use gridfleet_world::GridWorld;
use rand::SeedableRng;
use rand::distr::{Bernoulli, Distribution};
use rand::rngs::StdRng;
use tracing::debug;

use crate::error::ScenarioError;

/// Spreads every live fire to its open neighbours at random.
#[derive(Debug, Clone)]
pub struct FireSpread {
    /// Chance that a fire ignites one given neighbour in one tick.
    probability: f64,
    /// Per-neighbour ignition draw.
    ignite: Bernoulli,
    /// Generator owned by the feed.
    rng: StdRng,
}

impl FireSpread {
    /// A feed igniting each neighbour with chance `probability`.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Probability`] if `probability` is outside
    /// `[0, 1]`.
    pub fn new(probability: f64, seed: u64) -> Result<Self, ScenarioError> {
        let ignite = Bernoulli::new(probability).map_err(|_err| ScenarioError::Probability {
            field: "fire spread",
            value: probability,
        })?;
        Ok(Self {
            probability,
            ignite,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Chance that a fire ignites one given neighbour in one tick.
    pub const fn probability(&self) -> f64 {
        self.probability
    }
}

impl EventFeed for FireSpread {
    fn events(&mut self, tick: u64, grid: &GridWorld, pool: &TaskPool) -> Vec<TaskEvent> {
        let mut ignited = BTreeSet::new();
        for &fire in pool.peek_all() {
            for cell in grid.neighbors(fire) {
                if self.ignite.sample(&mut self.rng) && !pool.contains(cell) {
                    ignited.insert(cell);
                }
            }
        }
        if !ignited.is_empty() {
            debug!(tick, ignited = ignited.len(), burning = pool.len(), "Fire spread");
        }
        ignited.into_iter().map(TaskEvent::Spawn).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gridfleet_types::Position;

    use super::*;

    fn p(row: u32, col: u32) -> Position {
        Position::new(row, col)
    }

    #[test]
    fn zero_chance_never_spreads() {
        let grid = GridWorld::new(5, 5).unwrap();
        let pool = TaskPool::from_tasks([p(2, 2)]);
        let mut feed = FireSpread::new(0.0, 1).unwrap();
        for tick in 1..20 {
            assert!(feed.events(tick, &grid, &pool).is_empty());
        }
    }

    #[test]
    fn certain_spread_reaches_open_neighbours_only() {
        let grid = GridWorld::from_ascii(&["...", ".#.", "..."]).unwrap();
        let pool = TaskPool::from_tasks([p(0, 0), p(0, 1)]);
        let mut feed = FireSpread::new(1.0, 1).unwrap();
        let events = feed.events(1, &grid, &pool);
        assert_eq!(
            events,
            vec![TaskEvent::Spawn(p(0, 2)), TaskEvent::Spawn(p(1, 0))]
        );
    }

    #[test]
    fn same_seed_same_fire() {
        let grid = GridWorld::new(8, 8).unwrap();
        let pool = TaskPool::from_tasks([p(3, 3), p(6, 1)]);
        let mut first = FireSpread::new(0.4, 77).unwrap();
        let mut second = FireSpread::new(0.4, 77).unwrap();
        for tick in 1..10 {
            assert_eq!(
                first.events(tick, &grid, &pool),
                second.events(tick, &grid, &pool)
            );
        }
    }

    #[test]
    fn bad_probability_is_rejected() {
        assert!(matches!(
            FireSpread::new(-0.1, 1),
            Err(ScenarioError::Probability { field: "fire spread", .. })
        ));
        assert!((FireSpread::new(0.08, 1).unwrap().probability() - 0.08).abs() < f64::EPSILON);
    }
}
