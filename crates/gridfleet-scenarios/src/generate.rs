//! Seeded map, start, and task generation.
//!
//! Every random draw a scenario makes happens here, before the engine is
//! built, from a generator the caller seeds. The engine itself never sees
//! a random source, so search and allocation stay deterministic no matter
//! how the map was produced.

use std::collections::BTreeSet;

use gridfleet_types::Position;
use gridfleet_world::GridWorld;
use rand::Rng;
use rand::distr::{Bernoulli, Distribution};
use rand::seq::SliceRandom;
use tracing::warn;

use crate::error::ScenarioError;

/// A grid corner, used to place starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    /// Row 0, column 0.
    NorthWest,
    /// Row 0, last column.
    NorthEast,
    /// Last row, column 0.
    SouthWest,
    /// Last row, last column.
    SouthEast,
}

impl Corner {
    /// The cell `inset` steps diagonally in from this corner, if the grid
    /// is large enough.
    pub fn cell(self, height: u32, width: u32, inset: u32) -> Option<Position> {
        let bottom = height.checked_sub(1)?.checked_sub(inset)?;
        let right = width.checked_sub(1)?.checked_sub(inset)?;
        let (row, col) = match self {
            Self::NorthWest => (inset, inset),
            Self::NorthEast => (inset, right),
            Self::SouthWest => (bottom, inset),
            Self::SouthEast => (bottom, right),
        };
        Some(Position::new(row, col))
    }
}

/// How the initial task set is laid out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaskLayout {
    /// Each candidate cell independently becomes a task.
    Sprinkle {
        /// Per-cell chance, in `[0, 1]`.
        probability: f64,
    },
    /// A fixed number of distinct cells away from the border.
    Scatter {
        /// Tasks to place.
        count: u32,
        /// Rows and columns to keep clear along every edge.
        margin: u32,
    },
    /// Every candidate cell.
    EveryOpenCell,
}

/// Place `count` starts, cycling through `corners` and moving one ring
/// further in on every lap.
///
/// # Errors
///
/// Returns [`ScenarioError::NoRoomForStarts`] if a lap runs past the middle
/// of the grid or two starts would share a cell.
pub fn corner_starts(
    height: u32,
    width: u32,
    corners: &[Corner; 4],
    inset: u32,
    count: u32,
) -> Result<Vec<Position>, ScenarioError> {
    let no_room = ScenarioError::NoRoomForStarts {
        agents: count,
        height,
        width,
    };
    let mut seen = BTreeSet::new();
    let mut starts = Vec::new();
    for (slot, &corner) in (0..count).zip(corners.iter().cycle()) {
        let lap = slot.checked_div(4).unwrap_or(0);
        let cell = inset
            .checked_add(lap)
            .and_then(|depth| corner.cell(height, width, depth))
            .ok_or_else(|| no_room.clone())?;
        if !seen.insert(cell) {
            return Err(no_room);
        }
        starts.push(cell);
    }
    Ok(starts)
}

/// Build a `height x width` grid where each cell is a wall with chance
/// `density`. Cells in `keep_open` are never walled.
///
/// One draw is taken per cell in row-major order whether or not the cell
/// is kept open, so the layout depends only on the seed and the size.
///
/// # Errors
///
/// Returns [`ScenarioError::Probability`] for a density outside `[0, 1]`
/// and [`ScenarioError::World`] for an empty grid or a kept-open cell
/// outside it.
pub fn random_walls<R: Rng>(
    height: u32,
    width: u32,
    density: f64,
    keep_open: &[Position],
    rng: &mut R,
) -> Result<GridWorld, ScenarioError> {
    let wall = Bernoulli::new(density).map_err(|_err| ScenarioError::Probability {
        field: "obstacle_density",
        value: density,
    })?;
    let mut grid = GridWorld::new(height, width)?;
    for row in 0..height {
        for col in 0..width {
            if wall.sample(rng) {
                grid.block(Position::new(row, col))?;
            }
        }
    }
    for &cell in keep_open {
        grid.unblock(cell)?;
    }
    Ok(grid)
}

/// Lay out the initial tasks.
///
/// Candidates are the open cells some start can reach, minus the starts
/// themselves, in row-major order. Scattered tasks come out in draw order,
/// which is the order a FIFO queue hands them out.
///
/// # Errors
///
/// Returns [`ScenarioError::Probability`] for a sprinkle chance outside
/// `[0, 1]`.
pub fn place_tasks<R: Rng>(
    grid: &GridWorld,
    layout: TaskLayout,
    starts: &[Position],
    rng: &mut R,
) -> Result<Vec<Position>, ScenarioError> {
    let mut reachable = BTreeSet::new();
    for &start in starts {
        reachable.extend(grid.component_of(start));
    }
    let candidates = reachable.into_iter().filter(|cell| !starts.contains(cell));

    match layout {
        TaskLayout::EveryOpenCell => Ok(candidates.collect()),
        TaskLayout::Sprinkle { probability } => {
            let dirty = Bernoulli::new(probability).map_err(|_err| ScenarioError::Probability {
                field: "task probability",
                value: probability,
            })?;
            Ok(candidates.filter(|_| dirty.sample(rng)).collect())
        }
        TaskLayout::Scatter { count, margin } => {
            let mut pool: Vec<Position> = candidates
                .filter(|cell| inside_margin(grid, *cell, margin))
                .collect();
            let wanted = usize::try_from(count).unwrap_or(usize::MAX);
            if wanted > pool.len() {
                warn!(wanted, available = pool.len(), "Not enough room for every task");
            }
            let take = wanted.min(pool.len());
            let (picked, _) = pool.partial_shuffle(rng, take);
            Ok(picked.to_vec())
        }
    }
}

const fn inside_margin(grid: &GridWorld, cell: Position, margin: u32) -> bool {
    cell.row >= margin
        && cell.col >= margin
        && cell.row.saturating_add(margin) < grid.height()
        && cell.col.saturating_add(margin) < grid.width()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn p(row: u32, col: u32) -> Position {
        Position::new(row, col)
    }

    const CYCLE: [Corner; 4] = [
        Corner::NorthWest,
        Corner::SouthEast,
        Corner::NorthEast,
        Corner::SouthWest,
    ];

    #[test]
    fn corner_cells() {
        assert_eq!(Corner::NorthWest.cell(5, 7, 0), Some(p(0, 0)));
        assert_eq!(Corner::SouthEast.cell(5, 7, 1), Some(p(3, 5)));
        assert_eq!(Corner::NorthEast.cell(5, 7, 2), Some(p(2, 4)));
        assert_eq!(Corner::SouthWest.cell(5, 7, 5), None);
    }

    #[test]
    fn starts_move_inward_after_four() {
        let starts = corner_starts(8, 8, &CYCLE, 0, 6).unwrap();
        assert_eq!(
            starts,
            vec![p(0, 0), p(7, 7), p(0, 7), p(7, 0), p(1, 1), p(6, 6)]
        );
    }

    #[test]
    fn crowded_grid_has_no_room() {
        assert!(corner_starts(3, 3, &CYCLE, 0, 5).is_ok());
        assert!(matches!(
            corner_starts(3, 3, &CYCLE, 0, 6),
            Err(ScenarioError::NoRoomForStarts { agents: 6, .. })
        ));
        assert!(corner_starts(1, 1, &CYCLE, 0, 2).is_err());
    }

    #[test]
    fn walls_are_seeded_and_keep_starts_open() {
        let keep = [p(0, 0), p(9, 9)];
        let first = random_walls(10, 10, 0.5, &keep, &mut StdRng::seed_from_u64(3)).unwrap();
        let second = random_walls(10, 10, 0.5, &keep, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(first, second);
        assert!(first.is_traversable(p(0, 0)));
        assert!(first.is_traversable(p(9, 9)));
        assert!(first.open_count() < 100);
    }

    #[test]
    fn density_extremes() {
        let mut rng = StdRng::seed_from_u64(1);
        let open = random_walls(4, 4, 0.0, &[], &mut rng).unwrap();
        assert_eq!(open.open_count(), 16);
        let solid = random_walls(4, 4, 1.0, &[p(2, 2)], &mut rng).unwrap();
        assert_eq!(solid.open_count(), 1);
        assert!(matches!(
            random_walls(4, 4, 1.5, &[], &mut rng),
            Err(ScenarioError::Probability { .. })
        ));
    }

    #[test]
    fn tasks_skip_starts_and_sealed_cells() {
        // (0,4) is sealed off.
        let grid = GridWorld::from_ascii(&["...#.", "....#", "....."]).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let tasks = place_tasks(&grid, TaskLayout::EveryOpenCell, &[p(0, 0)], &mut rng).unwrap();
        assert_eq!(tasks.len(), 11);
        assert!(!tasks.contains(&p(0, 0)));
        assert!(!tasks.contains(&p(0, 4)));
    }

    #[test]
    fn scatter_respects_count_and_margin() {
        let grid = GridWorld::new(10, 10).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let layout = TaskLayout::Scatter { count: 12, margin: 2 };
        let tasks = place_tasks(&grid, layout, &[p(0, 0)], &mut rng).unwrap();
        assert_eq!(tasks.len(), 12);
        let distinct: BTreeSet<Position> = tasks.iter().copied().collect();
        assert_eq!(distinct.len(), 12);
        assert!(tasks.iter().all(|t| (2..8).contains(&t.row) && (2..8).contains(&t.col)));
    }

    #[test]
    fn scatter_is_seeded_and_keeps_draw_order() {
        let grid = GridWorld::new(8, 8).unwrap();
        let layout = TaskLayout::Scatter { count: 10, margin: 0 };
        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            place_tasks(&grid, layout, &[p(0, 0)], &mut rng).unwrap()
        };
        let first = draw(9);
        assert_eq!(first, draw(9));
        assert_eq!(first.len(), 10);
        // Draw order, not row-major order, is what a FIFO queue hands out.
        let mut sorted = first.clone();
        sorted.sort_unstable();
        assert_ne!(first, sorted);
    }

    #[test]
    fn kept_open_cell_outside_the_grid_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            random_walls(4, 4, 0.2, &[p(4, 0)], &mut rng),
            Err(ScenarioError::World { .. })
        ));
    }

    #[test]
    fn scatter_caps_at_available_cells() {
        let grid = GridWorld::new(3, 3).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let layout = TaskLayout::Scatter { count: 50, margin: 1 };
        let tasks = place_tasks(&grid, layout, &[p(0, 0)], &mut rng).unwrap();
        assert_eq!(tasks, vec![p(1, 1)]);
    }

    #[test]
    fn sprinkle_extremes() {
        let grid = GridWorld::new(4, 4).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let none = TaskLayout::Sprinkle { probability: 0.0 };
        assert!(place_tasks(&grid, none, &[p(0, 0)], &mut rng).unwrap().is_empty());
        let all = TaskLayout::Sprinkle { probability: 1.0 };
        assert_eq!(place_tasks(&grid, all, &[p(0, 0)], &mut rng).unwrap().len(), 15);
    }
}
