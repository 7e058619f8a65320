//! Shortest-path search over a [`GridWorld`].
//!
//! Two searches are provided:
//!
//! - [`PathFinder::shortest_path`] -- unweighted breadth-first search toward
//!   a *set* of goals. Each cell is enqueued at most once, so its first
//!   discovery distance is final. The search stops the first time a popped
//!   cell is a goal; among equidistant goals the one discovered first (a
//!   function of the fixed neighbor order) wins.
//! - [`PathFinder::shortest_path_to`] -- heuristic search toward a single
//!   goal, keyed by `g + h` with `h` the Manhattan distance. The heuristic is
//!   admissible and consistent on a 4-connected unit grid, so the first pop
//!   of a cell settles it with its optimal `g`.
//!
//! # Tie-break rule (heuristic search)
//!
//! Among frontier entries with equal `f = g + h`, the entry with the
//! *larger* `g` (closer to the goal) is expanded first; remaining ties go to
//! the entry that was pushed first. The rule is encoded in the derived
//! ordering of [`FrontierEntry`], not in heap-pop accidents.
//!
//! # Concurrency
//!
//! A [`PathFinder`] only borrows the grid immutably and keeps all search
//! state on the stack of the call, so any number of searches may run in
//! parallel against the same grid.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, VecDeque};

use gridfleet_types::Position;
use tracing::trace;

use crate::grid::GridWorld;
use crate::path::Path;

/// Read-only search handle over a grid.
#[derive(Debug, Clone, Copy)]
pub struct PathFinder<'a> {
    /// The map being searched.
    grid: &'a GridWorld,
    /// Extra cells treated as blocked, except when they are the goal.
    avoid: Option<&'a BTreeSet<Position>>,
}

/// One heap entry of the heuristic search.
///
/// Field order is the priority order: lowest `f`, then largest `g`, then
/// earliest insertion. `cell` never decides because `seq` is unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct FrontierEntry {
    /// `g + h`.
    f: u32,
    /// `g`, reversed so that larger values sort first.
    closer: Reverse<u32>,
    /// Insertion counter.
    seq: u64,
    /// The cell this entry would settle.
    cell: Position,
}

impl<'a> PathFinder<'a> {
    /// Search handle over `grid` with no extra obstacles.
    pub const fn new(grid: &'a GridWorld) -> Self {
        Self { grid, avoid: None }
    }

    /// Treat `cells` as temporarily blocked (e.g. other agents' current
    /// positions). Goal cells are still enterable.
    #[must_use]
    pub const fn avoiding(self, cells: &'a BTreeSet<Position>) -> Self {
        Self {
            grid: self.grid,
            avoid: Some(cells),
        }
    }

    /// The grid being searched.
    pub const fn grid(&self) -> &'a GridWorld {
        self.grid
    }

    /// Whether search may step onto `cell`.
    fn may_enter(&self, cell: Position, is_goal: bool) -> bool {
        if is_goal {
            return true;
        }
        self.avoid.is_none_or(|avoid| !avoid.contains(&cell))
    }

    /// Unweighted shortest path from `start` to the nearest cell of `goals`.
    ///
    /// Returns `None` if `start` is outside the grid, `goals` is empty, or
    /// no goal is reachable. If `start` is itself a goal the single-cell
    /// path is returned.
    pub fn shortest_path(&self, start: Position, goals: &BTreeSet<Position>) -> Option<Path> {
        if !self.grid.in_bounds(start) || goals.is_empty() {
            return None;
        }

        let mut parent: BTreeMap<Position, Position> = BTreeMap::new();
        let mut discovered: BTreeSet<Position> = BTreeSet::new();
        let mut frontier: VecDeque<Position> = VecDeque::new();
        discovered.insert(start);
        frontier.push_back(start);

        while let Some(current) = frontier.pop_front() {
            if goals.contains(&current) {
                return Some(Path::reconstruct(start, current, &parent));
            }
            for next in self.grid.neighbors(current) {
                if !self.may_enter(next, goals.contains(&next)) {
                    continue;
                }
                if discovered.insert(next) {
                    parent.insert(next, current);
                    frontier.push_back(next);
                }
            }
        }

        trace!(%start, goals = goals.len(), explored = discovered.len(), "no goal reachable");
        None
    }

    /// Optimal path from `start` to `goal` using Manhattan-guided search.
    ///
    /// Returns `None` if either endpoint is outside the grid, the goal is
    /// blocked, or the goal is unreachable.
    pub fn shortest_path_to(&self, start: Position, goal: Position) -> Option<Path> {
        if !self.grid.in_bounds(start) {
            return None;
        }
        if start == goal {
            return Some(Path::single(start));
        }
        if !self.grid.is_traversable(goal) {
            return None;
        }

        // Best known distance from start; the explicit source of truth for
        // whether a push improves anything.
        let mut best: BTreeMap<Position, u32> = BTreeMap::new();
        let mut parent: BTreeMap<Position, Position> = BTreeMap::new();
        let mut settled: BTreeSet<Position> = BTreeSet::new();
        let mut frontier: BinaryHeap<Reverse<FrontierEntry>> = BinaryHeap::new();
        let mut seq: u64 = 0;

        best.insert(start, 0);
        frontier.push(Reverse(FrontierEntry {
            f: start.manhattan(goal),
            closer: Reverse(0),
            seq,
            cell: start,
        }));

        while let Some(Reverse(entry)) = frontier.pop() {
            // Entries for an already-settled cell are stale.
            if !settled.insert(entry.cell) {
                continue;
            }
            if entry.cell == goal {
                return Some(Path::reconstruct(start, goal, &parent));
            }

            let Reverse(g) = entry.closer;
            let Some(next_g) = g.checked_add(1) else {
                continue;
            };

            for next in self.grid.neighbors(entry.cell) {
                if settled.contains(&next) || !self.may_enter(next, next == goal) {
                    continue;
                }
                let improves = best.get(&next).is_none_or(|&known| next_g < known);
                if !improves {
                    continue;
                }
                best.insert(next, next_g);
                parent.insert(next, entry.cell);
                seq = seq.saturating_add(1);
                frontier.push(Reverse(FrontierEntry {
                    f: next_g.saturating_add(next.manhattan(goal)),
                    closer: Reverse(next_g),
                    seq,
                    cell: next,
                }));
            }
        }

        trace!(%start, %goal, settled = settled.len(), "goal unreachable");
        None
    }

    /// Length in moves of the shortest route between two cells, if any.
    pub fn distance(&self, start: Position, goal: Position) -> Option<usize> {
        self.shortest_path_to(start, goal).map(|path| path.edge_count())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(row: u32, col: u32) -> Position {
        Position::new(row, col)
    }

    fn goals(cells: &[Position]) -> BTreeSet<Position> {
        cells.iter().copied().collect()
    }

    #[test]
    fn open_grid_corner_to_corner() {
        let grid = GridWorld::new(5, 5).unwrap();
        let finder = PathFinder::new(&grid);
        let path = finder.shortest_path_to(p(0, 0), p(4, 4)).unwrap();
        assert_eq!(path.len(), 9);
        assert_eq!(path.edge_count(), 8);
        assert_eq!(path.origin(), Some(p(0, 0)));
        assert_eq!(path.goal(), Some(p(4, 4)));
        assert!(path.is_contiguous());
        assert!(path.is_simple());
    }

    #[test]
    fn center_wall_routes_around_border() {
        let grid = GridWorld::with_blocked(3, 3, [p(1, 1)]).unwrap();
        let finder = PathFinder::new(&grid);
        let path = finder.shortest_path_to(p(0, 0), p(2, 2)).unwrap();
        assert_eq!(path.edge_count(), 4);
        assert!(!path.cells().contains(&p(1, 1)));
        let via_top = [p(0, 0), p(0, 1), p(0, 2), p(1, 2), p(2, 2)];
        let via_left = [p(0, 0), p(1, 0), p(2, 0), p(2, 1), p(2, 2)];
        assert!(path.cells() == via_top || path.cells() == via_left);

        let bfs = finder.shortest_path(p(0, 0), &goals(&[p(2, 2)])).unwrap();
        assert_eq!(bfs.edge_count(), 4);
    }

    #[test]
    fn unreachable_goal_is_none() {
        let grid = GridWorld::from_ascii(&["..#..", "..#..", "..#.."]).unwrap();
        let finder = PathFinder::new(&grid);
        assert!(finder.shortest_path_to(p(0, 0), p(0, 4)).is_none());
        assert!(finder.shortest_path(p(0, 0), &goals(&[p(0, 4), p(2, 3)])).is_none());
    }

    #[test]
    fn blocked_goal_is_none() {
        let grid = GridWorld::with_blocked(3, 3, [p(2, 2)]).unwrap();
        let finder = PathFinder::new(&grid);
        assert!(finder.shortest_path_to(p(0, 0), p(2, 2)).is_none());
        assert!(finder.shortest_path(p(0, 0), &goals(&[p(2, 2)])).is_none());
    }

    #[test]
    fn start_equals_goal() {
        let grid = GridWorld::new(3, 3).unwrap();
        let finder = PathFinder::new(&grid);
        assert_eq!(finder.shortest_path_to(p(1, 1), p(1, 1)), Some(Path::single(p(1, 1))));
        assert_eq!(
            finder.shortest_path(p(1, 1), &goals(&[p(1, 1), p(0, 0)])),
            Some(Path::single(p(1, 1)))
        );
    }

    #[test]
    fn out_of_bounds_start_is_none() {
        let grid = GridWorld::new(3, 3).unwrap();
        let finder = PathFinder::new(&grid);
        assert!(finder.shortest_path_to(p(5, 5), p(0, 0)).is_none());
        assert!(finder.shortest_path(p(5, 5), &goals(&[p(0, 0)])).is_none());
    }

    #[test]
    fn multi_goal_picks_nearest() {
        let grid = GridWorld::new(6, 6).unwrap();
        let finder = PathFinder::new(&grid);
        let path = finder
            .shortest_path(p(0, 0), &goals(&[p(5, 5), p(0, 3), p(2, 2)]))
            .unwrap();
        assert_eq!(path.goal(), Some(p(0, 3)));
        assert_eq!(path.edge_count(), 3);
    }

    #[test]
    fn multi_goal_tie_broken_by_discovery_order() {
        let grid = GridWorld::new(3, 3).unwrap();
        let finder = PathFinder::new(&grid);
        // (0,2) and (2,0) are both two moves away; +col is expanded first.
        let path = finder.shortest_path(p(0, 0), &goals(&[p(2, 0), p(0, 2)])).unwrap();
        assert_eq!(path.goal(), Some(p(0, 2)));
    }

    #[test]
    fn heuristic_and_breadth_first_agree_on_length() {
        let grid = GridWorld::from_ascii(&[
            "..........",
            ".####.###.",
            ".#......#.",
            ".#.####.#.",
            "...#..#...",
            "####..#.##",
            "......#...",
        ])
        .unwrap();
        let finder = PathFinder::new(&grid);
        let cells: Vec<Position> = grid.open_cells().collect();
        for &start in cells.iter().step_by(3) {
            for &goal in cells.iter().step_by(5) {
                let heuristic = finder.shortest_path_to(start, goal);
                let breadth = finder.shortest_path(start, &goals(&[goal]));
                assert_eq!(
                    heuristic.as_ref().map(Path::edge_count),
                    breadth.as_ref().map(Path::edge_count),
                    "length mismatch {start} -> {goal}"
                );
                if let Some(path) = heuristic {
                    assert!(path.edge_count() >= start.manhattan(goal) as usize);
                    assert!(path.cells().iter().all(|c| grid.is_traversable(*c)));
                    assert!(path.is_contiguous());
                    assert!(path.is_simple());
                }
            }
        }
    }

    #[test]
    fn searches_are_idempotent() {
        let grid = GridWorld::from_ascii(&["....", ".##.", "....", "#..."]).unwrap();
        let finder = PathFinder::new(&grid);
        let first = finder.shortest_path_to(p(0, 0), p(3, 3));
        let second = finder.shortest_path_to(p(0, 0), p(3, 3));
        assert_eq!(first, second);
        let set = goals(&[p(3, 1), p(2, 3)]);
        assert_eq!(finder.shortest_path(p(0, 0), &set), finder.shortest_path(p(0, 0), &set));
    }

    #[test]
    fn avoidance_overlay_detours_but_allows_goal() {
        let grid = GridWorld::new(3, 3).unwrap();
        let occupied = goals(&[p(0, 1)]);
        let finder = PathFinder::new(&grid).avoiding(&occupied);
        let path = finder.shortest_path_to(p(0, 0), p(0, 2)).unwrap();
        assert!(!path.cells().contains(&p(0, 1)));
        assert_eq!(path.edge_count(), 4);

        // An avoided goal is still enterable.
        let direct = finder.shortest_path_to(p(0, 0), p(0, 1)).unwrap();
        assert_eq!(direct.edge_count(), 1);
    }

    #[test]
    fn distance_helper() {
        let grid = GridWorld::new(4, 4).unwrap();
        let finder = PathFinder::new(&grid);
        assert_eq!(finder.distance(p(0, 0), p(3, 2)), Some(5));
    }
}
