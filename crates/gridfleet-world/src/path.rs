//! The [`Path`] value returned by search.

use std::collections::{BTreeMap, BTreeSet};

use gridfleet_types::Position;

/// An ordered, non-empty sequence of cells from a search origin to a goal.
///
/// Consecutive cells differ by one unit move and no cell repeats. A
/// single-cell path means origin and goal coincide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Path(Vec<Position>);

impl Path {
    /// The degenerate path that starts and ends at `cell`.
    pub fn single(cell: Position) -> Self {
        Self(vec![cell])
    }

    /// Build a path from explicit cells, checking that it is non-empty,
    /// contiguous and simple.
    pub fn from_cells(cells: Vec<Position>) -> Option<Self> {
        let path = Self(cells);
        (!path.0.is_empty() && path.is_contiguous() && path.is_simple()).then_some(path)
    }

    /// Walk `parent` links back from `goal` to `start`.
    ///
    /// The walk is bounded by the number of recorded links so a corrupt map
    /// can never loop forever.
    pub(crate) fn reconstruct(
        start: Position,
        goal: Position,
        parent: &BTreeMap<Position, Position>,
    ) -> Self {
        let mut cells = vec![goal];
        let mut current = goal;
        for _ in 0..parent.len() {
            if current == start {
                break;
            }
            let Some(&previous) = parent.get(&current) else {
                break;
            };
            cells.push(previous);
            current = previous;
        }
        cells.reverse();
        Self(cells)
    }

    /// All cells, origin first.
    pub fn cells(&self) -> &[Position] {
        &self.0
    }

    /// Consume the path into its cells.
    pub fn into_cells(self) -> Vec<Position> {
        self.0
    }

    /// First cell (the search origin).
    pub fn origin(&self) -> Option<Position> {
        self.0.first().copied()
    }

    /// Last cell (the goal that was reached).
    pub fn goal(&self) -> Option<Position> {
        self.0.last().copied()
    }

    /// Number of cells, including origin and goal.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for paths built by this crate.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of unit moves, i.e. `len() - 1`.
    pub fn edge_count(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Whether every consecutive pair is one unit move apart.
    pub fn is_contiguous(&self) -> bool {
        self.0.windows(2).all(|pair| match pair {
            [a, b] => a.is_adjacent(*b),
            _ => true,
        })
    }

    /// Whether no cell appears twice.
    pub fn is_simple(&self) -> bool {
        let unique: BTreeSet<&Position> = self.0.iter().collect();
        unique.len() == self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(row: u32, col: u32) -> Position {
        Position::new(row, col)
    }

    #[test]
    fn from_cells_validates_shape() {
        assert!(Path::from_cells(vec![p(0, 0), p(0, 1), p(1, 1)]).is_some());
        assert!(Path::from_cells(vec![]).is_none());
        // Diagonal jump.
        assert!(Path::from_cells(vec![p(0, 0), p(1, 1)]).is_none());
        // Revisits a cell.
        assert!(Path::from_cells(vec![p(0, 0), p(0, 1), p(0, 0)]).is_none());
    }

    #[test]
    fn reconstruct_follows_parents() {
        let mut parent = BTreeMap::new();
        parent.insert(p(0, 1), p(0, 0));
        parent.insert(p(0, 2), p(0, 1));
        parent.insert(p(1, 2), p(0, 2));
        let path = Path::reconstruct(p(0, 0), p(1, 2), &parent);
        assert_eq!(path.cells(), &[p(0, 0), p(0, 1), p(0, 2), p(1, 2)]);
        assert_eq!(path.edge_count(), 3);
        assert_eq!(path.origin(), Some(p(0, 0)));
        assert_eq!(path.goal(), Some(p(1, 2)));
    }

    #[test]
    fn single_cell_path() {
        let path = Path::single(p(2, 2));
        assert_eq!(path.len(), 1);
        assert_eq!(path.edge_count(), 0);
        assert!(path.is_contiguous());
        assert!(path.is_simple());
    }
}
