//! Grid coordinates and unit moves.
//!
//! A [`Position`] is a plain `(row, col)` value with no identity. The derived
//! ordering is row-major, which is the tie-break order used wherever the
//! engine has to pick one of several equally good cells.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A cell on the grid, 0-indexed as `(row, col)`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Row index, `0..height`.
    pub row: u32,
    /// Column index, `0..width`.
    pub col: u32,
}

impl Position {
    /// Create a position from a row and a column.
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Manhattan distance to `other`.
    ///
    /// Saturates instead of overflowing; on any realistic grid the sum of
    /// two `u32` axis distances fits comfortably.
    pub const fn manhattan(self, other: Self) -> u32 {
        self.row
            .abs_diff(other.row)
            .saturating_add(self.col.abs_diff(other.col))
    }

    /// The cell one unit move away in `direction`, or `None` if the move
    /// would leave the non-negative quadrant.
    ///
    /// Upper bounds are not checked here; that is the grid's job.
    pub fn step(self, direction: Direction) -> Option<Self> {
        match direction {
            Direction::East => self.col.checked_add(1).map(|col| Self::new(self.row, col)),
            Direction::South => self.row.checked_add(1).map(|row| Self::new(row, self.col)),
            Direction::West => self.col.checked_sub(1).map(|col| Self::new(self.row, col)),
            Direction::North => self.row.checked_sub(1).map(|row| Self::new(row, self.col)),
        }
    }

    /// Whether `other` is exactly one axis-aligned unit move away.
    pub const fn is_adjacent(self, other: Self) -> bool {
        self.manhattan(other) == 1
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<(u32, u32)> for Position {
    fn from((row, col): (u32, u32)) -> Self {
        Self::new(row, col)
    }
}

/// One of the four axis-aligned unit moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Direction {
    /// `+col`
    East,
    /// `+row`
    South,
    /// `-col`
    West,
    /// `-row`
    North,
}

impl Direction {
    /// All four moves in the fixed expansion order used by search:
    /// `+col`, `+row`, `-col`, `-row`.
    pub const ALL: [Self; 4] = [Self::East, Self::South, Self::West, Self::North];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_is_symmetric() {
        let a = Position::new(0, 0);
        let b = Position::new(4, 3);
        assert_eq!(a.manhattan(b), 7);
        assert_eq!(b.manhattan(a), 7);
        assert_eq!(a.manhattan(a), 0);
    }

    #[test]
    fn step_stops_at_zero_edge() {
        let origin = Position::new(0, 0);
        assert_eq!(origin.step(Direction::North), None);
        assert_eq!(origin.step(Direction::West), None);
        assert_eq!(origin.step(Direction::East), Some(Position::new(0, 1)));
        assert_eq!(origin.step(Direction::South), Some(Position::new(1, 0)));
    }

    #[test]
    fn ordering_is_row_major() {
        let mut cells = vec![
            Position::new(1, 0),
            Position::new(0, 5),
            Position::new(0, 1),
        ];
        cells.sort();
        assert_eq!(
            cells,
            vec![Position::new(0, 1), Position::new(0, 5), Position::new(1, 0)]
        );
    }

    #[test]
    fn adjacency() {
        let p = Position::new(2, 2);
        assert!(p.is_adjacent(Position::new(2, 3)));
        assert!(!p.is_adjacent(Position::new(3, 3)));
        assert!(!p.is_adjacent(p));
    }
}
