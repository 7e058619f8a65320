//! Error types for the `gridfleet-world` crate.
//!
//! Only grid construction can fail. Searches report "no route" as `None`.

use gridfleet_types::Position;

/// Errors that can occur while building a [`GridWorld`](crate::GridWorld).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// A grid must have at least one row and one column.
    #[error("grid must be non-empty, got {height}x{width}")]
    EmptyGrid {
        /// Requested number of rows.
        height: u32,
        /// Requested number of columns.
        width: u32,
    },

    /// The cell count does not fit in memory indices.
    #[error("grid {height}x{width} is too large")]
    GridTooLarge {
        /// Requested number of rows.
        height: u32,
        /// Requested number of columns.
        width: u32,
    },

    /// A cell lies outside the grid.
    #[error("cell {position} is outside the {height}x{width} grid")]
    OutOfBounds {
        /// The offending cell.
        position: Position,
        /// Grid rows.
        height: u32,
        /// Grid columns.
        width: u32,
    },

    /// A row of an ASCII map has a different length than the first row.
    #[error("map row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of this row.
        found: usize,
    },

    /// An ASCII map contains a symbol other than `#` or `.`.
    #[error("unknown map symbol {symbol:?} at row {row}, column {col}")]
    UnknownCell {
        /// The unexpected character.
        symbol: char,
        /// Zero-based row index.
        row: usize,
        /// Zero-based column index.
        col: usize,
    },
}
