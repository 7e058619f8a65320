//! Occupancy grid: the static map every agent moves on.
//!
//! A [`GridWorld`] is an `H x W` array of open/blocked flags stored row-major.
//! It is mutable while a scenario is being set up and treated as read-only
//! for the whole of a run; nothing in the engine holds a `&mut GridWorld`
//! once the simulation has been constructed.
//!
//! Adjacency is 4-connected. [`GridWorld::neighbors`] yields cells in the
//! fixed order `+col`, `+row`, `-col`, `-row` so that searches break ties
//! reproducibly.

use std::collections::{BTreeSet, VecDeque};

use gridfleet_types::{Direction, Position};

use crate::error::WorldError;

/// Symbol for a blocked cell in ASCII maps.
const BLOCKED_SYMBOL: char = '#';

/// Symbol for an open cell in ASCII maps.
const OPEN_SYMBOL: char = '.';

/// A bounded 2-D occupancy map.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GridWorld {
    /// Number of rows.
    height: u32,
    /// Number of columns.
    width: u32,
    /// Row-major blocked flags, `height * width` long.
    blocked: Vec<bool>,
}

impl GridWorld {
    /// Create an `height x width` grid with every cell open.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EmptyGrid`] if either dimension is zero, or
    /// [`WorldError::GridTooLarge`] if the cell count overflows `usize`.
    pub fn new(height: u32, width: u32) -> Result<Self, WorldError> {
        if height == 0 || width == 0 {
            return Err(WorldError::EmptyGrid { height, width });
        }
        let area = usize::try_from(height)
            .ok()
            .zip(usize::try_from(width).ok())
            .and_then(|(h, w)| h.checked_mul(w))
            .ok_or(WorldError::GridTooLarge { height, width })?;
        Ok(Self {
            height,
            width,
            blocked: vec![false; area],
        })
    }

    /// Create a grid with the given cells blocked.
    ///
    /// # Errors
    ///
    /// Fails like [`GridWorld::new`], or with [`WorldError::OutOfBounds`] if
    /// any blocked cell lies outside the grid.
    pub fn with_blocked(
        height: u32,
        width: u32,
        blocked: impl IntoIterator<Item = Position>,
    ) -> Result<Self, WorldError> {
        let mut grid = Self::new(height, width)?;
        for cell in blocked {
            grid.block(cell)?;
        }
        Ok(grid)
    }

    /// Parse a grid from ASCII rows where `#` is blocked and `.` is open.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EmptyGrid`] for no rows or empty rows,
    /// [`WorldError::RaggedRow`] if rows differ in length, and
    /// [`WorldError::UnknownCell`] for any other symbol.
    pub fn from_ascii<S: AsRef<str>>(rows: &[S]) -> Result<Self, WorldError> {
        let expected = rows.first().map_or(0, |r| r.as_ref().chars().count());
        let too_large = |_err| WorldError::GridTooLarge {
            height: u32::MAX,
            width: u32::MAX,
        };
        let height = u32::try_from(rows.len()).map_err(too_large)?;
        let width = u32::try_from(expected).map_err(too_large)?;
        let mut grid = Self::new(height, width)?;

        for (row_idx, row) in rows.iter().enumerate() {
            let found = row.as_ref().chars().count();
            if found != expected {
                return Err(WorldError::RaggedRow {
                    row: row_idx,
                    expected,
                    found,
                });
            }
            for (col_idx, symbol) in row.as_ref().chars().enumerate() {
                match symbol {
                    OPEN_SYMBOL => {}
                    BLOCKED_SYMBOL => {
                        let r = u32::try_from(row_idx).map_err(too_large)?;
                        let c = u32::try_from(col_idx).map_err(too_large)?;
                        grid.block(Position::new(r, c))?;
                    }
                    other => {
                        return Err(WorldError::UnknownCell {
                            symbol: other,
                            row: row_idx,
                            col: col_idx,
                        });
                    }
                }
            }
        }
        Ok(grid)
    }

    // -------------------------------------------------------------------
    // Dimensions
    // -------------------------------------------------------------------

    /// Number of rows.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of columns.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Total number of cells, open or blocked.
    pub fn area(&self) -> usize {
        self.blocked.len()
    }

    /// Whether `position` lies inside the grid.
    pub const fn in_bounds(&self, position: Position) -> bool {
        position.row < self.height && position.col < self.width
    }

    /// Row-major index of an in-bounds cell.
    pub fn index_of(&self, position: Position) -> Option<usize> {
        if !self.in_bounds(position) {
            return None;
        }
        let row = usize::try_from(position.row).ok()?;
        let col = usize::try_from(position.col).ok()?;
        let width = usize::try_from(self.width).ok()?;
        row.checked_mul(width)?.checked_add(col)
    }

    // -------------------------------------------------------------------
    // Setup-time mutation
    // -------------------------------------------------------------------

    /// Mark a cell as blocked.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if the cell is outside the grid.
    pub fn block(&mut self, position: Position) -> Result<(), WorldError> {
        self.set_blocked(position, true)
    }

    /// Mark a cell as open.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if the cell is outside the grid.
    pub fn unblock(&mut self, position: Position) -> Result<(), WorldError> {
        self.set_blocked(position, false)
    }

    fn set_blocked(&mut self, position: Position, value: bool) -> Result<(), WorldError> {
        let out_of_bounds = WorldError::OutOfBounds {
            position,
            height: self.height,
            width: self.width,
        };
        let idx = self.index_of(position).ok_or_else(|| out_of_bounds.clone())?;
        let slot = self.blocked.get_mut(idx).ok_or(out_of_bounds)?;
        *slot = value;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// Whether `position` is in bounds and blocked.
    pub fn is_blocked(&self, position: Position) -> bool {
        self.index_of(position)
            .and_then(|idx| self.blocked.get(idx).copied())
            .unwrap_or(false)
    }

    /// True iff `position` is in bounds and not blocked.
    pub fn is_traversable(&self, position: Position) -> bool {
        self.index_of(position)
            .and_then(|idx| self.blocked.get(idx).copied())
            .is_some_and(|blocked| !blocked)
    }

    /// Every traversable cell one unit move from `position`, in the fixed
    /// order `+col`, `+row`, `-col`, `-row`.
    pub fn neighbors(&self, position: Position) -> impl Iterator<Item = Position> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |dir| position.step(dir))
            .filter(|next| self.is_traversable(*next))
    }

    /// Every open cell in row-major order.
    pub fn open_cells(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height)
            .flat_map(move |row| (0..self.width).map(move |col| Position::new(row, col)))
            .filter(|p| self.is_traversable(*p))
    }

    /// Number of open cells.
    pub fn open_count(&self) -> usize {
        self.blocked.iter().filter(|b| !**b).count()
    }

    /// All open cells reachable from `start`, including `start` itself.
    ///
    /// Returns an empty set if `start` is not traversable.
    pub fn component_of(&self, start: Position) -> BTreeSet<Position> {
        let mut visited = BTreeSet::new();
        if !self.is_traversable(start) {
            return visited;
        }
        let mut queue = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);
        while let Some(current) = queue.pop_front() {
            for next in self.neighbors(current) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        visited
    }

    /// Whether every open cell is reachable from every other open cell.
    ///
    /// A grid with no open cells counts as connected.
    pub fn is_connected(&self) -> bool {
        let Some(first) = self.open_cells().next() else {
            return true;
        };
        self.component_of(first).len() == self.open_count()
    }

    /// Render the grid as ASCII rows (`#` blocked, `.` open).
    pub fn to_ascii(&self) -> Vec<String> {
        (0..self.height)
            .map(|row| {
                (0..self.width)
                    .map(|col| {
                        if self.is_blocked(Position::new(row, col)) {
                            BLOCKED_SYMBOL
                        } else {
                            OPEN_SYMBOL
                        }
                    })
                    .collect()
            })
            .collect()
    }
}
