//! Occupancy grid and shortest-path search for the gridfleet engine.
//!
//! This crate models the physical world: a bounded 4-connected grid of
//! open and blocked cells, and the two searches every agent uses to get
//! around it.
//!
//! # Modules
//!
//! - [`error`] -- Error types for grid construction.
//! - [`grid`] -- [`GridWorld`]: bounds, obstacles, adjacency, connectivity.
//! - [`path`] -- The [`Path`] value returned by search.
//! - [`pathfinding`] -- [`PathFinder`]: multi-goal breadth-first search and
//!   single-goal Manhattan-guided search.

pub mod error;
pub mod grid;
pub mod path;
pub mod pathfinding;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use grid::GridWorld;
pub use path::Path;
pub use pathfinding::PathFinder;
