//! Error types for the `gridfleet-scenarios` crate.

use gridfleet_world::WorldError;

/// Errors that can occur while building a scenario.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScenarioError {
    /// The generated grid could not be built.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// A probability outside `[0, 1]`.
    #[error("{field} must be within [0, 1], got {value}")]
    Probability {
        /// Which setting carried the value.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// The fleet does not fit on the grid's corner rings.
    #[error("cannot place {agents} agents on a {height}x{width} grid")]
    NoRoomForStarts {
        /// Requested fleet size.
        agents: u32,
        /// Grid rows.
        height: u32,
        /// Grid columns.
        width: u32,
    },
}
