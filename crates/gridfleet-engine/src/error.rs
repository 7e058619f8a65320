//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and the run itself.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: gridfleet_core::ConfigError,
    },

    /// Scenario generation failed.
    #[error("scenario error: {source}")]
    Scenario {
        /// The underlying scenario error.
        #[from]
        source: gridfleet_scenarios::ScenarioError,
    },

    /// The generated scenario was rejected by the engine.
    #[error("setup error: {source}")]
    Setup {
        /// The underlying setup error.
        #[from]
        source: gridfleet_core::SetupError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: gridfleet_core::RunnerError,
    },

    /// Post-hoc trajectory resolution failed.
    #[error("conflict error: {source}")]
    Conflict {
        /// The underlying conflict error.
        #[from]
        source: gridfleet_agents::ConflictError,
    },

    /// Writing the replay file failed.
    #[error("replay error: {message}")]
    Replay {
        /// Description of the failure.
        message: String,
    },
}
