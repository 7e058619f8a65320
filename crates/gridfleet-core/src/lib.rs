//! Step clock, tick cycle, and run loop for the gridfleet engine.
//!
//! This crate owns the per-tick driver that moves a fleet of agents over a
//! [`GridWorld`](gridfleet_world::GridWorld): allocate, search, move,
//! claim, apply external events, and check whether the run is over.
//!
//! # Modules
//!
//! - [`clock`] -- [`StepClock`]: tick counter and step budget.
//! - [`config`] -- Configuration loading from `gridfleet.yaml` into
//!   strongly-typed structs.
//! - [`events`] -- [`EventFeed`] trait and the built-in feeds.
//! - [`tick`] -- [`SimulationState`] and the single-tick cycle.
//! - [`runner`] -- [`run_simulation`] and tick callbacks.

pub mod clock;
pub mod config;
pub mod events;
pub mod runner;
pub mod tick;

// Re-export primary types at crate root.
pub use clock::{ClockError, StepClock};
pub use config::{ConfigError, EngineConfig, LoggingConfig, ScenarioConfig, SimulationConfig};
pub use events::{AppliedEvents, EventFeed, NoEvents, ScriptedFeed, TaskEvent, apply_events};
pub use runner::{
    NoOpCallback, RunnerError, SimulationResult, SnapshotRecorder, TickCallback,
    log_simulation_end, run_simulation,
};
pub use tick::{SetupError, SimulationState, TickError, TickSummary, run_tick};
