//! Scenario setup for the gridfleet engine.
//!
//! The engine only ever sees a grid, a task set, start cells and an
//! [`EventFeed`](gridfleet_core::EventFeed). This crate produces those for
//! the ten bundled scenarios from a seed, keeping every random draw outside
//! the engine.
//!
//! # Modules
//!
//! - [`generate`] -- Seeded walls, corner starts, and task layouts.
//! - [`fire`] -- [`FireSpread`], the spreading-fire event feed.
//! - [`presets`] -- The ten [`Preset`]s and [`Scenario::build`].
//! - [`error`] -- [`ScenarioError`].

pub mod error;
pub mod fire;
pub mod generate;
pub mod presets;

// Re-export primary types at crate root.
pub use error::ScenarioError;
pub use fire::FireSpread;
pub use generate::{Corner, TaskLayout, corner_starts, place_tasks, random_walls};
pub use presets::{Mission, Objective, Preset, Scenario, ScenarioFeed};
