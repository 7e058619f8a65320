//! Agents, the shared task pool, and the coordination rules between them.
//!
//! # Modules
//!
//! - [`agent`] -- [`Agent`] state, committed routes, one-cell moves, and
//!   the per-agent skip list for unreachable tasks.
//! - [`task_pool`] -- [`TaskPool`], the live set of unclaimed task cells.
//! - [`allocation`] -- [`Allocator`], candidate ranking under the four
//!   allocation policies and the three region schemes.
//! - [`conflict`] -- Post-hoc wait insertion over precomputed
//!   [`Trajectory`] timelines.
//! - [`error`] -- Error types for this crate.

pub mod agent;
pub mod allocation;
pub mod conflict;
pub mod error;
pub mod task_pool;

// Re-export primary types at crate root.
pub use agent::{Agent, Assignment, History};
pub use allocation::Allocator;
pub use conflict::{
    Collision, Resolution, Trajectory, Wait, first_collision, is_collision_free,
    plan_independent, resolve_trajectories,
};
pub use error::{AgentError, ConflictError};
pub use task_pool::TaskPool;
