//! Shared type definitions for the gridfleet workspace.
//!
//! Types defined here flow to every other crate and, via `ts-rs`, to the
//! `TypeScript` side of whatever renders the simulation.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe agent identifiers
//! - [`position`] -- Grid coordinates and the four unit moves
//! - [`enums`] -- Policy, mode and outcome enumerations
//! - [`snapshot`] -- Per-tick snapshots for external consumers

pub mod enums;
pub mod ids;
pub mod position;
pub mod snapshot;

// Re-export all public types at crate root for convenience.
pub use enums::{
    AgentStatus, AllocationPolicy, CollisionMode, RegionScheme, ReplanMode, ScenarioKind,
    StopReason,
};
pub use ids::AgentId;
pub use position::{Direction, Position};
pub use snapshot::{AgentSnapshot, TaskClaim, TickSnapshot};

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    //! Binding generation and snapshot payload checks.

    use super::*;

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::ids::AgentId::export_all();
        let _ = crate::position::Position::export_all();
        let _ = crate::position::Direction::export_all();
        let _ = crate::enums::AllocationPolicy::export_all();
        let _ = crate::enums::RegionScheme::export_all();
        let _ = crate::enums::ReplanMode::export_all();
        let _ = crate::enums::CollisionMode::export_all();
        let _ = crate::enums::StopReason::export_all();
        let _ = crate::enums::AgentStatus::export_all();
        let _ = crate::enums::ScenarioKind::export_all();
        let _ = crate::snapshot::AgentSnapshot::export_all();
        let _ = crate::snapshot::TaskClaim::export_all();
        let _ = crate::snapshot::TickSnapshot::export_all();
    }

    #[test]
    fn snapshot_payload_shape() {
        let snapshot = TickSnapshot {
            tick: 3,
            agents: vec![AgentSnapshot {
                id: AgentId::new(0),
                position: Position::new(1, 2),
                status: AgentStatus::EnRoute,
                task: Some(Position::new(4, 4)),
                route: vec![Position::new(1, 2), Position::new(1, 3)],
                trail: vec![Position::new(0, 2), Position::new(1, 2)],
                completed: 1,
            }],
            tasks: vec![Position::new(4, 4)],
            claims: Vec::new(),
        };
        let value = serde_json::to_value(&snapshot).unwrap_or_default();
        assert_eq!(value["tick"], 3);
        assert_eq!(value["agents"][0]["id"], 0);
        assert_eq!(value["agents"][0]["status"], "en_route");
        assert_eq!(value["agents"][0]["position"]["col"], 2);
        assert_eq!(snapshot.agent(AgentId::new(0)).map(|a| a.completed), Some(1));
        assert!(snapshot.agent(AgentId::new(9)).is_none());
    }
}
