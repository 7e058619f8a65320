//! Type-safe identifier wrappers.
//!
//! Agents are numbered densely from zero in fleet order. The numeric value
//! doubles as the agent's priority: lower ids win allocation ties and keep
//! their schedule when trajectories are serialized.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a newtype wrapper around `u32` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, $prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub u32);

        impl $name {
            /// Create an identifier from its raw index.
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Return the raw index.
            pub const fn into_inner(self) -> u32 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique, stable identifier for an agent for the duration of a run.
    AgentId, "agent-"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_by_raw_index() {
        assert!(AgentId::new(0) < AgentId::new(1));
        assert_eq!(AgentId::from(7).into_inner(), 7);
    }

    #[test]
    fn id_serializes_as_bare_number() {
        let json = serde_json::to_string(&AgentId::new(3)).ok();
        assert_eq!(json.as_deref(), Some("3"));
        let restored: Result<AgentId, _> = serde_json::from_str("3");
        assert_eq!(restored.ok(), Some(AgentId::new(3)));
    }

    #[test]
    fn id_display_has_prefix() {
        assert_eq!(AgentId::new(2).to_string(), "agent-2");
    }
}
