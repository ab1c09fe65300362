//! Type-safe identifier wrappers.
//!
//! Every entity in the simulation has a strongly-typed ID to prevent
//! accidental mixing of identifiers at compile time.
//!
//! - [`AgentId`] wraps the stable roster key from the world configuration
//!   (e.g. `agent1`). Agents are never created mid-run, so the key is the
//!   identity.
//! - [`ObjectId`] wraps a UUID v7 (time-ordered). Collectibles are
//!   regenerated on every reset and receive fresh identifiers.
//! - [`DecisionId`] is a monotonically increasing request counter used by
//!   the decision broker to match oracle responses to the request that
//!   produced them.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a world object (landmark or collectible).
    ObjectId
}

/// Stable identifier for an agent, taken from the roster key in the
/// world configuration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AgentId(pub String);

impl AgentId {
    /// Create an agent identifier from a roster key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for AgentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(key: &str) -> Self {
        Self(key.to_owned())
    }
}

impl From<String> for AgentId {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Identifier of a single decision request sent to the oracle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DecisionId(pub u64);

impl DecisionId {
    /// Return the identifier that follows this one.
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl core::fmt::Display for DecisionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_ids_are_unique() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
        assert_ne!(a.into_inner(), Uuid::nil());
    }

    #[test]
    fn agent_id_serializes_as_plain_string() {
        let id = AgentId::new("agent1");
        let json = serde_json::to_string(&id).ok();
        assert_eq!(json.as_deref(), Some("\"agent1\""));
        assert_eq!(id.to_string(), "agent1");
    }

    #[test]
    fn decision_ids_increase() {
        let first = DecisionId(7);
        assert_eq!(first.next(), DecisionId(8));
        assert_eq!(DecisionId(u64::MAX).next(), DecisionId(u64::MAX));
    }
}
