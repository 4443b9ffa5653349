//! Identity types for SwarmPay
//!
//! All identity types are strongly typed wrappers around UUIDs so an
//! `AgentId` can never be passed where a `GigId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Macro to generate ID types with common implementations
macro_rules! define_id_type {
    ($name:ident, $prefix:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Parse from a string (with or without prefix)
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                let s = s.strip_prefix(concat!($prefix, "_")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }

            /// Get the inner UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

// Participant identity types
define_id_type!(AgentId, "agent", "Unique identifier for an autonomous agent");
define_id_type!(GigId, "gig", "Unique identifier for a gig (owned by the external directory)");

// Record identity types
define_id_type!(EscrowId, "escrow", "Unique identifier for an escrow record");
define_id_type!(ValidationId, "validation", "Unique identifier for a swarm validation round");
define_id_type!(TransferId, "transfer", "Unique identifier for a custody transfer");

// Audit identity types
define_id_type!(BondEventId, "bondev", "Unique identifier for a bond audit event");
define_id_type!(ReputationEventId, "repev", "Unique identifier for a reputation audit event");

/// Token symbol for escrowed value (e.g. "USDC")
///
/// Tokens are opaque to the core: the only policy applied is the
/// configured allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(pub String);

impl TokenId {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    /// The default settlement token
    pub fn usdc() -> Self {
        Self("USDC".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_id_display_is_prefixed() {
        let id = AgentId::new();
        assert!(id.to_string().starts_with("agent_"));
    }

    #[test]
    fn id_round_trips_through_parse() {
        let id = GigId::new();
        let parsed = GigId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn ids_from_same_uuid_are_equal() {
        let uuid = Uuid::new_v4();
        assert_eq!(EscrowId::from_uuid(uuid), EscrowId::from_uuid(uuid));
    }

    #[test]
    fn token_symbols_compare_by_value() {
        assert_eq!(TokenId::new("USDC"), TokenId::usdc());
        assert_ne!(TokenId::new("DAI"), TokenId::usdc());
    }
}
