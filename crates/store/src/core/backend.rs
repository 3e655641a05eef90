//! Backend identification and capability discovery.
//!
//! Not every adapter supports every feature the conformance battery exercises.
//! [`BackendCapability`] lets callers (and the battery runner) ask before they
//! try, instead of treating an unsupported feature as a failure.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifies the type of storage adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Process-local, in-memory store.
    Memory,
    /// SQLite database (file-based or in-memory).
    Sqlite,
    /// Custom or third-party adapter.
    Custom(&'static str),
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Memory => write!(f, "memory"),
            BackendKind::Sqlite => write!(f, "sqlite"),
            BackendKind::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Capabilities that an adapter may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendCapability {
    /// Basic save/load/list/remove.
    Crud,
    /// Field-based upsert matching on save.
    Upsert,
    /// `sort$`.
    Sorting,
    /// `skip$` and `limit$`.
    Pagination,
    /// `fields$`.
    Projection,
    /// Adapter-native query passthrough.
    NativeQuery,
    /// Concurrent identical upserts yield exactly one record.
    AtomicUpsert,
}

impl BackendCapability {
    /// Every capability, in declaration order.
    pub const ALL: [BackendCapability; 7] = [
        BackendCapability::Crud,
        BackendCapability::Upsert,
        BackendCapability::Sorting,
        BackendCapability::Pagination,
        BackendCapability::Projection,
        BackendCapability::NativeQuery,
        BackendCapability::AtomicUpsert,
    ];
}

impl fmt::Display for BackendCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendCapability::Crud => "crud",
            BackendCapability::Upsert => "upsert",
            BackendCapability::Sorting => "sorting",
            BackendCapability::Pagination => "pagination",
            BackendCapability::Projection => "projection",
            BackendCapability::NativeQuery => "native-query",
            BackendCapability::AtomicUpsert => "atomic-upsert",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for BackendCapability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BackendCapability::ALL
            .into_iter()
            .find(|c| c.to_string() == s)
            .ok_or_else(|| format!("unknown capability: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_display() {
        assert_eq!(BackendKind::Memory.to_string(), "memory");
        assert_eq!(BackendKind::Sqlite.to_string(), "sqlite");
        assert_eq!(BackendKind::Custom("redis").to_string(), "redis");
    }

    #[test]
    fn test_capability_display_parse() {
        for capability in BackendCapability::ALL {
            let parsed: BackendCapability = capability.to_string().parse().unwrap();
            assert_eq!(parsed, capability);
        }
        assert!("teleport".parse::<BackendCapability>().is_err());
    }

    #[test]
    fn test_capability_serde_matches_display() {
        let json = serde_json::to_string(&BackendCapability::AtomicUpsert).unwrap();
        assert_eq!(json, "\"atomic-upsert\"");
    }
}
