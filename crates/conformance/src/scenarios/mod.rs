//! The battery's scenarios.
//!
//! Each scenario is an ordered list of [`Case`]s run against one freshly
//! cleared store. Later cases may rely on records kept by earlier ones.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use entstore::core::BackendCapability;

use crate::harness::{Case, SuiteSettings};

/// Builds a [`Case`] from an `async fn(&CaseContext) -> CaseResult`. Declared
/// ahead of the scenario modules so they see it.
macro_rules! case {
    ($name:expr, $body:path) => {
        $crate::harness::Case::new($name, |cx| Box::pin($body(cx)))
    };
}

mod basic;
mod concurrency;
mod isolation;
mod limits;
mod mutation;
mod native;
mod operators;
mod sort;
mod upsert;

/// A named group of conformance cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// Save, load, list and remove across mixed value types.
    Basic,
    /// Ascending and descending sort.
    Sort,
    /// Skip and limit windows, including malformed values.
    Limits,
    /// Comparison operators and logical combinators.
    Operators,
    /// Merge, replace, null and unset semantics.
    Mutation,
    /// Upsert matching.
    Upsert,
    /// Value isolation and collection partitioning.
    Isolation,
    /// Concurrent upserts converging on one record.
    Concurrency,
    /// Adapter-native query passthrough.
    Native,
}

/// Error for an unrecognized scenario name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown scenario '{0}'")]
pub struct UnknownScenario(pub String);

impl Scenario {
    /// Every scenario, in the order a full run executes them.
    pub const ALL: [Scenario; 9] = [
        Scenario::Basic,
        Scenario::Sort,
        Scenario::Limits,
        Scenario::Operators,
        Scenario::Mutation,
        Scenario::Upsert,
        Scenario::Isolation,
        Scenario::Concurrency,
        Scenario::Native,
    ];

    /// Returns the lowercase scenario name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Basic => "basic",
            Scenario::Sort => "sort",
            Scenario::Limits => "limits",
            Scenario::Operators => "operators",
            Scenario::Mutation => "mutation",
            Scenario::Upsert => "upsert",
            Scenario::Isolation => "isolation",
            Scenario::Concurrency => "concurrency",
            Scenario::Native => "native",
        }
    }

    /// Capabilities every case of the scenario needs.
    pub fn requires(&self) -> &'static [BackendCapability] {
        match self {
            Scenario::Basic | Scenario::Mutation | Scenario::Isolation => &[BackendCapability::Crud],
            Scenario::Sort => &[BackendCapability::Crud, BackendCapability::Sorting],
            Scenario::Limits => &[BackendCapability::Crud, BackendCapability::Pagination],
            Scenario::Operators => &[BackendCapability::Crud],
            Scenario::Upsert => &[BackendCapability::Crud, BackendCapability::Upsert],
            Scenario::Concurrency => &[BackendCapability::Upsert, BackendCapability::AtomicUpsert],
            Scenario::Native => &[BackendCapability::NativeQuery],
        }
    }

    /// Builds the scenario's cases.
    pub fn cases(&self, settings: &SuiteSettings) -> Vec<Case> {
        match self {
            Scenario::Basic => basic::cases(settings),
            Scenario::Sort => sort::cases(),
            Scenario::Limits => limits::cases(),
            Scenario::Operators => operators::cases(),
            Scenario::Mutation => mutation::cases(),
            Scenario::Upsert => upsert::cases(),
            Scenario::Isolation => isolation::cases(),
            Scenario::Concurrency => concurrency::cases(),
            Scenario::Native => native::cases(settings),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = UnknownScenario;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.as_str() == name)
            .ok_or_else(|| UnknownScenario(s.to_string()))
    }
}
