//! Conformance battery for entity-store adapters.
//!
//! The battery drives an [`EntityStore`](entstore::core::EntityStore) through
//! the scenarios every adapter must pass: basic CRUD over mixed value types,
//! sorting, pagination, the operator language, merge and replace updates,
//! upsert matching, value isolation, concurrent upserts and native queries.
//!
//! # Running against an adapter
//!
//! Inside an integration test, [`conformance_test!`] stamps one
//! `#[tokio::test]` per scenario:
//!
//! ```ignore
//! use entstore::backends::memory::MemoryStore;
//! use entstore::error::StorageResult;
//!
//! fn memory_store() -> StorageResult<MemoryStore> {
//!     Ok(MemoryStore::new())
//! }
//!
//! entstore_conformance::conformance_test!(memory, memory_store);
//! ```
//!
//! Elsewhere, run a [`Suite`] and inspect its [`SuiteReport`]:
//!
//! ```
//! use entstore::backends::memory::MemoryStore;
//! use entstore::error::StorageResult;
//! use entstore_conformance::harness::from_fn;
//! use entstore_conformance::{Suite, SuiteSettings};
//!
//! fn memory_store() -> StorageResult<MemoryStore> {
//!     Ok(MemoryStore::new())
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = Suite::new(SuiteSettings::default())
//!     .run(&from_fn(memory_store))
//!     .await?;
//! println!("{}", report);
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod assertions;
pub mod fixtures;
pub mod harness;
pub mod report;
pub mod scenarios;

pub use assertions::{CaseError, CaseResult};
pub use harness::{
    Case, CaseContext, CaseFuture, NativeStatements, StoreFactory, Suite, SuiteSettings,
};
pub use report::{CaseOutcome, CaseReport, ScenarioReport, SuiteReport};
pub use scenarios::{Scenario, UnknownScenario};

#[doc(hidden)]
pub use paste;
