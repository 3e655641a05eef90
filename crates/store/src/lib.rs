//! Entity store contract and query engine.
//!
//! This crate defines what it means to be an entity-store adapter: how a
//! query selects records, how results are sorted, windowed and projected, how
//! a save decides between inserting and updating, and what it leaves behind.
//! Adapters share one matching [`engine`], so every adapter answers a query the
//! same way.
//!
//! # Features
//!
//! - **Query language**: literal equality, `eq$ ne$ gt$ gte$ lt$ lte$ in$ nin$`,
//!   nested `and$`/`or$`, `sort$`, `skip$`, `limit$`, `fields$`
//! - **Upsert**: field-based matching with atomic match+write
//! - **Merge or replace** updates, with explicit unset markers
//! - **Native queries**: adapter-specific passthrough (SQL on SQLite)
//!
//! Available backend features:
//! - `sqlite` (default) - SQLite with in-memory and file modes
//!
//! # Architecture
//!
//! - [`types`] - Collections, records, entities, queries and options
//! - [`engine`] - Pure filter, shape, upsert and mutation functions
//! - [`core`] - The [`EntityStore`] trait and capability discovery
//! - [`error`] - Error types for all operations
//! - [`backends`] - Reference adapters (memory, SQLite)
//!
//! # Quick Start
//!
//! ```
//! use entstore::backends::memory::MemoryStore;
//! use entstore::types::{Collection, Entity, Query, SaveOptions};
//! use entstore::EntityStore;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! let product = Collection::new("product");
//!
//! for (name, price) in [("apple", 100), ("pear", 200), ("cherry", 300)] {
//!     let entity = Entity::new(product.clone())
//!         .with_field("name", json!(name))
//!         .with_field("price", json!(price));
//!     store.save(entity, &SaveOptions::default()).await?;
//! }
//!
//! let query = Query::parse(&json!({"price": {"gte$": 200}, "sort$": {"price": -1}}))?;
//! let names: Vec<_> = store
//!     .list(&product, &query)
//!     .await?
//!     .iter()
//!     .map(|r| r.get("name").cloned())
//!     .collect();
//!
//! assert_eq!(names, vec![Some(json!("cherry")), Some(json!("pear"))]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod core;
pub mod engine;
pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{StorageError, StorageResult};
pub use types::{Collection, Entity, Query, Record, SaveOptions};

// Re-export core traits
pub use crate::core::{BackendCapability, BackendKind, EntityStore};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
