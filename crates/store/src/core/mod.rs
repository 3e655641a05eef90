//! Core storage traits and abstractions.
//!
//! - [`EntityStore`] - The adapter contract: save, load, list, remove, native
//! - [`BackendKind`] - Adapter identification
//! - [`BackendCapability`] - Runtime capability discovery
//!
//! # Example: Implementing an Adapter
//!
//! ```ignore
//! use async_trait::async_trait;
//! use entstore::core::{BackendCapability, BackendKind, EntityStore};
//! use entstore::engine;
//!
//! struct MyStore {
//!     // ... adapter-specific state
//! }
//!
//! #[async_trait]
//! impl EntityStore for MyStore {
//!     fn backend_name(&self) -> &'static str {
//!         "my-store"
//!     }
//!
//!     async fn list(&self, collection: &Collection, query: &Query) -> StorageResult<Vec<Record>> {
//!         let records = self.fetch(collection).await?;
//!         Ok(engine::select(&records, query))
//!     }
//!
//!     // ... other methods
//! }
//! ```

mod backend;
mod storage;

pub use backend::{BackendCapability, BackendKind};
pub use storage::EntityStore;
