//! Core entity store trait.
//!
//! This module defines the [`EntityStore`] trait, the contract every storage
//! adapter fulfils. Adapters own their state; the matching rules live in
//! [`engine`](crate::engine) so that every adapter answers a query the same way.

use async_trait::async_trait;

use super::backend::{BackendCapability, BackendKind};
use crate::error::{BackendError, StorageResult};
use crate::types::{
    Collection, Entity, NativeQuery, Query, Record, RemoveOptions, RemoveOutcome, SaveOptions,
};

/// Storage adapter contract.
///
/// All operations are scoped to a single [`Collection`]; nothing crosses
/// collections except [`clear`](EntityStore::clear).
///
/// # Snapshots
///
/// Every [`Record`] returned is an owned snapshot. Mutating it never affects
/// stored data, and later writes never affect a record already handed out.
///
/// # Example
///
/// ```
/// use entstore::backends::memory::MemoryStore;
/// use entstore::core::EntityStore;
/// use entstore::types::{Collection, Entity, Query, SaveOptions};
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let foo = Collection::new("foo");
///
/// let saved = store
///     .save(
///         Entity::new(foo.clone()).with_field("p1", json!("v1")),
///         &SaveOptions::default(),
///     )
///     .await?;
///
/// let loaded = store.load(&foo, &Query::by_id(saved.id())).await?;
/// assert_eq!(loaded, Some(saved));
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Returns a human-readable name for this adapter.
    fn backend_name(&self) -> &'static str;

    /// Returns the adapter type.
    fn backend_kind(&self) -> BackendKind;

    /// Returns the capabilities this adapter supports.
    fn capabilities(&self) -> Vec<BackendCapability>;

    /// Returns true if the adapter supports the capability.
    fn supports(&self, capability: BackendCapability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Persists an entity and returns the stored record.
    ///
    /// An entity with an identity updates that record, or creates it under
    /// that identity if it does not exist. With [`SaveOptions::upsert`] set,
    /// the first record whose listed fields equal the entity's values is
    /// updated instead of inserting. Match and write are atomic.
    ///
    /// # Errors
    ///
    /// * `StorageError::Validation` - If the collection name is empty
    /// * `StorageError::Backend` - If the adapter fails to write
    async fn save(&self, entity: Entity, options: &SaveOptions) -> StorageResult<Record>;

    /// Returns the first record matching the query, after sort and skip.
    async fn load(&self, collection: &Collection, query: &Query) -> StorageResult<Option<Record>>;

    /// Returns every record matching the query, shaped by its sort, skip,
    /// limit and projection.
    async fn list(&self, collection: &Collection, query: &Query) -> StorageResult<Vec<Record>>;

    /// Removes the first match, or every match with [`RemoveOptions::all`].
    ///
    /// Removing nothing is not an error.
    async fn remove(
        &self,
        collection: &Collection,
        query: &Query,
        options: &RemoveOptions,
    ) -> StorageResult<RemoveOutcome>;

    /// Runs an adapter-native query and maps its rows to records.
    ///
    /// # Errors
    ///
    /// * `BackendError::UnsupportedCapability` - If the adapter has no native
    ///   query language (the default)
    async fn native(
        &self,
        collection: &Collection,
        query: &NativeQuery,
    ) -> StorageResult<Vec<Record>> {
        let _ = (collection, query);
        Err(BackendError::UnsupportedCapability {
            backend_name: self.backend_name().to_string(),
            capability: BackendCapability::NativeQuery.to_string(),
        }
        .into())
    }

    /// Returns the number of records in a collection.
    async fn count(&self, collection: &Collection) -> StorageResult<u64> {
        let records = self.list(collection, &Query::all()).await?;
        Ok(records.len() as u64)
    }

    /// Removes every record in every collection.
    async fn clear(&self) -> StorageResult<()>;

    /// Releases adapter resources. The default does nothing.
    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}
