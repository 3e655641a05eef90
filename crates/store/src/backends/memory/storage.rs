//! EntityStore implementation for the in-memory adapter.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::core::{BackendCapability, BackendKind, EntityStore};
use crate::engine;
use crate::error::StorageResult;
use crate::types::{Collection, Entity, Query, Record, RemoveOptions, RemoveOutcome, SaveOptions};

type Collections = HashMap<Collection, Vec<Record>>;

/// Process-local entity store.
///
/// Cloning is cheap and clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn backend_kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn capabilities(&self) -> Vec<BackendCapability> {
        vec![
            BackendCapability::Crud,
            BackendCapability::Upsert,
            BackendCapability::Sorting,
            BackendCapability::Pagination,
            BackendCapability::Projection,
            BackendCapability::AtomicUpsert,
        ]
    }

    async fn save(&self, entity: Entity, options: &SaveOptions) -> StorageResult<Record> {
        entity.collection().validate()?;

        let mut collections = self.collections.write();
        let records = collections.entry(entity.collection().clone()).or_default();

        let action = engine::plan_save(records.iter(), &entity, options);
        let inserted = action.is_insert();
        let (id, fields) = action.into_parts();
        let record = Record::from_parts(entity.collection().clone(), id, fields);

        if inserted {
            records.push(record.clone());
        } else if let Some(slot) = records.iter_mut().find(|r| r.id() == record.id()) {
            *slot = record.clone();
        }

        tracing::debug!(
            collection = %record.collection(),
            id = %record.id(),
            inserted,
            "Saved record"
        );

        Ok(record)
    }

    async fn load(&self, collection: &Collection, query: &Query) -> StorageResult<Option<Record>> {
        let collections = self.collections.read();
        let found = collections
            .get(collection)
            .and_then(|records| engine::first(records, query));
        Ok(found)
    }

    async fn list(&self, collection: &Collection, query: &Query) -> StorageResult<Vec<Record>> {
        let collections = self.collections.read();
        let records = collections
            .get(collection)
            .map(|records| engine::select(records, query))
            .unwrap_or_default();

        tracing::debug!(collection = %collection, count = records.len(), "Listed records");
        Ok(records)
    }

    async fn remove(
        &self,
        collection: &Collection,
        query: &Query,
        options: &RemoveOptions,
    ) -> StorageResult<RemoveOutcome> {
        let mut collections = self.collections.write();
        let Some(records) = collections.get_mut(collection) else {
            return Ok(RemoveOutcome::default());
        };

        let mut doomed = engine::select(records.iter(), query);
        if !options.all {
            doomed.truncate(1);
        }
        records.retain(|r| !doomed.iter().any(|d| d.id() == r.id()));

        tracing::debug!(
            collection = %collection,
            removed = doomed.len(),
            "Removed records"
        );

        let removed = doomed.len();
        let record = if options.load {
            doomed.into_iter().next()
        } else {
            None
        };
        Ok(RemoveOutcome { removed, record })
    }

    async fn count(&self, collection: &Collection) -> StorageResult<u64> {
        let collections = self.collections.read();
        Ok(collections.get(collection).map_or(0, |r| r.len() as u64))
    }

    async fn clear(&self) -> StorageResult<()> {
        self.collections.write().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn foo() -> Collection {
        Collection::new("foo")
    }

    #[tokio::test]
    async fn test_save_assigns_id() {
        let store = MemoryStore::new();
        let record = store
            .save(
                Entity::new(foo()).with_field("p1", json!("v1")),
                &SaveOptions::default(),
            )
            .await
            .unwrap();
        assert!(!record.id().is_empty());
        assert_eq!(store.count(&foo()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_save_rejects_empty_collection() {
        let store = MemoryStore::new();
        let result = store
            .save(Entity::new(Collection::new("")), &SaveOptions::default())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_update_keeps_position() {
        let store = MemoryStore::new();
        let first = store
            .save(Entity::new(foo()).with_field("n", json!(1)), &SaveOptions::default())
            .await
            .unwrap();
        store
            .save(Entity::new(foo()).with_field("n", json!(2)), &SaveOptions::default())
            .await
            .unwrap();
        store
            .save(
                Entity::from_record(first.clone()).with_field("n", json!(3)),
                &SaveOptions::default(),
            )
            .await
            .unwrap();

        let all = store.list(&foo(), &Query::all()).await.unwrap();
        assert_eq!(all[0].id(), first.id());
        assert_eq!(all[0].get("n"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn test_remove_first_then_all() {
        let store = MemoryStore::new();
        for n in 0..3 {
            store
                .save(Entity::new(foo()).with_field("n", json!(n)), &SaveOptions::default())
                .await
                .unwrap();
        }

        let outcome = store
            .remove(&foo(), &Query::all(), &RemoveOptions::load())
            .await
            .unwrap();
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.record.unwrap().get("n"), Some(&json!(0)));

        let outcome = store
            .remove(&foo(), &Query::all(), &RemoveOptions::all())
            .await
            .unwrap();
        assert_eq!(outcome.removed, 2);
        assert!(outcome.record.is_none());
        assert_eq!(store.count(&foo()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_native_unsupported() {
        let store = MemoryStore::new();
        let result = store
            .native(&foo(), &crate::types::NativeQuery::sql("SELECT 1"))
            .await;
        assert!(matches!(
            result,
            Err(crate::error::StorageError::Backend(
                crate::error::BackendError::UnsupportedCapability { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        store
            .save(Entity::new(foo()), &SaveOptions::default())
            .await
            .unwrap();
        assert_eq!(other.count(&foo()).await.unwrap(), 1);
        other.clear().await.unwrap();
        assert_eq!(store.count(&foo()).await.unwrap(), 0);
    }
}
