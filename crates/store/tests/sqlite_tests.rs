//! SQLite adapter integration tests.
//!
//! These tests exercise the file-backed mode, which the unit tests and the
//! in-memory conformance runs do not reach: persistence across reopen and
//! atomic upserts across pooled connections.

#![cfg(feature = "sqlite")]

use std::sync::Arc;

use serde_json::json;

use entstore::backends::sqlite::{SqliteStore, SqliteStoreConfig};
use entstore::core::EntityStore;
use entstore::types::{Collection, Entity, Query, RemoveOptions, SaveOptions};

fn create_store() -> (tempfile::TempDir, SqliteStore) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = SqliteStore::open(dir.path().join("entities.db"))
        .expect("Failed to open SQLite store");
    (dir, store)
}

fn user() -> Collection {
    Collection::new("user")
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("entities.db");

    let id = {
        let store = SqliteStore::open(&path).unwrap();
        let saved = store
            .save(
                Entity::new(user()).with_field("email", json!("a@example.com")),
                &SaveOptions::default(),
            )
            .await
            .unwrap();
        store.close().await.unwrap();
        saved.id().to_string()
    };

    let store = SqliteStore::open(&path).unwrap();
    let loaded = store.load(&user(), &Query::by_id(&id)).await.unwrap();
    assert_eq!(
        loaded.and_then(|r| r.get("email").cloned()),
        Some(json!("a@example.com"))
    );
}

#[tokio::test]
async fn test_with_config_requires_init_schema() {
    let dir = tempfile::tempdir().unwrap();
    let store =
        SqliteStore::with_config(dir.path().join("raw.db"), SqliteStoreConfig::default()).unwrap();

    assert!(store.count(&user()).await.is_err());

    store.init_schema().unwrap();
    assert_eq!(store.count(&user()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_insertion_order_survives_updates() {
    let (_dir, store) = create_store();

    let mut ids = Vec::new();
    for n in 0..3 {
        let saved = store
            .save(
                Entity::new(user()).with_field("n", json!(n)),
                &SaveOptions::default(),
            )
            .await
            .unwrap();
        ids.push(saved.id().to_string());
    }

    store
        .save(
            Entity::new(user()).with_id(&ids[0]).with_field("n", json!(10)),
            &SaveOptions::default(),
        )
        .await
        .unwrap();

    let listed: Vec<String> = store
        .list(&user(), &Query::all())
        .await
        .unwrap()
        .iter()
        .map(|r| r.id().to_string())
        .collect();
    assert_eq!(listed, ids);
}

#[tokio::test]
async fn test_remove_is_scoped_to_collection() {
    let (_dir, store) = create_store();
    let other = Collection::new("user").with_base("archive");

    for collection in [user(), other.clone()] {
        store
            .save(
                Entity::new(collection).with_field("email", json!("a@example.com")),
                &SaveOptions::default(),
            )
            .await
            .unwrap();
    }

    let outcome = store
        .remove(&user(), &Query::all(), &RemoveOptions::all())
        .await
        .unwrap();
    assert_eq!(outcome.removed, 1);
    assert_eq!(store.count(&other).await.unwrap(), 1);
}

// ============================================================================
// Concurrency Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_upserts_across_connections() {
    let (_dir, store) = create_store();
    let store = Arc::new(store);

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .save(
                        Entity::new(user())
                            .with_field("email", json!("same@example.com"))
                            .with_field("name", json!("Same")),
                        &SaveOptions::upsert(["email"]),
                    )
                    .await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.count(&user()).await.unwrap(), 1);
}
