//! In-memory adapter integration tests.

use std::sync::Arc;

use serde_json::json;

use entstore::backends::memory::MemoryStore;
use entstore::core::EntityStore;
use entstore::types::{Collection, Entity, Query, SaveOptions};

fn product() -> Collection {
    Collection::new("product")
}

async fn seed(store: &MemoryStore) {
    for (name, price) in [("apple", 100), ("pear", 200), ("cherry", 300)] {
        store
            .save(
                Entity::new(product())
                    .with_field("name", json!(name))
                    .with_field("price", json!(price)),
                &SaveOptions::default(),
            )
            .await
            .unwrap();
    }
}

// ============================================================================
// JSON Boundary Tests
// ============================================================================

#[tokio::test]
async fn test_save_from_json_with_directives() {
    let store = MemoryStore::new();

    let (entity, options) = Entity::from_json(
        product(),
        json!({"name": "apple", "price": 100, "id$": "0201775f-27c4-7428-b380-44b8f4c529f3"}),
    )
    .unwrap();
    let first = store.save(entity, &options).await.unwrap();
    assert_eq!(first.id(), "0201775f-27c4-7428-b380-44b8f4c529f3");

    let (entity, options) = Entity::from_json(
        product(),
        json!({"name": "apple", "price": 150, "upsert$": ["name"], "id$": "ignored"}),
    )
    .unwrap();
    let second = store.save(entity, &options).await.unwrap();

    assert_eq!(second.id(), first.id());
    assert_eq!(second.get("price"), Some(&json!(150)));
    assert_eq!(store.count(&product()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_list_from_json_query() {
    let store = MemoryStore::new();
    seed(&store).await;

    let query = Query::parse(&json!({
        "or$": [{"name": "cherry"}, {"price": 100}],
        "sort$": {"price": -1},
        "fields$": ["name"],
    }))
    .unwrap();

    let records = store.list(&product(), &query).await.unwrap();
    let json: Vec<_> = records
        .iter()
        .map(|r| {
            let mut v = r.to_json();
            v.as_object_mut().unwrap().remove("id");
            v
        })
        .collect();
    assert_eq!(json, vec![json!({"name": "cherry"}), json!({"name": "apple"})]);
}

#[tokio::test]
async fn test_list_sorts_by_keys_in_written_order() {
    let store = MemoryStore::new();
    for (id, name, price) in [("a", "x", 2), ("b", "x", 1), ("c", "y", 2)] {
        store
            .save(
                Entity::new(product())
                    .with_id_override(id)
                    .with_field("name", json!(name))
                    .with_field("price", json!(price)),
                &SaveOptions::default(),
            )
            .await
            .unwrap();
    }

    let value: serde_json::Value =
        serde_json::from_str(r#"{"sort$": {"price": 1, "name": -1}}"#).unwrap();
    let records = store
        .list(&product(), &Query::parse(&value).unwrap())
        .await
        .unwrap();
    let ids: Vec<_> = records.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec!["b", "c", "a"]);
}

#[tokio::test]
async fn test_numeric_id_found_by_literal_and_shorthand() {
    let store = MemoryStore::new();
    let (entity, options) =
        Entity::from_json(product(), json!({"id": 5, "name": "plum"})).unwrap();
    let saved = store.save(entity, &options).await.unwrap();
    assert_eq!(saved.id(), "5");

    for query in [json!(5), json!({"id": 5}), json!({"id": {"in$": [5]}})] {
        let found = store
            .list(&product(), &Query::parse(&query).unwrap())
            .await
            .unwrap();
        assert_eq!(found.len(), 1, "query {}", query);
    }
}

#[tokio::test]
async fn test_collections_are_disjoint() {
    let store = MemoryStore::new();
    seed(&store).await;

    let other: Collection = "shop/product".parse().unwrap();
    assert!(store.list(&other, &Query::all()).await.unwrap().is_empty());
    assert!(store.load(&other, &Query::all()).await.unwrap().is_none());
}

// ============================================================================
// Concurrency Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_upserts_collapse() {
    let store = Arc::new(MemoryStore::new());

    let handles: Vec<_> = (0..10)
        .map(|n| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .save(
                        Entity::new(Collection::new("user"))
                            .with_field("email", json!("same@example.com"))
                            .with_field("attempt", json!(n)),
                        &SaveOptions::upsert(["email"]),
                    )
                    .await
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id().to_string());
    }
    ids.dedup();

    assert_eq!(ids.len(), 1);
    assert_eq!(store.count(&Collection::new("user")).await.unwrap(), 1);
}
