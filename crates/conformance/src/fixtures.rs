//! Shared test data.
//!
//! Every scenario builds its own records from these fixtures through the
//! store handle it is given; nothing here holds state between runs.

use serde_json::{Value, json};
use uuid::Uuid;

use entstore::core::EntityStore;
use entstore::types::{Collection, Entity, Query, Record, SaveOptions};

use crate::assertions::{CaseResult, ensure_eq, expect_some};

/// Plain collection with no zone or base.
pub fn foo() -> Collection {
    Collection::new("foo")
}

/// Fully qualified collection `zen/moon/bar`.
pub fn bar() -> Collection {
    Collection::qualified(Some("zen"), Some("moon"), "bar")
}

/// Collection used by the operator and native scenarios.
pub fn product() -> Collection {
    Collection::new("product")
}

/// Collection used by the upsert and concurrency scenarios.
pub fn user() -> Collection {
    Collection::new("user")
}

/// Name and price of the seeded products, in insertion order.
pub const PRODUCTS: [(&str, i64); 3] = [("apple", 100), ("pear", 200), ("cherry", 300)];

/// Instant stored in the `wen` field of [`bar_template`].
pub const BAR_INSTANT: &str = "2020-02-01T00:00:00.000Z";

/// Returns a random marker used to tell saved templates apart.
pub fn random_mark() -> i64 {
    (Uuid::new_v4().as_u128() % 1_000_000_000) as i64
}

/// The mixed-type template: one field of every value kind.
pub fn bar_template(mark: i64) -> Entity {
    Entity::new(bar())
        .with_field("str", json!("aaa"))
        .with_field("int", json!(11))
        .with_field("dec", json!(33.33))
        .with_field("bol", json!(false))
        .with_field("wen", json!(BAR_INSTANT))
        .with_field("arr", json!([2, 3]))
        .with_field("obj", json!({"a": 1, "b": [2], "c": {"d": 3}}))
        .with_field("mark", json!(mark))
}

/// Checks that a record holds the [`bar_template`] values for `mark`.
pub fn verify_bar(record: &Record, mark: i64) -> CaseResult {
    ensure_eq!(record.collection(), &bar(), "collection");
    ensure_eq!(record.get("str"), Some(&json!("aaa")), "str");
    ensure_eq!(record.get("int"), Some(&json!(11)), "int");
    ensure_eq!(record.get("dec"), Some(&json!(33.33)), "dec");
    ensure_eq!(record.get("bol"), Some(&json!(false)), "bol");
    ensure_eq!(record.get("wen"), Some(&json!(BAR_INSTANT)), "wen");
    ensure_eq!(record.get("arr"), Some(&json!([2, 3])), "arr");
    ensure_eq!(
        record.get("obj"),
        Some(&json!({"a": 1, "b": [2], "c": {"d": 3}})),
        "obj"
    );
    ensure_eq!(record.get("mark"), Some(&json!(mark)), "mark");
    Ok(())
}

/// Saves apple, pear and cherry into [`product`].
pub async fn seed_products(store: &dyn EntityStore) -> CaseResult<Vec<Record>> {
    let mut saved = Vec::with_capacity(PRODUCTS.len());
    for (name, price) in PRODUCTS {
        let entity = Entity::new(product())
            .with_field("name", json!(name))
            .with_field("price", json!(price));
        saved.push(store.save(entity, &SaveOptions::default()).await?);
    }
    Ok(saved)
}

/// Saves three records whose `p1`, `p2` and `p3` all hold `v1`, then `v2`,
/// then `v3`.
pub async fn seed_triplet(store: &dyn EntityStore, collection: &Collection) -> CaseResult<Vec<Record>> {
    let mut saved = Vec::with_capacity(3);
    for n in 1..=3 {
        let entity = Entity::new(collection.clone())
            .with_field("p1", json!(format!("v{}", n)))
            .with_field("p2", json!(format!("v{}", n)))
            .with_field("p3", json!(format!("v{}", n)));
        saved.push(store.save(entity, &SaveOptions::default()).await?);
    }
    Ok(saved)
}

/// Parses a JSON query.
pub fn query(value: Value) -> CaseResult<Query> {
    Ok(Query::parse(&value)?)
}

/// Loads a record by identity, failing when it does not exist.
pub async fn load_existing(
    store: &dyn EntityStore,
    collection: &Collection,
    id: &str,
) -> CaseResult<Record> {
    let loaded = store.load(collection, &Query::by_id(id)).await?;
    expect_some(loaded, &format!("record {} in {}", id, collection))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_is_qualified() {
        assert_eq!(bar().to_string(), "zen/moon/bar");
        assert_eq!(foo().to_string(), "-/-/foo");
    }

    #[test]
    fn test_bar_template_verifies() {
        let entity = bar_template(7);
        let record = Record::from_parts(bar(), "b1", entity.fields().clone());
        assert!(verify_bar(&record, 7).is_ok());
        assert!(verify_bar(&record, 8).is_err());
    }

    #[test]
    fn test_random_mark_is_non_negative() {
        for _ in 0..16 {
            assert!(random_mark() >= 0);
        }
    }
}
