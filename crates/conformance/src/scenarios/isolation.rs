//! Value isolation between callers and the store, and collection partitioning.

use serde_json::json;

use entstore::types::{Collection, Entity, Query, RemoveOptions, SaveOptions};

use crate::assertions::{CaseResult, ensure, ensure_eq};
use crate::fixtures::{bar_template, load_existing, random_mark, verify_bar};
use crate::harness::{Case, CaseContext};

pub(super) fn cases() -> Vec<Case> {
    vec![
        case!("round trip", round_trip),
        case!("input mutation does not leak", input_mutation_does_not_leak),
        case!("output mutation does not leak", output_mutation_does_not_leak),
        case!("collections are disjoint", collections_are_disjoint),
    ]
}

fn shelf() -> Collection {
    Collection::new("shelf")
}

async fn round_trip(cx: &CaseContext) -> CaseResult {
    let mark = random_mark();
    let entity = bar_template(mark);
    let expected = entity.fields().clone();

    let saved = cx.store().save(entity, &SaveOptions::default()).await?;
    let loaded = load_existing(cx.store(), saved.collection(), saved.id()).await?;

    ensure_eq!(loaded.fields(), &expected, "loaded fields");
    ensure_eq!(loaded, saved, "loaded record");
    verify_bar(&loaded, mark)
}

async fn input_mutation_does_not_leak(cx: &CaseContext) -> CaseResult {
    let mut entity = Entity::new(shelf())
        .with_field("items", json!(["a", "b"]))
        .with_field("meta", json!({"size": 2}));
    let saved = cx
        .store()
        .save(entity.clone(), &SaveOptions::default())
        .await?;

    entity.set("items", json!(["changed"]));
    entity.set("meta", json!({"size": 0}));

    let loaded = load_existing(cx.store(), &shelf(), saved.id()).await?;
    ensure_eq!(loaded.get("items"), Some(&json!(["a", "b"])), "items");
    ensure_eq!(loaded.get("meta"), Some(&json!({"size": 2})), "meta");
    Ok(())
}

async fn output_mutation_does_not_leak(cx: &CaseContext) -> CaseResult {
    let entity = Entity::new(shelf()).with_field("items", json!(["x"]));
    let mut saved = cx.store().save(entity, &SaveOptions::default()).await?;
    let id = saved.id().to_string();

    saved.set("items", json!(["mutated"]));
    saved.set("extra", json!(true));

    let mut loaded = load_existing(cx.store(), &shelf(), &id).await?;
    ensure_eq!(loaded.get("items"), Some(&json!(["x"])), "items after save");
    ensure!(!loaded.has("extra"), "mutating a saved record reached the store");

    if let Some(items) = loaded.fields_mut().get_mut("items") {
        *items = json!([]);
    }

    let listed = cx
        .store()
        .list(&shelf(), &Query::by_id(&id))
        .await?;
    ensure_eq!(listed.len(), 1, "listed records");
    ensure_eq!(listed[0].get("items"), Some(&json!(["x"])), "items after load");
    Ok(())
}

async fn collections_are_disjoint(cx: &CaseContext) -> CaseResult {
    let here = Collection::new("bin").with_base("left");
    let there = Collection::new("bin").with_base("right");

    let kept = cx
        .store()
        .save(
            Entity::new(here.clone()).with_field("side", json!("left")),
            &SaveOptions::default(),
        )
        .await?;
    cx.store()
        .save(
            Entity::new(there.clone()).with_field("side", json!("right")),
            &SaveOptions::default(),
        )
        .await?;

    ensure_eq!(cx.store().list(&here, &Query::all()).await?.len(), 1, "left records");
    let foreign = cx.store().load(&there, &Query::by_id(kept.id())).await?;
    ensure!(foreign.is_none(), "loaded a record across collections");

    let outcome = cx
        .store()
        .remove(&there, &Query::all(), &RemoveOptions::all())
        .await?;
    ensure_eq!(outcome.removed, 1, "removed from right");
    ensure_eq!(cx.store().count(&here).await?, 1, "left records after remove");
    Ok(())
}
