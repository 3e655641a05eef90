//! Save, load, list and remove across mixed value types.

use serde_json::json;

use entstore::types::{Entity, Query, RemoveOptions, SaveOptions};

use crate::assertions::{CaseResult, ensure, ensure_eq, expect_some};
use crate::fixtures::{bar, bar_template, foo, load_existing, random_mark, verify_bar};
use crate::harness::{Case, CaseContext, SuiteSettings};

const FIXED_ID: &str = "0201775f-27c4-7428-b380-44b8f4c529f3";

pub(super) fn cases(_settings: &SuiteSettings) -> Vec<Case> {
    vec![
        case!("load missing", load_missing),
        case!("save new", save_new),
        case!("load existing", load_existing_foo),
        case!("save again", save_again),
        case!("load again", load_again),
        case!("save mixed types", save_mixed_types),
        case!("save with existing collection name", save_second_foo),
        case!("save with id override", save_with_id_override),
        case!("list one", list_one),
        case!("list many", list_many),
        case!("list by id", list_by_id),
        case!("list by number", list_by_number),
        case!("list by string", list_by_string),
        case!("list by two fields", list_by_two_fields),
        case!("remove all by collection", remove_all),
        case!("remove by field", remove_by_field),
    ]
}

async fn load_missing(cx: &CaseContext) -> CaseResult {
    let loaded = cx
        .store()
        .load(&foo(), &Query::by_id("does-not-exist-at-all-at-all"))
        .await?;
    ensure!(loaded.is_none(), "expected no record, got {:?}", loaded);
    Ok(())
}

async fn save_new(cx: &CaseContext) -> CaseResult {
    let entity = Entity::new(foo())
        .with_field("p1", json!("v1"))
        .with_field("p3", json!("v3"));
    let saved = cx.store().save(entity, &SaveOptions::default()).await?;

    ensure!(!saved.id().is_empty(), "saved record has an empty id");
    ensure_eq!(saved.get("p1"), Some(&json!("v1")), "p1");
    ensure_eq!(saved.get("p3"), Some(&json!("v3")), "p3");
    cx.remember("foo1", saved);
    Ok(())
}

async fn load_existing_foo(cx: &CaseContext) -> CaseResult {
    let foo1 = cx.recall("foo1")?;
    let loaded = load_existing(cx.store(), &foo(), foo1.id()).await?;

    ensure_eq!(loaded.id(), foo1.id(), "id");
    ensure_eq!(loaded.get("p1"), Some(&json!("v1")), "p1");
    cx.remember("foo1", loaded);
    Ok(())
}

async fn save_again(cx: &CaseContext) -> CaseResult {
    let mut entity = Entity::from_record(cx.recall("foo1")?);
    entity.set("p1", json!("v1x"));
    entity.set("p2", json!("v2"));
    entity.remove("p3");

    let saved = cx.store().save(entity, &SaveOptions::default()).await?;
    ensure_eq!(saved.get("p1"), Some(&json!("v1x")), "p1");
    ensure_eq!(saved.get("p2"), Some(&json!("v2")), "p2");
    if cx.settings().must_merge {
        ensure_eq!(saved.get("p3"), Some(&json!("v3")), "p3 kept by merge");
    }
    cx.remember("foo1", saved);
    Ok(())
}

async fn load_again(cx: &CaseContext) -> CaseResult {
    let foo1 = cx.recall("foo1")?;
    let loaded = load_existing(cx.store(), &foo(), foo1.id()).await?;

    ensure_eq!(loaded.get("p1"), Some(&json!("v1x")), "p1");
    ensure_eq!(loaded.get("p2"), Some(&json!("v2")), "p2");
    cx.remember("foo1", loaded);
    Ok(())
}

async fn save_mixed_types(cx: &CaseContext) -> CaseResult {
    let mark = random_mark();
    let saved = cx
        .store()
        .save(bar_template(mark), &SaveOptions::default())
        .await?;

    ensure!(!saved.id().is_empty(), "saved record has an empty id");
    verify_bar(&saved, mark)?;
    cx.remember("bar", saved);
    Ok(())
}

async fn save_second_foo(cx: &CaseContext) -> CaseResult {
    let entity = Entity::new(foo()).with_field("p2", json!("v2"));
    let saved = cx.store().save(entity, &SaveOptions::default()).await?;

    ensure!(!saved.id().is_empty(), "saved record has an empty id");
    ensure_eq!(saved.get("p2"), Some(&json!("v2")), "p2");
    ensure!(
        saved.id() != cx.recall("foo1")?.id(),
        "second save reused the first record's id"
    );
    Ok(())
}

async fn save_with_id_override(cx: &CaseContext) -> CaseResult {
    let entity = Entity::new(foo()).with_id_override(FIXED_ID);
    let saved = cx.store().save(entity, &SaveOptions::default()).await?;

    ensure_eq!(saved.id(), FIXED_ID, "id");
    load_existing(cx.store(), &foo(), FIXED_ID).await?;
    Ok(())
}

async fn list_one(cx: &CaseContext) -> CaseResult {
    let mark = mark_of(cx)?;
    let records = cx.store().list(&bar(), &Query::all()).await?;

    ensure!(!records.is_empty(), "expected at least one bar record");
    verify_bar(&records[0], mark)
}

async fn list_many(cx: &CaseContext) -> CaseResult {
    let records = cx.store().list(&foo(), &Query::all()).await?;
    ensure!(
        records.len() >= 2,
        "expected at least two foo records, got {}",
        records.len()
    );
    Ok(())
}

async fn list_by_id(cx: &CaseContext) -> CaseResult {
    let bar_record = cx.recall("bar")?;
    let query = Query::all().where_eq("id", json!(bar_record.id()));
    let records = cx.store().list(&bar(), &query).await?;

    ensure_eq!(records.len(), 1, "records with the bar id");
    verify_bar(&records[0], mark_of(cx)?)
}

async fn list_by_number(cx: &CaseContext) -> CaseResult {
    let mark = mark_of(cx)?;
    let query = Query::all().where_eq("mark", json!(mark));
    let records = cx.store().list(&bar(), &query).await?;

    ensure_eq!(records.len(), 1, "records with the mark");
    verify_bar(&records[0], mark)
}

async fn list_by_string(cx: &CaseContext) -> CaseResult {
    let query = Query::all().where_eq("p2", json!("v2"));
    let records = cx.store().list(&foo(), &query).await?;
    ensure!(
        records.len() >= 2,
        "expected at least two records with p2=v2, got {}",
        records.len()
    );
    Ok(())
}

async fn list_by_two_fields(cx: &CaseContext) -> CaseResult {
    let query = Query::all()
        .where_eq("p2", json!("v2"))
        .where_eq("p1", json!("v1x"));
    let records = cx.store().list(&foo(), &query).await?;

    ensure!(!records.is_empty(), "expected a record with p1=v1x and p2=v2");
    for record in &records {
        ensure_eq!(record.get("p2"), Some(&json!("v2")), "p2 of {}", record.id());
        ensure_eq!(record.get("p1"), Some(&json!("v1x")), "p1 of {}", record.id());
    }
    Ok(())
}

async fn remove_all(cx: &CaseContext) -> CaseResult {
    let outcome = cx
        .store()
        .remove(&foo(), &Query::all(), &RemoveOptions::all())
        .await?;
    ensure!(outcome.removed >= 3, "expected every foo removed, got {}", outcome.removed);

    let records = cx.store().list(&foo(), &Query::all()).await?;
    ensure_eq!(records.len(), 0, "foo records after remove");
    Ok(())
}

async fn remove_by_field(cx: &CaseContext) -> CaseResult {
    let query = Query::all().where_eq("mark", json!(mark_of(cx)?));
    let outcome = cx
        .store()
        .remove(&bar(), &query, &RemoveOptions::load())
        .await?;

    ensure_eq!(outcome.removed, 1, "removed");
    let removed = expect_some(outcome.record, "the removed record")?;
    ensure_eq!(removed.id(), cx.recall("bar")?.id(), "removed id");

    let records = cx.store().list(&bar(), &query).await?;
    ensure_eq!(records.len(), 0, "bar records after remove");
    Ok(())
}

fn mark_of(cx: &CaseContext) -> CaseResult<i64> {
    let bar_record = cx.recall("bar")?;
    let mark = bar_record.get("mark").and_then(|v| v.as_i64());
    expect_some(mark, "an integer mark on the bar record")
}
