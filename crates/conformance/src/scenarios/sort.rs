//! Ascending and descending sort, and stability among ties.

use serde_json::json;

use entstore::types::{Entity, Query, SaveOptions, SortKey};

use crate::assertions::{CaseResult, ensure_eq, field_strings, ids};
use crate::fixtures::{foo, query, seed_triplet};
use crate::harness::{Case, CaseContext};

pub(super) fn cases() -> Vec<Case> {
    vec![
        case!("seed", seed),
        case!("ascending", ascending),
        case!("descending", descending),
        case!("multiple keys", multiple_keys),
        case!("keys apply in written order", keys_apply_in_written_order),
        case!("ties keep insertion order", ties_keep_insertion_order),
    ]
}

async fn seed(cx: &CaseContext) -> CaseResult {
    let saved = seed_triplet(cx.store(), &foo()).await?;
    ensure_eq!(saved.len(), 3, "seeded records");
    Ok(())
}

async fn ascending(cx: &CaseContext) -> CaseResult {
    let records = cx
        .store()
        .list(&foo(), &query(json!({"sort$": {"p1": 1}}))?)
        .await?;
    ensure_eq!(field_strings(&records, "p1"), vec!["v1", "v2", "v3"]);
    Ok(())
}

async fn descending(cx: &CaseContext) -> CaseResult {
    let records = cx
        .store()
        .list(&foo(), &query(json!({"sort$": {"p1": -1}}))?)
        .await?;
    ensure_eq!(field_strings(&records, "p1"), vec!["v3", "v2", "v1"]);
    Ok(())
}

async fn multiple_keys(cx: &CaseContext) -> CaseResult {
    let extra = Entity::new(foo())
        .with_field("p1", json!("v2"))
        .with_field("p2", json!("v0"));
    cx.store().save(extra, &SaveOptions::default()).await?;

    let query = Query::all()
        .with_sort(SortKey::desc("p1"))
        .with_sort(SortKey::asc("p2"));
    let records = cx.store().list(&foo(), &query).await?;

    ensure_eq!(field_strings(&records, "p1"), vec!["v3", "v2", "v2", "v1"]);
    ensure_eq!(field_strings(&records, "p2"), vec!["v3", "v0", "v2", "v1"]);

    let parsed = crate::fixtures::query(json!({"sort$": {"p1": -1, "p2": 1}}))?;
    let from_json = cx.store().list(&foo(), &parsed).await?;
    ensure_eq!(ids(&from_json), ids(&records), "parsed sort");
    Ok(())
}

async fn keys_apply_in_written_order(cx: &CaseContext) -> CaseResult {
    let records = cx
        .store()
        .list(&foo(), &query(json!({"sort$": {"p2": -1, "p1": 1}}))?)
        .await?;

    ensure_eq!(field_strings(&records, "p2"), vec!["v3", "v2", "v1", "v0"]);
    ensure_eq!(field_strings(&records, "p1"), vec!["v3", "v2", "v1", "v2"]);
    Ok(())
}

async fn ties_keep_insertion_order(cx: &CaseContext) -> CaseResult {
    let unsorted = cx.store().list(&foo(), &Query::all()).await?;
    let sorted = cx
        .store()
        .list(&foo(), &query(json!({"sort$": {"missing": 1}}))?)
        .await?;
    ensure_eq!(ids(&sorted), ids(&unsorted), "order when every key ties");
    Ok(())
}
