//! Merge, replace, null and unset semantics on update.

use serde_json::{Value, json};
use uuid::Uuid;

use entstore::types::{Entity, Record, SaveOptions};

use crate::assertions::{CaseResult, ensure, ensure_eq};
use crate::fixtures::{foo, load_existing};
use crate::harness::{Case, CaseContext};

pub(super) fn cases() -> Vec<Case> {
    vec![
        case!("merge keeps absent fields", merge_keeps_absent_fields),
        case!("replace drops absent fields", replace_drops_absent_fields),
        case!("null clears", null_clears),
        case!("unset is a no-op", unset_is_noop),
        case!("update of missing id inserts", update_of_missing_id_inserts),
    ]
}

async fn save_three(cx: &CaseContext) -> CaseResult<Record> {
    let entity = Entity::new(foo())
        .with_field("p1", json!("v1"))
        .with_field("p2", json!("v2"))
        .with_field("p3", json!("v3"))
        .with_id_override(Uuid::new_v4().to_string());
    Ok(cx.store().save(entity, &SaveOptions::default()).await?)
}

async fn merge_keeps_absent_fields(cx: &CaseContext) -> CaseResult {
    let original = save_three(cx).await?;
    let update = Entity::new(foo())
        .with_id(original.id())
        .with_field("p1", json!("z1"));
    let saved = cx.store().save(update, &SaveOptions::default()).await?;

    ensure_eq!(saved.id(), original.id(), "id");
    for record in [saved, load_existing(cx.store(), &foo(), original.id()).await?] {
        ensure_eq!(record.get("p1"), Some(&json!("z1")), "p1");
        ensure_eq!(record.get("p2"), Some(&json!("v2")), "p2");
        ensure_eq!(record.get("p3"), Some(&json!("v3")), "p3");
    }
    Ok(())
}

async fn replace_drops_absent_fields(cx: &CaseContext) -> CaseResult {
    let original = save_three(cx).await?;
    let update = Entity::new(foo())
        .with_id(original.id())
        .with_field("p1", json!("z1"));
    let saved = cx.store().save(update, &SaveOptions::replace()).await?;

    ensure_eq!(saved.id(), original.id(), "id");
    for record in [saved, load_existing(cx.store(), &foo(), original.id()).await?] {
        ensure_eq!(record.get("p1"), Some(&json!("z1")), "p1");
        ensure!(!record.has("p2"), "p2 survived a replace: {}", record);
        ensure!(!record.has("p3"), "p3 survived a replace: {}", record);
    }
    Ok(())
}

async fn null_clears(cx: &CaseContext) -> CaseResult {
    let original = save_three(cx).await?;
    let update = Entity::new(foo())
        .with_id(original.id())
        .with_field("p2", Value::Null);
    let saved = cx.store().save(update, &SaveOptions::default()).await?;

    for record in [saved, load_existing(cx.store(), &foo(), original.id()).await?] {
        ensure_eq!(record.get("p2"), Some(&Value::Null), "p2");
        ensure_eq!(record.get("p1"), Some(&json!("v1")), "p1");
    }
    Ok(())
}

async fn unset_is_noop(cx: &CaseContext) -> CaseResult {
    let original = save_three(cx).await?;
    let update = Entity::new(foo())
        .with_id(original.id())
        .with_field("p1", json!("z1"))
        .with_unset("p3");
    let saved = cx.store().save(update, &SaveOptions::default()).await?;

    for record in [saved, load_existing(cx.store(), &foo(), original.id()).await?] {
        ensure_eq!(record.get("p1"), Some(&json!("z1")), "p1");
        ensure_eq!(record.get("p3"), Some(&json!("v3")), "p3");
    }
    Ok(())
}

async fn update_of_missing_id_inserts(cx: &CaseContext) -> CaseResult {
    let id = format!("missing-{}", Uuid::new_v4());
    let before = cx.store().count(&foo()).await?;

    let entity = Entity::new(foo())
        .with_id(&id)
        .with_field("p1", json!("v1"));
    let saved = cx.store().save(entity, &SaveOptions::default()).await?;

    ensure_eq!(saved.id(), id.as_str(), "id");
    let loaded = load_existing(cx.store(), &foo(), &id).await?;
    ensure_eq!(loaded.get("p1"), Some(&json!("v1")), "p1");
    ensure_eq!(cx.store().count(&foo()).await?, before + 1, "count");
    Ok(())
}
