//! Upsert matching: which record a save updates, if any.

use serde_json::{Value, json};
use uuid::Uuid;

use entstore::types::{Entity, Query, Record, SaveOptions};

use crate::assertions::{CaseResult, ensure, ensure_eq};
use crate::fixtures::{load_existing, user};
use crate::harness::{Case, CaseContext};

pub(super) fn cases() -> Vec<Case> {
    vec![
        case!("insert on no match", insert_on_no_match),
        case!("update on match", update_on_match),
        case!("all listed fields must match", all_fields_must_match),
        case!("null matches null", null_matches_null),
        case!("unset field forces insert", unset_forces_insert),
        case!("missing field forces insert", missing_field_forces_insert),
        case!("empty list inserts", empty_list_inserts),
        case!("identity wins", identity_wins),
        case!("id override honored on insert", id_override_on_insert),
        case!("id override ignored on match", id_override_on_match),
        case!("private field matches", private_field_matches),
        case!("first match only", first_match_only),
    ]
}

async fn save(cx: &CaseContext, entity: Entity, options: &SaveOptions) -> CaseResult<Record> {
    Ok(cx.store().save(entity, options).await?)
}

async fn count_where(cx: &CaseContext, field: &str, value: Value) -> CaseResult<usize> {
    let query = Query::all().where_eq(field, value);
    Ok(cx.store().list(&user(), &query).await?.len())
}

async fn insert_on_no_match(cx: &CaseContext) -> CaseResult {
    let entity = Entity::new(user())
        .with_field("email", json!("a@example.com"))
        .with_field("name", json!("A"));
    let saved = save(cx, entity, &SaveOptions::upsert(["email"])).await?;

    ensure_eq!(saved.get("name"), Some(&json!("A")), "name");
    ensure_eq!(count_where(cx, "email", json!("a@example.com")).await?, 1);
    cx.remember("a", saved);
    Ok(())
}

async fn update_on_match(cx: &CaseContext) -> CaseResult {
    let first = cx.recall("a")?;
    let entity = Entity::new(user())
        .with_field("email", json!("a@example.com"))
        .with_field("name", json!("B"));
    let saved = save(cx, entity, &SaveOptions::upsert(["email"])).await?;

    ensure_eq!(saved.id(), first.id(), "id");
    ensure_eq!(saved.get("name"), Some(&json!("B")), "name");
    ensure_eq!(count_where(cx, "email", json!("a@example.com")).await?, 1);
    Ok(())
}

async fn all_fields_must_match(cx: &CaseContext) -> CaseResult {
    let options = SaveOptions::upsert(["email", "org"]);
    let first = save(
        cx,
        Entity::new(user())
            .with_field("email", json!("m@example.com"))
            .with_field("org", json!("o1"))
            .with_field("n", json!(1)),
        &options,
    )
    .await?;

    let other_org = save(
        cx,
        Entity::new(user())
            .with_field("email", json!("m@example.com"))
            .with_field("org", json!("o2"))
            .with_field("n", json!(2)),
        &options,
    )
    .await?;
    ensure!(other_org.id() != first.id(), "matched on email alone");

    let same = save(
        cx,
        Entity::new(user())
            .with_field("email", json!("m@example.com"))
            .with_field("org", json!("o1"))
            .with_field("n", json!(3)),
        &options,
    )
    .await?;
    ensure_eq!(same.id(), first.id(), "id of the full match");
    ensure_eq!(same.get("n"), Some(&json!(3)), "n");
    ensure_eq!(count_where(cx, "email", json!("m@example.com")).await?, 2);
    Ok(())
}

async fn null_matches_null(cx: &CaseContext) -> CaseResult {
    let options = SaveOptions::upsert(["kind", "tag"]);
    let first = save(
        cx,
        Entity::new(user())
            .with_field("kind", json!("nullable"))
            .with_field("tag", Value::Null)
            .with_field("n", json!(1)),
        &options,
    )
    .await?;

    let second = save(
        cx,
        Entity::new(user())
            .with_field("kind", json!("nullable"))
            .with_field("tag", Value::Null)
            .with_field("n", json!(2)),
        &options,
    )
    .await?;

    ensure_eq!(second.id(), first.id(), "id");
    ensure_eq!(second.get("n"), Some(&json!(2)), "n");
    ensure_eq!(count_where(cx, "kind", json!("nullable")).await?, 1);
    Ok(())
}

async fn unset_forces_insert(cx: &CaseContext) -> CaseResult {
    let options = SaveOptions::upsert(["kind", "tag"]);
    let first = save(
        cx,
        Entity::new(user())
            .with_field("kind", json!("unset"))
            .with_field("tag", json!("t")),
        &options,
    )
    .await?;

    let second = save(
        cx,
        Entity::new(user())
            .with_field("kind", json!("unset"))
            .with_unset("tag"),
        &options,
    )
    .await?;

    ensure!(second.id() != first.id(), "an unset field matched");
    ensure_eq!(count_where(cx, "kind", json!("unset")).await?, 2);
    Ok(())
}

async fn missing_field_forces_insert(cx: &CaseContext) -> CaseResult {
    let options = SaveOptions::upsert(["kind", "tag"]);
    let first = save(
        cx,
        Entity::new(user())
            .with_field("kind", json!("absent"))
            .with_field("tag", json!("t")),
        &options,
    )
    .await?;

    let second = save(
        cx,
        Entity::new(user()).with_field("kind", json!("absent")),
        &options,
    )
    .await?;

    ensure!(second.id() != first.id(), "a missing field matched");
    ensure_eq!(count_where(cx, "kind", json!("absent")).await?, 2);
    Ok(())
}

async fn empty_list_inserts(cx: &CaseContext) -> CaseResult {
    let options = SaveOptions::upsert(Vec::<String>::new());
    for _ in 0..2 {
        save(cx, Entity::new(user()).with_field("kind", json!("empty")), &options).await?;
    }
    ensure_eq!(count_where(cx, "kind", json!("empty")).await?, 2);
    Ok(())
}

async fn identity_wins(cx: &CaseContext) -> CaseResult {
    let options = SaveOptions::default();
    let target = save(
        cx,
        Entity::new(user()).with_field("email", json!("wins@example.com")),
        &options,
    )
    .await?;
    let other = save(
        cx,
        Entity::new(user()).with_field("email", json!("other@example.com")),
        &options,
    )
    .await?;

    let saved = save(
        cx,
        Entity::new(user())
            .with_id(other.id())
            .with_field("email", json!("wins@example.com"))
            .with_field("touched", json!(true)),
        &SaveOptions::upsert(["email"]),
    )
    .await?;

    ensure_eq!(saved.id(), other.id(), "id");
    let untouched = load_existing(cx.store(), &user(), target.id()).await?;
    ensure!(!untouched.has("touched"), "upsert match won over identity");
    Ok(())
}

async fn id_override_on_insert(cx: &CaseContext) -> CaseResult {
    let id = Uuid::new_v4().to_string();
    let (entity, options) = Entity::from_json(
        user(),
        json!({"email": "override@example.com", "upsert$": ["email"], "id$": id}),
    )
    .map_err(entstore::StorageError::from)?;
    let saved = save(cx, entity, &options).await?;

    ensure_eq!(saved.id(), id.as_str(), "id");
    cx.remember("override", saved);
    Ok(())
}

async fn id_override_on_match(cx: &CaseContext) -> CaseResult {
    let first = cx.recall("override")?;
    let (entity, options) = Entity::from_json(
        user(),
        json!({
            "email": "override@example.com",
            "n": 2,
            "upsert$": ["email"],
            "id$": Uuid::new_v4().to_string(),
        }),
    )
    .map_err(entstore::StorageError::from)?;
    let saved = save(cx, entity, &options).await?;

    ensure_eq!(saved.id(), first.id(), "id");
    ensure_eq!(saved.get("n"), Some(&json!(2)), "n");
    ensure_eq!(count_where(cx, "email", json!("override@example.com")).await?, 1);
    Ok(())
}

async fn private_field_matches(cx: &CaseContext) -> CaseResult {
    let first = save(
        cx,
        Entity::new(user())
            .with_field("email", json!("private@example.com"))
            .with_field("n", json!(1)),
        &SaveOptions::default(),
    )
    .await?;

    let saved = save(
        cx,
        Entity::new(user())
            .with_internal("email", json!("private@example.com"))
            .with_field("n", json!(2)),
        &SaveOptions::upsert(["email"]),
    )
    .await?;

    ensure_eq!(saved.id(), first.id(), "id");
    ensure_eq!(saved.get("n"), Some(&json!(2)), "n");
    ensure_eq!(saved.get("email"), Some(&json!("private@example.com")), "email");
    Ok(())
}

async fn first_match_only(cx: &CaseContext) -> CaseResult {
    let options = SaveOptions::default();
    let first = save(
        cx,
        Entity::new(user())
            .with_field("kind", json!("dup"))
            .with_field("n", json!(1)),
        &options,
    )
    .await?;
    let second = save(
        cx,
        Entity::new(user())
            .with_field("kind", json!("dup"))
            .with_field("n", json!(2)),
        &options,
    )
    .await?;

    let saved = save(
        cx,
        Entity::new(user())
            .with_field("kind", json!("dup"))
            .with_field("n", json!(3)),
        &SaveOptions::upsert(["kind"]),
    )
    .await?;

    ensure_eq!(saved.id(), first.id(), "id");
    let untouched = load_existing(cx.store(), &user(), second.id()).await?;
    ensure_eq!(untouched.get("n"), Some(&json!(2)), "n of the second match");
    ensure_eq!(count_where(cx, "kind", json!("dup")).await?, 2);
    Ok(())
}
