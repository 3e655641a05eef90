//! Mutation semantics: what a save leaves behind.

use serde_json::{Map, Value};
use uuid::Uuid;

use super::upsert::{UpsertCriteria, find_upsert_target};
use crate::types::{Entity, Record, SaveOptions};

/// The write a save resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveAction {
    /// Overwrite the data of an existing record.
    Update {
        /// Identity of the record being updated.
        id: String,
        /// Resulting data fields.
        fields: Map<String, Value>,
    },
    /// Create a new record.
    Insert {
        /// Identity of the new record.
        id: String,
        /// Data fields of the new record.
        fields: Map<String, Value>,
    },
}

impl SaveAction {
    /// Identity of the record written.
    pub fn id(&self) -> &str {
        match self {
            SaveAction::Update { id, .. } | SaveAction::Insert { id, .. } => id,
        }
    }

    /// Returns true for inserts.
    pub fn is_insert(&self) -> bool {
        matches!(self, SaveAction::Insert { .. })
    }

    /// Data fields written.
    pub fn fields(&self) -> &Map<String, Value> {
        match self {
            SaveAction::Update { fields, .. } | SaveAction::Insert { fields, .. } => fields,
        }
    }

    /// Consumes the action and returns `(id, fields)`.
    pub fn into_parts(self) -> (String, Map<String, Value>) {
        match self {
            SaveAction::Update { id, fields } | SaveAction::Insert { id, fields } => (id, fields),
        }
    }
}

/// Resolves a save against the current contents of its collection.
///
/// `records` must be in collection (insertion) order. Adapters call this while
/// holding whatever lock or transaction makes match and write atomic.
pub fn plan_save<'a, I>(records: I, entity: &Entity, options: &SaveOptions) -> SaveAction
where
    I: IntoIterator<Item = &'a Record>,
{
    let criteria = UpsertCriteria::for_save(entity, options);
    match find_upsert_target(records, &criteria) {
        Some(existing) => SaveAction::Update {
            id: existing.id().to_string(),
            fields: resolve_update(existing, entity, options.merge),
        },
        None => SaveAction::Insert {
            id: insert_id(entity),
            fields: resolve_insert(entity),
        },
    }
}

/// Data fields after applying `incoming` to `existing`.
///
/// Merge keeps existing fields the entity does not supply; replace drops them.
/// Unset fields never touch stored data.
pub fn resolve_update(existing: &Record, incoming: &Entity, merge: bool) -> Map<String, Value> {
    let mut fields = if merge {
        existing.fields().clone()
    } else {
        Map::new()
    };
    for (key, value) in incoming.fields() {
        fields.insert(key.clone(), value.clone());
    }
    fields
}

/// Data fields of a brand-new record.
pub fn resolve_insert(entity: &Entity) -> Map<String, Value> {
    entity.fields().clone()
}

/// Identity for a brand-new record: the entity's own identity (update-by-id of
/// a missing record), then the `id$` override, then a fresh v4 UUID.
pub fn insert_id(entity: &Entity) -> String {
    entity
        .id()
        .map(String::from)
        .or_else(|| entity.internal().id.clone())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Collection;
    use serde_json::json;

    fn foo() -> Collection {
        Collection::new("foo")
    }

    fn stored() -> Record {
        let mut record = Record::new(foo(), "r1");
        record.set("a", json!(1));
        record.set("b", json!(2));
        record
    }

    #[test]
    fn test_merge_keeps_unsupplied_fields() {
        let entity = Entity::new(foo()).with_id("r1").with_field("a", json!(9));
        let fields = resolve_update(&stored(), &entity, true);
        assert_eq!(serde_json::Value::Object(fields), json!({"a": 9, "b": 2}));
    }

    #[test]
    fn test_replace_discards_unsupplied_fields() {
        let entity = Entity::new(foo()).with_id("r1").with_field("a", json!(9));
        let fields = resolve_update(&stored(), &entity, false);
        assert_eq!(serde_json::Value::Object(fields), json!({"a": 9}));
    }

    #[test]
    fn test_null_clears() {
        let entity = Entity::new(foo()).with_id("r1").with_field("b", json!(null));
        let fields = resolve_update(&stored(), &entity, true);
        assert_eq!(fields.get("b"), Some(&json!(null)));
    }

    #[test]
    fn test_unset_is_noop() {
        let entity = Entity::new(foo()).with_id("r1").with_unset("b");
        let merged = resolve_update(&stored(), &entity, true);
        assert_eq!(merged.get("b"), Some(&json!(2)));

        let replaced = resolve_update(&stored(), &entity, false);
        assert!(!replaced.contains_key("b"));
    }

    #[test]
    fn test_plan_update_by_id() {
        let records = vec![stored()];
        let entity = Entity::new(foo()).with_id("r1").with_field("c", json!(3));
        let action = plan_save(&records, &entity, &SaveOptions::default());
        assert!(!action.is_insert());
        assert_eq!(action.id(), "r1");
        assert_eq!(action.fields().len(), 3);
    }

    #[test]
    fn test_plan_update_by_missing_id_inserts_with_it() {
        let entity = Entity::new(foo()).with_id("ghost").with_field("c", json!(3));
        let action = plan_save(&Vec::<Record>::new(), &entity, &SaveOptions::default());
        assert_eq!(action, SaveAction::Insert {
            id: "ghost".to_string(),
            fields: resolve_insert(&entity),
        });
    }

    #[test]
    fn test_plan_upsert_retains_matched_id_over_override() {
        let records = vec![stored()];
        let entity = Entity::new(foo())
            .with_field("a", json!(1))
            .with_field("d", json!(4))
            .with_id_override("fresh");
        let action = plan_save(&records, &entity, &SaveOptions::upsert(["a"]));
        assert_eq!(action.id(), "r1");
        assert_eq!(action.fields().get("b"), Some(&json!(2)));
    }

    #[test]
    fn test_plan_insert_honors_override() {
        let entity = Entity::new(foo())
            .with_field("a", json!(5))
            .with_id_override("0201775f-27c4-7428-b380-44b8f4c529f3");
        let action = plan_save(&vec![stored()], &entity, &SaveOptions::upsert(["a"]));
        assert!(action.is_insert());
        assert_eq!(action.id(), "0201775f-27c4-7428-b380-44b8f4c529f3");
    }

    #[test]
    fn test_insert_generates_unique_ids() {
        let entity = Entity::new(foo());
        assert_ne!(insert_id(&entity), insert_id(&entity));
        assert_eq!(insert_id(&entity).len(), 36);
    }
}
