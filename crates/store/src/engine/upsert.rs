//! Upsert matching: decides whether a save updates an existing record.

use serde_json::Value;

use super::compare::strict_eq;
use crate::types::{Entity, Record, SaveOptions};

/// How a save locates the record it updates.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertCriteria {
    /// The entity carries an identity; update that record (or create it).
    Identity(String),
    /// Update the first record whose fields all equal these values.
    Fields(Vec<(String, Value)>),
    /// No match is possible; always insert.
    Insert,
}

impl UpsertCriteria {
    /// Criteria for a save with the given options.
    pub fn for_save(entity: &Entity, options: &SaveOptions) -> Self {
        match &options.upsert {
            Some(fields) => upsert_criteria(entity, fields),
            None => match entity.id() {
                Some(id) => UpsertCriteria::Identity(id.to_string()),
                None => UpsertCriteria::Insert,
            },
        }
    }
}

/// Builds upsert criteria from the listed fields.
///
/// An entity that already has an identity ignores the list. Incoming values
/// come from the entity's data fields, falling back to its private fields. A
/// listed field that is unset or missing on the entity makes a match
/// impossible, as does an empty list.
///
/// # Examples
///
/// ```
/// use entstore::engine::{UpsertCriteria, upsert_criteria};
/// use entstore::types::{Collection, Entity};
/// use serde_json::json;
///
/// let entity = Entity::new(Collection::new("user")).with_field("email", json!("a@b.c"));
///
/// assert_eq!(
///     upsert_criteria(&entity, &["email".to_string()]),
///     UpsertCriteria::Fields(vec![("email".to_string(), json!("a@b.c"))]),
/// );
/// assert_eq!(upsert_criteria(&entity, &[]), UpsertCriteria::Insert);
/// ```
pub fn upsert_criteria(entity: &Entity, fields: &[String]) -> UpsertCriteria {
    if let Some(id) = entity.id() {
        return UpsertCriteria::Identity(id.to_string());
    }
    if fields.is_empty() {
        return UpsertCriteria::Insert;
    }

    let mut pairs = Vec::with_capacity(fields.len());
    for field in fields {
        if entity.is_unset(field) {
            return UpsertCriteria::Insert;
        }
        let value = entity
            .get(field)
            .or_else(|| entity.internal().fields.get(field));
        match value {
            Some(value) => pairs.push((field.clone(), value.clone())),
            None => return UpsertCriteria::Insert,
        }
    }
    UpsertCriteria::Fields(pairs)
}

/// Finds the record a save should update, in collection order.
pub fn find_upsert_target<'a, I>(records: I, criteria: &UpsertCriteria) -> Option<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    match criteria {
        UpsertCriteria::Insert => None,
        UpsertCriteria::Identity(id) => records.into_iter().find(|r| r.id() == id),
        UpsertCriteria::Fields(pairs) => records.into_iter().find(|record| {
            pairs.iter().all(|(field, expected)| {
                record
                    .lookup(field)
                    .is_some_and(|actual| strict_eq(&actual, expected))
            })
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Collection;
    use serde_json::json;

    fn user(id: &str, email: &str, name: &str) -> Record {
        let mut record = Record::new(Collection::new("user"), id);
        record.set("email", json!(email));
        record.set("name", json!(name));
        record
    }

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_match_on_single_field() {
        let records = vec![user("1", "a@x", "Ann"), user("2", "b@x", "Bob")];
        let entity = Entity::new(Collection::new("user")).with_field("email", json!("b@x"));
        let criteria = upsert_criteria(&entity, &fields(&["email"]));
        assert_eq!(find_upsert_target(&records, &criteria).map(Record::id), Some("2"));
    }

    #[test]
    fn test_multi_field_is_and() {
        let records = vec![user("1", "a@x", "Ann"), user("2", "a@x", "Bob")];
        let entity = Entity::new(Collection::new("user"))
            .with_field("email", json!("a@x"))
            .with_field("name", json!("Bob"));
        let criteria = upsert_criteria(&entity, &fields(&["email", "name"]));
        assert_eq!(find_upsert_target(&records, &criteria).map(Record::id), Some("2"));

        let entity = Entity::new(Collection::new("user"))
            .with_field("email", json!("a@x"))
            .with_field("name", json!("Cat"));
        let criteria = upsert_criteria(&entity, &fields(&["email", "name"]));
        assert!(find_upsert_target(&records, &criteria).is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let records = vec![user("1", "a@x", "Ann"), user("2", "a@x", "Bob")];
        let entity = Entity::new(Collection::new("user")).with_field("email", json!("a@x"));
        let criteria = upsert_criteria(&entity, &fields(&["email"]));
        assert_eq!(find_upsert_target(&records, &criteria).map(Record::id), Some("1"));
    }

    #[test]
    fn test_null_participates() {
        let mut record = Record::new(Collection::new("user"), "n");
        record.set("email", json!(null));
        let records = vec![user("1", "a@x", "Ann"), record];
        let entity = Entity::new(Collection::new("user")).with_field("email", json!(null));
        let criteria = upsert_criteria(&entity, &fields(&["email"]));
        assert_eq!(find_upsert_target(&records, &criteria).map(Record::id), Some("n"));
    }

    #[test]
    fn test_unset_or_missing_forces_insert() {
        let entity = Entity::new(Collection::new("user"))
            .with_field("name", json!("Ann"))
            .with_unset("email");
        assert_eq!(
            upsert_criteria(&entity, &fields(&["email"])),
            UpsertCriteria::Insert
        );
        assert_eq!(
            upsert_criteria(&entity, &fields(&["name", "phone"])),
            UpsertCriteria::Insert
        );
    }

    #[test]
    fn test_private_fields_participate() {
        let entity = Entity::new(Collection::new("user")).with_internal("email", json!("a@x"));
        assert_eq!(
            upsert_criteria(&entity, &fields(&["email"])),
            UpsertCriteria::Fields(vec![("email".to_string(), json!("a@x"))])
        );
    }

    #[test]
    fn test_identity_wins() {
        let entity = Entity::new(Collection::new("user"))
            .with_id("2")
            .with_field("email", json!("a@x"));
        assert_eq!(
            upsert_criteria(&entity, &fields(&["email"])),
            UpsertCriteria::Identity("2".to_string())
        );
    }

    #[test]
    fn test_for_save_without_upsert() {
        let entity = Entity::new(Collection::new("user")).with_field("email", json!("a@x"));
        assert_eq!(
            UpsertCriteria::for_save(&entity, &SaveOptions::default()),
            UpsertCriteria::Insert
        );
        let entity = entity.with_id("9");
        assert_eq!(
            UpsertCriteria::for_save(&entity, &SaveOptions::default()),
            UpsertCriteria::Identity("9".to_string())
        );
    }
}
