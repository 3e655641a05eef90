//! Save input type.
//!
//! [`Entity`] is what callers hand to [`EntityStore::save`](crate::core::EntityStore::save).
//! It separates three things that the JSON wire form mixes together through the
//! `$`-suffix naming convention:
//!
//! - data fields, which are persisted,
//! - fields explicitly set to the "unset" marker, which never touch stored data,
//! - [`Internal`] fields (identity override and other private values), which
//!   are never serialized or persisted.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::collection::Collection;
use super::options::SaveOptions;
use super::record::Record;
use crate::error::ValidationError;

/// Suffix that marks a control key in the JSON wire form.
pub const CONTROL_SUFFIX: char = '$';

/// Private, non-persisted entity state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Internal {
    /// Identity to use if this save creates a brand-new record (`id$`).
    pub id: Option<String>,
    /// Other private values. They may take part in upsert matching.
    pub fields: Map<String, Value>,
}

/// An entity about to be saved.
///
/// # Examples
///
/// ```
/// use entstore::types::{Collection, Entity};
/// use serde_json::json;
///
/// let entity = Entity::new(Collection::new("foo"))
///     .with_field("p1", json!("v1"))
///     .with_unset("p2")
///     .with_id_override("0201775f-27c4-7428-b380-44b8f4c529f3");
///
/// assert!(entity.id().is_none());
/// assert!(entity.is_unset("p2"));
/// // Internal state is not part of the serialized form.
/// assert_eq!(serde_json::to_value(&entity).unwrap()["fields"], json!({"p1": "v1"}));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    collection: Collection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default)]
    fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    unset: BTreeSet<String>,
    #[serde(skip)]
    internal: Internal,
}

impl Entity {
    /// Creates an empty entity for the given collection.
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            id: None,
            fields: Map::new(),
            unset: BTreeSet::new(),
            internal: Internal::default(),
        }
    }

    /// Turns a loaded record back into a savable instance carrying its identity.
    pub fn from_record(record: Record) -> Self {
        let collection = record.collection().clone();
        let id = record.id().to_string();
        Self {
            collection,
            id: Some(id),
            fields: record.into_fields(),
            unset: BTreeSet::new(),
            internal: Internal::default(),
        }
    }

    /// Parses the `$`-suffixed JSON form.
    ///
    /// - `id` becomes the entity identity,
    /// - `id$` becomes the identity override,
    /// - `zone$`, `base$` and `name$` replace the matching collection segment,
    /// - `upsert$` and `merge$` are returned as [`SaveOptions`],
    /// - any other `key$` is kept as a private field named `key`.
    pub fn from_json(
        collection: Collection,
        value: Value,
    ) -> Result<(Self, SaveOptions), ValidationError> {
        let obj = match value {
            Value::Object(obj) => obj,
            other => {
                return Err(ValidationError::NotAnObject {
                    kind: kind_of(&other).to_string(),
                });
            }
        };

        let mut entity = Entity::new(collection);
        let mut options = SaveOptions::default();

        for (key, value) in obj {
            let control = key.strip_suffix(CONTROL_SUFFIX).map(str::to_string);
            match control.as_deref() {
                Some("id") => entity.internal.id = Some(id_string(&value)?),
                Some("zone") => {
                    let zone = text(&key, &value)?;
                    entity.collection = entity.collection.with_zone(zone);
                }
                Some("base") => {
                    let base = text(&key, &value)?;
                    entity.collection = entity.collection.with_base(base);
                }
                Some("name") => {
                    let name = text(&key, &value)?;
                    if name.is_empty() {
                        return Err(ValidationError::EmptyCollectionName);
                    }
                    entity.collection = entity.collection.with_name(name);
                }
                Some("merge") => match value {
                    Value::Bool(merge) => options.merge = merge,
                    other => {
                        return Err(ValidationError::InvalidDirective {
                            directive: key,
                            message: format!("expected a boolean, got {}", kind_of(&other)),
                        });
                    }
                },
                Some("upsert") => options.upsert = Some(field_list(&key, &value)?),
                Some(private) => {
                    entity.internal.fields.insert(private.to_string(), value);
                }
                None if key == "id" => {
                    if !value.is_null() {
                        entity.id = Some(id_string(&value)?);
                    }
                }
                None => {
                    entity.fields.insert(key, value);
                }
            }
        }

        Ok((entity, options))
    }

    /// Sets a data field, clearing any unset marker on it.
    pub fn with_field(mut self, field: impl Into<String>, value: Value) -> Self {
        self.set(field, value);
        self
    }

    /// Marks a field as explicitly unset.
    pub fn with_unset(mut self, field: impl Into<String>) -> Self {
        self.unset(field);
        self
    }

    /// Sets the identity (update-by-id).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the identity override used only when a new record is created.
    pub fn with_id_override(mut self, id: impl Into<String>) -> Self {
        self.internal.id = Some(id.into());
        self
    }

    /// Sets a private field.
    pub fn with_internal(mut self, field: impl Into<String>, value: Value) -> Self {
        self.internal.fields.insert(field.into(), value);
        self
    }

    /// Sets a data field. `"id"` sets the identity instead: strings and
    /// numbers are read as in [`Entity::from_json`], anything else clears it.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        let field = field.into();
        if field == "id" {
            self.id = id_string(&value).ok();
            return;
        }
        self.unset.remove(&field);
        self.fields.insert(field, value);
    }

    /// Marks a field as explicitly unset, dropping any value set for it.
    pub fn unset(&mut self, field: impl Into<String>) {
        let field = field.into();
        self.fields.shift_remove(&field);
        self.unset.insert(field);
    }

    /// Removes a field entirely, as if it had never been set.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.unset.remove(field);
        self.fields.shift_remove(field)
    }

    /// Returns the collection.
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Returns the identity, if this entity refers to an existing record.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the data fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns a data field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns true when the field carries the unset marker.
    pub fn is_unset(&self, field: &str) -> bool {
        self.unset.contains(field)
    }

    /// Returns the names of fields carrying the unset marker.
    pub fn unset_fields(&self) -> &BTreeSet<String> {
        &self.unset
    }

    /// Returns the private state.
    pub fn internal(&self) -> &Internal {
        &self.internal
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn id_string(value: &Value) -> Result<String, ValidationError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ValidationError::InvalidId {
            value: other.to_string(),
        }),
    }
}

fn text(key: &str, value: &Value) -> Result<String, ValidationError> {
    value
        .as_str()
        .map(String::from)
        .ok_or_else(|| ValidationError::InvalidDirective {
            directive: key.to_string(),
            message: format!("expected a string, got {}", kind_of(value)),
        })
}

fn field_list(key: &str, value: &Value) -> Result<Vec<String>, ValidationError> {
    let invalid = || ValidationError::InvalidDirective {
        directive: key.to_string(),
        message: "expected a list of field names".to_string(),
    };
    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|v| v.as_str().map(String::from).ok_or_else(invalid))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_splits_control_keys() {
        let (entity, options) = Entity::from_json(
            Collection::new("foo"),
            json!({
                "name$": "bar",
                "base$": "moon",
                "zone$": "zen",
                "id$": "fixed-id",
                "upsert$": ["email"],
                "merge$": false,
                "secret$": 42,
                "email": "a@b.c",
            }),
        )
        .unwrap();

        assert_eq!(entity.collection().to_string(), "zen/moon/bar");
        assert_eq!(entity.internal().id.as_deref(), Some("fixed-id"));
        assert_eq!(entity.internal().fields.get("secret"), Some(&json!(42)));
        assert_eq!(entity.fields().len(), 1);
        assert_eq!(entity.get("email"), Some(&json!("a@b.c")));
        assert!(!options.merge);
        assert_eq!(options.upsert, Some(vec!["email".to_string()]));
    }

    #[test]
    fn test_from_json_id_is_identity() {
        let (entity, _) =
            Entity::from_json(Collection::new("foo"), json!({"id": 7, "p1": "z1"})).unwrap();
        assert_eq!(entity.id(), Some("7"));
        assert!(entity.get("id").is_none());
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = Entity::from_json(Collection::new("foo"), json!([1, 2])).unwrap_err();
        assert!(matches!(err, ValidationError::NotAnObject { .. }));
    }

    #[test]
    fn test_from_json_rejects_bad_upsert() {
        let err =
            Entity::from_json(Collection::new("foo"), json!({"upsert$": "email"})).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDirective { .. }));
    }

    #[test]
    fn test_set_id_agrees_with_from_json() {
        let (parsed, _) = Entity::from_json(Collection::new("foo"), json!({"id": 5})).unwrap();

        let mut entity = Entity::new(Collection::new("foo"));
        entity.set("id", json!(5));
        assert_eq!(entity.id(), Some("5"));
        assert_eq!(entity.id(), parsed.id());
        assert!(entity.fields().is_empty());

        entity.set("id", json!("abc"));
        assert_eq!(entity.id(), Some("abc"));

        entity.set("id", Value::Null);
        assert_eq!(entity.id(), None);
    }

    #[test]
    fn test_set_after_unset_clears_marker() {
        let mut entity = Entity::new(Collection::new("foo")).with_unset("p1");
        assert!(entity.is_unset("p1"));
        entity.set("p1", json!(null));
        assert!(!entity.is_unset("p1"));
        assert_eq!(entity.get("p1"), Some(&json!(null)));
    }

    #[test]
    fn test_from_record_carries_identity() {
        let mut record = Record::new(Collection::new("foo"), "abc");
        record.set("p1", json!("v1"));
        let entity = Entity::from_record(record);
        assert_eq!(entity.id(), Some("abc"));
        assert_eq!(entity.get("p1"), Some(&json!("v1")));
    }

    #[test]
    fn test_internal_not_serialized() {
        let entity = Entity::new(Collection::new("foo"))
            .with_internal("token", json!("secret"))
            .with_id_override("x");
        let json = serde_json::to_string(&entity).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("\"x\""));
    }
}
