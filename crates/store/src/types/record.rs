//! Stored record type.
//!
//! This module defines [`Record`], the value handed back by every read and
//! write. A record is always an owned snapshot: changing it never changes what
//! the store holds, and later writes to the store never change it.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use super::collection::Collection;

/// A persisted record.
///
/// The identity lives in [`Record::id`] and is never duplicated inside
/// [`Record::fields`].
///
/// # Examples
///
/// ```
/// use entstore::types::{Collection, Record};
/// use serde_json::json;
///
/// let mut record = Record::new(Collection::new("product"), "p1");
/// record.set("name", json!("apple"));
/// record.set("price", json!(100));
///
/// assert_eq!(record.get("name"), Some(&json!("apple")));
/// assert_eq!(record.to_string(), "$-/-/product:{id=p1;name=apple;price=100}");
/// assert_eq!(record.to_json(), json!({"id": "p1", "name": "apple", "price": 100}));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    collection: Collection,
    id: String,
    fields: Map<String, Value>,
}

impl Record {
    /// Creates an empty record.
    pub fn new(collection: Collection, id: impl Into<String>) -> Self {
        Self {
            collection,
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Creates a record from existing data (e.g., loaded from a backend).
    ///
    /// An `id` key inside `fields` is dropped; the explicit id wins.
    pub fn from_parts(
        collection: Collection,
        id: impl Into<String>,
        mut fields: Map<String, Value>,
    ) -> Self {
        fields.shift_remove("id");
        Self {
            collection,
            id: id.into(),
            fields,
        }
    }

    /// Returns the collection this record belongs to.
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Returns the record identity.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the data fields (identity excluded).
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns a mutable reference to the data fields.
    pub fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.fields
    }

    /// Consumes self and returns the data fields.
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// Returns a data field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Looks up a field as it takes part in matching and sorting.
    ///
    /// Unlike [`Record::get`], `"id"` yields the identity as a string value.
    pub fn lookup(&self, field: &str) -> Option<Value> {
        if field == "id" {
            Some(Value::String(self.id.clone()))
        } else {
            self.fields.get(field).cloned()
        }
    }

    /// Sets a field. Setting `"id"` is ignored.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        let field = field.into();
        if field != "id" {
            self.fields.insert(field, value);
        }
    }

    /// Returns true when the field is present (null counts as present).
    pub fn has(&self, field: &str) -> bool {
        field == "id" || self.fields.contains_key(field)
    }

    /// Returns the record as a flat JSON object with the identity under `id`.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::with_capacity(self.fields.len() + 1);
        obj.insert("id".to_string(), Value::String(self.id.clone()));
        for (k, v) in &self.fields {
            obj.insert(k.clone(), v.clone());
        }
        Value::Object(obj)
    }

    /// Returns a copy keeping only the listed fields (identity always kept).
    pub fn project(&self, keep: &[String]) -> Record {
        let fields = self
            .fields
            .iter()
            .filter(|(k, _)| keep.iter().any(|f| f == *k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Record {
            collection: self.collection.clone(),
            id: self.id.clone(),
            fields,
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("id", &self.id)?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Canonical single-line form: `$zone/base/name:{id=..;k=v;...}`, keys sorted.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}:{{id={}", self.collection, self.id)?;
        let mut keys: Vec<&String> = self.fields.keys().collect();
        keys.sort();
        for key in keys {
            match &self.fields[key] {
                Value::String(s) => write!(f, ";{}={}", key, s)?,
                other => write!(f, ";{}={}", key, other)?,
            }
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product() -> Record {
        let mut fields = Map::new();
        fields.insert("name".to_string(), json!("pear"));
        fields.insert("price".to_string(), json!(200));
        fields.insert("id".to_string(), json!("ignored"));
        Record::from_parts(Collection::new("product"), "p2", fields)
    }

    #[test]
    fn test_from_parts_drops_id_field() {
        let record = product();
        assert_eq!(record.id(), "p2");
        assert!(record.get("id").is_none());
        assert_eq!(record.lookup("id"), Some(json!("p2")));
    }

    #[test]
    fn test_set_id_is_ignored() {
        let mut record = product();
        record.set("id", json!("other"));
        assert_eq!(record.id(), "p2");
        assert!(!record.fields().contains_key("id"));
    }

    #[test]
    fn test_display_sorts_keys() {
        let mut record = Record::new(Collection::new("foo"), "x");
        record.set("p2", json!("v2"));
        record.set("p1", json!(null));
        assert_eq!(record.to_string(), "$-/-/foo:{id=x;p1=null;p2=v2}");
    }

    #[test]
    fn test_serialize_flat() {
        let json = serde_json::to_value(product()).unwrap();
        assert_eq!(json, json!({"id": "p2", "name": "pear", "price": 200}));
    }

    #[test]
    fn test_project_keeps_identity() {
        let projected = product().project(&["name".to_string()]);
        assert_eq!(projected.id(), "p2");
        assert_eq!(projected.get("name"), Some(&json!("pear")));
        assert!(!projected.has("price"));
    }

    #[test]
    fn test_clone_is_independent() {
        let original = product();
        let mut copy = original.clone();
        copy.set("price", json!(999));
        assert_eq!(original.get("price"), Some(&json!(200)));
    }
}
