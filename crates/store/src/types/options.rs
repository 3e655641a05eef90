//! Options accepted by store operations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::Record;

/// Options for [`EntityStore::save`](crate::core::EntityStore::save).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOptions {
    /// Merge incoming fields into the existing record (default) instead of
    /// replacing its data wholesale.
    #[serde(default = "default_true")]
    pub merge: bool,

    /// Fields used to find an existing record to update instead of inserting.
    ///
    /// `None` disables upsert matching; `Some(vec![])` always inserts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upsert: Option<Vec<String>>,
}

fn default_true() -> bool {
    true
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            merge: true,
            upsert: None,
        }
    }
}

impl SaveOptions {
    /// Options that replace existing data instead of merging into it.
    pub fn replace() -> Self {
        Self {
            merge: false,
            upsert: None,
        }
    }

    /// Options that upsert on the given fields.
    pub fn upsert<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            merge: true,
            upsert: Some(fields.into_iter().map(Into::into).collect()),
        }
    }

    /// Sets the merge mode.
    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }
}

/// Options for [`EntityStore::remove`](crate::core::EntityStore::remove).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveOptions {
    /// Remove every match instead of only the first.
    #[serde(default)]
    pub all: bool,

    /// Return the (first) removed record.
    #[serde(default)]
    pub load: bool,
}

impl RemoveOptions {
    /// Remove every match.
    pub fn all() -> Self {
        Self {
            all: true,
            load: false,
        }
    }

    /// Remove the first match and return it.
    pub fn load() -> Self {
        Self {
            all: false,
            load: true,
        }
    }
}

/// Result of a remove operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoveOutcome {
    /// Number of records removed.
    pub removed: usize,

    /// The first removed record, when [`RemoveOptions::load`] was set.
    pub record: Option<Record>,
}

/// An adapter-specific query that bypasses the filter evaluator.
///
/// # Examples
///
/// ```
/// use entstore::types::NativeQuery;
/// use serde_json::json;
///
/// let query = NativeQuery::sql("SELECT id, data FROM entities WHERE name = ?1")
///     .with_params(vec![json!("product")]);
/// assert_eq!(query.params.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeQuery {
    /// The statement text in the adapter's own query language.
    pub statement: String,

    /// Positional parameters bound to the statement.
    #[serde(default)]
    pub params: Vec<Value>,
}

impl NativeQuery {
    /// Creates a parameterless statement.
    pub fn sql(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            params: Vec::new(),
        }
    }

    /// Sets the positional parameters.
    pub fn with_params(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }
}
