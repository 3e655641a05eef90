//! Collection identifier type.
//!
//! This module defines the [`Collection`] type, the `(zone, base, name)` triple
//! that partitions records. Operations never cross collections.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Placeholder rendered for an absent zone or base.
pub const ABSENT_SEGMENT: &str = "-";

/// A named partition of records.
///
/// Only `name` is required; `zone` and `base` are optional namespaces.
///
/// # Examples
///
/// ```
/// use entstore::types::Collection;
///
/// let bar: Collection = "zen/moon/bar".parse().unwrap();
/// assert_eq!(bar.zone(), Some("zen"));
/// assert_eq!(bar.base(), Some("moon"));
/// assert_eq!(bar.name(), "bar");
/// assert_eq!(bar.to_string(), "zen/moon/bar");
///
/// let foo = Collection::new("foo");
/// assert_eq!(foo.to_string(), "-/-/foo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Collection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base: Option<String>,
    name: String,
}

impl Collection {
    /// Creates a collection with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            zone: None,
            base: None,
            name: name.into(),
        }
    }

    /// Creates a collection from all three segments.
    pub fn qualified(
        zone: Option<impl Into<String>>,
        base: Option<impl Into<String>>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            zone: zone.map(Into::into).and_then(normalize_segment),
            base: base.map(Into::into).and_then(normalize_segment),
            name: name.into(),
        }
    }

    /// Returns a copy with the zone replaced.
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = normalize_segment(zone.into());
        self
    }

    /// Returns a copy with the base replaced.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = normalize_segment(base.into());
        self
    }

    /// Returns a copy with the name replaced.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the zone, if any.
    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    /// Returns the base, if any.
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Returns the collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Checks that the collection can hold records.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() || self.name == ABSENT_SEGMENT {
            return Err(ValidationError::EmptyCollectionName);
        }
        Ok(())
    }

    /// Returns the zone as stored by adapters (`-` when absent).
    pub fn zone_key(&self) -> &str {
        self.zone.as_deref().unwrap_or(ABSENT_SEGMENT)
    }

    /// Returns the base as stored by adapters (`-` when absent).
    pub fn base_key(&self) -> &str {
        self.base.as_deref().unwrap_or(ABSENT_SEGMENT)
    }
}

fn normalize_segment(segment: String) -> Option<String> {
    if segment.is_empty() || segment == ABSENT_SEGMENT {
        None
    } else {
        Some(segment)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zone_key(), self.base_key(), self.name)
    }
}

impl FromStr for Collection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        let (zone, base, name) = match parts.as_slice() {
            [name] => (None, None, *name),
            [base, name] => (None, Some(*base), *name),
            [zone, base, name] => (Some(*zone), Some(*base), *name),
            _ => {
                return Err(ValidationError::InvalidDirective {
                    directive: "collection".to_string(),
                    message: format!("expected at most three segments in '{}'", s),
                });
            }
        };

        if name.is_empty() || name == ABSENT_SEGMENT {
            return Err(ValidationError::EmptyCollectionName);
        }

        Ok(Collection::qualified(zone, base, name))
    }
}

impl From<&str> for Collection {
    fn from(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| Collection::new(name))
    }
}
