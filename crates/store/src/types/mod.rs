//! Core types for the store layer.
//!
//! This module provides the fundamental types used throughout the crate:
//!
//! - [`Collection`] - The `(zone, base, name)` partition a record lives in
//! - [`Record`] - A persisted record handed back by every read and write
//! - [`Entity`], [`Internal`] - Save input, with unset markers and private state
//! - [`Query`], [`Filter`], [`Comparison`] - The query AST and its JSON parser
//! - [`SaveOptions`], [`RemoveOptions`], [`NativeQuery`] - Operation options
//!
//! # Examples
//!
//! ## Building an Entity
//!
//! ```
//! use entstore::types::{Collection, Entity, SaveOptions};
//! use serde_json::json;
//!
//! let (entity, options) = Entity::from_json(
//!     Collection::new("user"),
//!     json!({"email": "a@example.com", "upsert$": ["email"]}),
//! )
//! .unwrap();
//!
//! assert_eq!(entity.get("email"), Some(&json!("a@example.com")));
//! assert_eq!(options, SaveOptions::upsert(["email"]));
//! ```
//!
//! ## Building a Query
//!
//! ```
//! use entstore::types::{Comparison, Filter, Query, SortKey};
//! use serde_json::json;
//!
//! let parsed = Query::parse(&json!({
//!     "price": {"gte$": 200},
//!     "sort$": {"price": -1},
//!     "limit$": 1,
//! }))
//! .unwrap();
//!
//! let built = Query::all()
//!     .and(Filter::field("price", Comparison::Gte(json!(200))))
//!     .with_sort(SortKey::desc("price"))
//!     .with_limit(1);
//!
//! assert_eq!(parsed, built);
//! ```

mod collection;
mod entity;
mod options;
mod query;
mod record;

pub use collection::{ABSENT_SEGMENT, Collection};

pub use entity::{CONTROL_SUFFIX, Entity, Internal};

pub use options::{NativeQuery, RemoveOptions, RemoveOutcome, SaveOptions};

pub use query::{Comparison, Filter, Operator, Query, SortDirection, SortKey};

pub use record::Record;
