//! SQLite adapter.
//!
//! Supports in-memory databases (for tests) and file-based databases. It is
//! the reference adapter for native query passthrough: a [`NativeQuery`]
//! holding SQL runs directly against the `entities` table.
//!
//! # Example
//!
//! ```no_run
//! use entstore::backends::sqlite::SqliteStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // In-memory database with the schema ready to use
//! let store = SqliteStore::in_memory()?;
//!
//! // Or a file-based database
//! let store = SqliteStore::open("./data/entities.db")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE entities (
//!     zone TEXT NOT NULL,   -- '-' when absent
//!     base TEXT NOT NULL,   -- '-' when absent
//!     name TEXT NOT NULL,
//!     id TEXT NOT NULL,
//!     seq INTEGER NOT NULL, -- insertion order
//!     data TEXT NOT NULL,   -- JSON object of data fields
//!     PRIMARY KEY (zone, base, name, id)
//! );
//!
//! CREATE TABLE schema_version (version INTEGER NOT NULL);
//! ```
//!
//! # Native Queries
//!
//! Each result row becomes a record: the `id` column is the identity, a
//! `data` column holding a JSON object contributes its fields, and any other
//! column becomes a field of the same name.
//!
//! [`NativeQuery`]: crate::types::NativeQuery

mod backend;
mod schema;
mod storage;

pub use backend::{SqliteStore, SqliteStoreConfig};
pub use schema::SCHEMA_VERSION;
