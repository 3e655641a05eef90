//! Reference adapter implementations.
//!
//! | Adapter | Feature | Description |
//! |---------|---------|-------------|
//! | Memory | (always) | Process-local, insertion-ordered collections |
//! | SQLite | `sqlite` | In-memory or file database, native SQL passthrough |
//!
//! # Example
//!
//! ```no_run
//! use entstore::backends::memory::MemoryStore;
//! # #[cfg(feature = "sqlite")]
//! use entstore::backends::sqlite::SqliteStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let memory = MemoryStore::new();
//!
//! # #[cfg(feature = "sqlite")]
//! let sqlite = SqliteStore::in_memory()?;
//! # Ok(())
//! # }
//! ```

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;
