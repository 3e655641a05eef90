//! In-memory adapter.
//!
//! [`MemoryStore`] keeps every collection as an insertion-ordered list behind
//! a single `parking_lot::RwLock`. Saves and removes hold the write lock for
//! the whole match+write, so concurrent identical upserts collapse into one
//! record. Reads take the read lock and clone a snapshot.
//!
//! # Example
//!
//! ```
//! use entstore::backends::memory::MemoryStore;
//! use entstore::core::{BackendCapability, EntityStore};
//!
//! let store = MemoryStore::new();
//! assert_eq!(store.backend_name(), "memory");
//! assert!(store.supports(BackendCapability::AtomicUpsert));
//! assert!(!store.supports(BackendCapability::NativeQuery));
//! ```

mod storage;

pub use storage::MemoryStore;
