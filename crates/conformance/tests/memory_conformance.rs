//! Runs the battery against the in-memory adapter.

use entstore::backends::memory::MemoryStore;
use entstore::core::BackendKind;
use entstore::error::StorageResult;
use entstore_conformance::{SuiteSettings, conformance_test};

fn memory_store() -> StorageResult<MemoryStore> {
    Ok(MemoryStore::new())
}

conformance_test!(
    memory,
    memory_store,
    SuiteSettings::for_backend(BackendKind::Memory)
);
